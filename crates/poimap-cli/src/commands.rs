//! Command handlers. Each one drives the store the way the map UI would and
//! prints the resulting state.

use anyhow::Context;
use poimap_core::{BoxBound, SearchForm, TypeId};
use poimap_store::{LocationStore, LocationStoreState};

use crate::Commands;

pub(crate) async fn run(store: &LocationStore, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Types => {
            store
                .fetch_all_types()
                .await
                .context("failed to fetch type catalog")?;
            for option in &store.state().all_types {
                println!("{}\t{}", option.value, option.text);
            }
        }
        Commands::All { types } => {
            store.set_results_count_to_searching();
            store
                .get_all_locations()
                .await
                .context("failed to fetch locations")?;
            apply_type_filter(store, types);
            print_results(&store.state());
        }
        Commands::Bounds { ne, sw, types } => {
            let bound = BoxBound { ne, sw };
            store.update_box_bound(bound);
            store.set_results_count_to_searching();
            store
                .get_locations(bound)
                .await
                .context("failed to fetch locations in bound")?;
            apply_type_filter(store, types);
            print_results(&store.state());
        }
        Commands::Search { fields, types } => {
            store.set_query_params(search_form(fields));
            store.set_results_count_to_searching();
            store
                .search_locations()
                .await
                .context("location search failed")?;
            apply_type_filter(store, types);
            print_results(&store.state());
        }
        Commands::Show { id } => {
            store
                .get_location(id)
                .await
                .with_context(|| format!("failed to fetch location {id}"))?;
            let rendered = serde_json::to_string_pretty(&store.state().location)?;
            println!("{rendered}");
        }
    }
    Ok(())
}

pub(crate) fn search_form(fields: Vec<(String, String)>) -> SearchForm {
    fields
        .into_iter()
        .map(|(key, value)| (key, serde_json::Value::String(value)))
        .collect()
}

fn apply_type_filter(store: &LocationStore, types: Vec<TypeId>) {
    if types.is_empty() {
        return;
    }
    store.set_filter_types(types);
    store.filter_results_list();
}

pub(crate) fn render_results(state: &LocationStoreState) -> Vec<String> {
    let mut lines = vec![format!(
        "{} of {} locations, types {:?}",
        state.results_count,
        state.fetched_locations.len(),
        state.results_type
    )];
    for loc in &state.results_list {
        let type_label = loc
            .type_id()
            .map_or_else(|_| "?".to_string(), |id| id.to_string());
        lines.push(format!(
            "  #{:<6} [{type_label}] {}",
            loc.id,
            loc.name.as_deref().unwrap_or("(unnamed)")
        ));
    }
    lines
}

fn print_results(state: &LocationStoreState) {
    for line in render_results(state) {
        println!("{line}");
    }
}
