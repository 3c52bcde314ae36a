use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use poimap_core::{BoxBound, LngLat, Location, LocationType, SearchForm, TypeId, TypeOption};

use crate::handle::{MapPopup, UiHandle};

/// `results_count` while a search is in flight.
pub const RESULTS_SEARCHING: i64 = -1;

/// `on_hover_location_id` when no marker is hovered.
pub const NO_HOVER: i64 = -1;

/// Everything the location browser UI renders from.
///
/// Readers get this through [`crate::LocationStore::state`] or a
/// subscription; the mutation methods are crate-private so only store
/// actions can change it.
#[derive(Clone)]
pub struct LocationStoreState {
    pub navbar: Option<UiHandle>,
    pub map_ref: Option<UiHandle>,
    pub direction_visibility: bool,
    /// Locations currently shown, in display order.
    pub results_list: Vec<Location>,
    /// Distinct type ids of the last fetch, in first-seen order.
    pub results_type: Vec<TypeId>,
    /// Length of `results_list`, or [`RESULTS_SEARCHING`].
    pub results_count: i64,
    /// Types the user has chosen to show.
    pub filter_types: BTreeSet<TypeId>,
    pub all_types: Vec<TypeOption>,
    /// Unfiltered result of the last fetch; `results_list` is derived from it.
    pub fetched_locations: Vec<Location>,
    /// Location open in the detail view.
    pub location: Option<Location>,
    pub location_popup: Option<Arc<dyn MapPopup>>,
    pub center_location: Option<LngLat>,
    pub current_location: Option<LngLat>,
    pub box_bound: Option<BoxBound>,
    pub query_params: SearchForm,
    pub search_text: Option<String>,
    pub on_hover_location_id: i64,
}

impl Default for LocationStoreState {
    fn default() -> Self {
        Self {
            navbar: None,
            map_ref: None,
            direction_visibility: false,
            results_list: Vec::new(),
            results_type: Vec::new(),
            results_count: 0,
            filter_types: BTreeSet::new(),
            all_types: Vec::new(),
            fetched_locations: Vec::new(),
            location: None,
            location_popup: None,
            center_location: None,
            current_location: None,
            box_bound: None,
            query_params: SearchForm::new(),
            search_text: None,
            on_hover_location_id: NO_HOVER,
        }
    }
}

impl fmt::Debug for LocationStoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationStoreState")
            .field("navbar", &self.navbar.as_ref().map(|_| "<handle>"))
            .field("map_ref", &self.map_ref.as_ref().map(|_| "<handle>"))
            .field("direction_visibility", &self.direction_visibility)
            .field("results_list", &self.results_list.len())
            .field("results_type", &self.results_type)
            .field("results_count", &self.results_count)
            .field("filter_types", &self.filter_types)
            .field("all_types", &self.all_types)
            .field("fetched_locations", &self.fetched_locations.len())
            .field("location", &self.location.as_ref().map(|l| l.id))
            .field(
                "location_popup",
                &self.location_popup.as_ref().map(|_| "<popup>"),
            )
            .field("center_location", &self.center_location)
            .field("current_location", &self.current_location)
            .field("box_bound", &self.box_bound)
            .field("query_params", &self.query_params)
            .field("search_text", &self.search_text)
            .field("on_hover_location_id", &self.on_hover_location_id)
            .finish()
    }
}

impl LocationStoreState {
    /// Whether a search has been started and not yet resolved.
    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.results_count == RESULTS_SEARCHING
    }

    /// Looks a location up among the last fetched results.
    #[must_use]
    pub fn location_from_results(&self, id: i64) -> Option<&Location> {
        self.fetched_locations.iter().find(|loc| loc.id == id)
    }

    pub(crate) fn set_results_list(&mut self, locations: Vec<Location>) {
        self.results_list = locations;
    }

    pub(crate) fn set_fetched_locations(&mut self, locations: Vec<Location>) {
        self.fetched_locations = locations;
    }

    /// Sets the count to [`RESULTS_SEARCHING`] or to the current list length.
    pub(crate) fn set_results_count(&mut self, searching: bool) {
        self.results_count = if searching {
            RESULTS_SEARCHING
        } else {
            i64::try_from(self.results_list.len()).unwrap_or(i64::MAX)
        };
    }

    pub(crate) fn set_results_type(&mut self, types: Vec<TypeId>) {
        self.results_type = types;
    }

    pub(crate) fn set_filter_types(&mut self, types: BTreeSet<TypeId>) {
        self.filter_types = types;
    }

    pub(crate) fn set_all_types(&mut self, options: Vec<TypeOption>) {
        self.all_types = options;
    }

    pub(crate) fn set_location(&mut self, location: Option<Location>) {
        self.location = location;
    }

    /// Swaps the held popup, returning the previous one.
    pub(crate) fn replace_popup(
        &mut self,
        popup: Option<Arc<dyn MapPopup>>,
    ) -> Option<Arc<dyn MapPopup>> {
        std::mem::replace(&mut self.location_popup, popup)
    }

    pub(crate) fn set_center_location(&mut self, coord: Option<LngLat>) {
        self.center_location = coord;
    }

    pub(crate) fn set_current_location(&mut self, coord: Option<LngLat>) {
        self.current_location = coord;
    }

    /// Installs a fresh fetch result: both lists, the count, and the set of
    /// types present.
    pub(crate) fn apply_fetched(&mut self, locations: Vec<Location>) {
        let types = distinct_type_ids(&locations);
        self.set_fetched_locations(locations.clone());
        self.set_results_list(locations);
        self.set_results_count(false);
        self.set_results_type(types);
    }

    /// Shows only fetched locations whose type is in `filter_types`.
    pub(crate) fn filter_results(&mut self) {
        let shown: Vec<Location> = self
            .fetched_locations
            .iter()
            .filter(|loc| loc.type_id().is_ok_and(|id| self.filter_types.contains(&id)))
            .cloned()
            .collect();
        self.set_results_list(shown);
        self.set_results_count(false);
    }

    pub(crate) fn resume_results(&mut self) {
        self.set_results_list(self.fetched_locations.clone());
        self.set_results_count(false);
    }

    pub(crate) fn flush_results(&mut self) {
        self.set_results_list(Vec::new());
        self.set_results_count(false);
        self.set_fetched_locations(Vec::new());
    }
}

/// Distinct type ids of `locations`, in first-seen order.
///
/// Locations whose type cannot be derived are skipped with a warning.
pub(crate) fn distinct_type_ids(locations: &[Location]) -> Vec<TypeId> {
    let mut seen = BTreeSet::new();
    let mut ordered = Vec::new();
    for loc in locations {
        match loc.type_id() {
            Ok(id) => {
                if seen.insert(id) {
                    ordered.push(id);
                }
            }
            Err(e) => {
                tracing::warn!(
                    location_id = loc.id,
                    error = %e,
                    "location has no usable type id"
                );
            }
        }
    }
    ordered
}

/// Filter options for the catalog entries whose id is in `keep`, or for every
/// entry when `keep` is `None`.
pub(crate) fn type_options(
    catalog: &[LocationType],
    keep: Option<&BTreeSet<TypeId>>,
) -> Vec<TypeOption> {
    catalog
        .iter()
        .filter(|t| keep.is_none_or(|ids| ids.contains(&t.id)))
        .map(TypeOption::from)
        .collect()
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
