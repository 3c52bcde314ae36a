//! Actions on the location browser state.
//!
//! Each public method on [`LocationStore`] is one action: it may perform a
//! single backend request and then applies its mutations to the state in one
//! step, so subscribers never observe a half-applied action.
//!
//! Network actions never retry. A failed request is logged, returned to the
//! caller and leaves the state as it was. Responses that lose a race against
//! a newer request of the same kind are dropped and reported as
//! [`Outcome::Stale`].

use std::collections::BTreeSet;
use std::sync::Arc;

use poimap_api::{ApiError, LocationApiClient, LocationQuery};
use poimap_core::{BoxBound, LngLat, Location, SearchForm, TypeId};
use tokio::sync::watch;

use crate::generation::RequestGeneration;
use crate::handle::{MapPopup, UiHandle};
use crate::state::{type_options, LocationStoreState};

/// What happened to a completed network action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The response was written to the state, at least for the fields no
    /// newer request had claimed.
    Applied,
    /// Newer requests had claimed every field the response would write; it
    /// was discarded.
    Stale,
}

/// Owner of the location browser state.
///
/// Construct one per session and share it (for example behind an [`Arc`])
/// with every component that needs it.
#[derive(Debug)]
pub struct LocationStore {
    api: LocationApiClient,
    state: watch::Sender<LocationStoreState>,
    results_requests: RequestGeneration,
    location_requests: RequestGeneration,
    /// Guards `all_types`, written by both catalog actions.
    option_requests: RequestGeneration,
    /// Guards the show-everything `filter_types` written by `fetch_all_types`.
    default_filter_requests: RequestGeneration,
}

impl LocationStore {
    #[must_use]
    pub fn new(api: LocationApiClient) -> Self {
        let (state, _) = watch::channel(LocationStoreState::default());
        Self {
            api,
            state,
            results_requests: RequestGeneration::default(),
            location_requests: RequestGeneration::default(),
            option_requests: RequestGeneration::default(),
            default_filter_requests: RequestGeneration::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Borrows the current state.
    ///
    /// The borrow blocks writers; do not hold it across an `.await`.
    #[must_use]
    pub fn state(&self) -> watch::Ref<'_, LocationStoreState> {
        self.state.borrow()
    }

    /// Clones the current state.
    #[must_use]
    pub fn snapshot(&self) -> LocationStoreState {
        self.state.borrow().clone()
    }

    /// Receiver that is notified once per applied action.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LocationStoreState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn results_count(&self) -> i64 {
        self.state.borrow().results_count
    }

    #[must_use]
    pub fn results_list(&self) -> Vec<Location> {
        self.state.borrow().results_list.clone()
    }

    /// Finds a location among the last fetched results without a request.
    #[must_use]
    pub fn location_from_results(&self, id: i64) -> Option<Location> {
        self.state.borrow().location_from_results(id).cloned()
    }

    // -----------------------------------------------------------------------
    // UI references and plain fields
    // -----------------------------------------------------------------------

    pub fn set_navbar(&self, navbar: Option<UiHandle>) {
        self.state.send_modify(|s| s.navbar = navbar);
    }

    pub fn set_map_ref(&self, map_ref: Option<UiHandle>) {
        self.state.send_modify(|s| s.map_ref = map_ref);
    }

    pub fn set_direction_visibility(&self, visible: bool) {
        self.state.send_modify(|s| s.direction_visibility = visible);
    }

    pub fn set_results_type(&self, types: Vec<TypeId>) {
        self.state.send_modify(|s| s.set_results_type(types));
    }

    pub fn set_filter_types(&self, types: impl IntoIterator<Item = TypeId>) {
        let types: BTreeSet<TypeId> = types.into_iter().collect();
        self.state.send_modify(|s| s.set_filter_types(types));
    }

    pub fn set_center_location(&self, coord: LngLat) {
        self.state.send_modify(|s| s.set_center_location(Some(coord)));
    }

    /// Records the user's position and recentres the map on it.
    pub fn set_current_location(&self, coord: LngLat) {
        self.state.send_modify(|s| {
            s.set_current_location(Some(coord));
            s.set_center_location(Some(coord));
        });
    }

    pub fn update_box_bound(&self, bound: BoxBound) {
        self.state.send_modify(|s| s.box_bound = Some(bound));
    }

    pub fn set_query_params(&self, form: SearchForm) {
        self.state.send_modify(|s| s.query_params = form);
    }

    pub fn set_search_text(&self, text: Option<String>) {
        tracing::debug!(search_text = ?text, "search text updated");
        self.state.send_modify(|s| s.search_text = text);
    }

    /// Sets the hovered marker id; pass [`crate::NO_HOVER`] to clear it.
    pub fn update_on_hover_location_id(&self, id: i64) {
        self.state.send_modify(|s| s.on_hover_location_id = id);
    }

    /// Marks the result list as loading.
    pub fn set_results_count_to_searching(&self) {
        self.state.send_modify(|s| s.set_results_count(true));
    }

    // -----------------------------------------------------------------------
    // Result list
    // -----------------------------------------------------------------------

    /// Replaces the fetched locations with an externally sourced list.
    ///
    /// Invalidates any result fetch still in flight.
    pub fn set_fetched_locations(&self, locations: Vec<Location>) {
        self.results_requests.begin();
        self.state.send_modify(|s| {
            s.set_fetched_locations(locations.clone());
            s.set_results_list(locations);
            s.set_results_count(false);
        });
    }

    /// Fetches locations matching the stored query params.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of a failed request; the state is unchanged.
    pub async fn search_locations(&self) -> Result<Outcome, ApiError> {
        let form = self.state.borrow().query_params.clone();
        self.fetch_results("search_locations", LocationQuery::Form(form))
            .await
    }

    /// Fetches locations inside `bound`.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of a failed request; the state is unchanged.
    pub async fn get_locations(&self, bound: BoxBound) -> Result<Outcome, ApiError> {
        self.fetch_results("get_locations", LocationQuery::Bound(bound))
            .await
    }

    /// Fetches every location.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of a failed request; the state is unchanged.
    pub async fn get_all_locations(&self) -> Result<Outcome, ApiError> {
        self.fetch_results("get_all_locations", LocationQuery::All)
            .await
    }

    /// Narrows the shown results to `filter_types`.
    pub fn filter_results_list(&self) {
        self.state.send_modify(LocationStoreState::filter_results);
    }

    /// Shows every fetched location again.
    pub fn resume_results_list(&self) {
        self.state.send_modify(LocationStoreState::resume_results);
    }

    /// Empties both result lists and invalidates result fetches in flight.
    pub fn flush_results_list(&self) {
        self.results_requests.begin();
        self.state.send_modify(LocationStoreState::flush_results);
    }

    async fn fetch_results(
        &self,
        op: &'static str,
        query: LocationQuery,
    ) -> Result<Outcome, ApiError> {
        let ticket = self.results_requests.begin();
        let locations = self.api.search_locations(&query).await.inspect_err(|e| {
            tracing::error!(op, error = %e, "location fetch failed, keeping previous results");
        })?;

        let count = locations.len();
        let applied = self.state.send_if_modified(|s| {
            if !self.results_requests.is_current(ticket) {
                return false;
            }
            s.apply_fetched(locations);
            true
        });
        if applied {
            tracing::debug!(op, count, "results updated");
        }
        Ok(Self::outcome(op, applied))
    }

    // -----------------------------------------------------------------------
    // Detail view
    // -----------------------------------------------------------------------

    /// Fetches one location for the detail view.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of a failed request; `location` is unchanged.
    pub async fn get_location(&self, id: i64) -> Result<Outcome, ApiError> {
        let ticket = self.location_requests.begin();
        let location = self.api.fetch_location(id).await.inspect_err(|e| {
            tracing::error!(location_id = id, error = %e, "location detail fetch failed");
        })?;

        let applied = self.state.send_if_modified(|s| {
            if !self.location_requests.is_current(ticket) {
                return false;
            }
            s.set_location(Some(location));
            true
        });
        Ok(Self::outcome("get_location", applied))
    }

    /// Leaves the detail view. A detail fetch still in flight is discarded.
    pub fn flush_location(&self) {
        self.location_requests.begin();
        self.state.send_modify(|s| s.set_location(None));
    }

    // -----------------------------------------------------------------------
    // Type catalog
    // -----------------------------------------------------------------------

    /// Loads the whole type catalog and selects every type for display.
    ///
    /// The `filter_types` default and the `all_types` options are guarded
    /// separately: a later [`LocationStore::set_all_types`] supersedes only the
    /// options, never the default selection.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of a failed request; the state is unchanged.
    pub async fn fetch_all_types(&self) -> Result<Outcome, ApiError> {
        let filter_ticket = self.default_filter_requests.begin();
        let option_ticket = self.option_requests.begin();
        let catalog = self.api.fetch_types().await.inspect_err(|e| {
            tracing::error!(error = %e, "type catalog fetch failed");
        })?;

        let applied = self.state.send_if_modified(|s| {
            let mut modified = false;
            if self.default_filter_requests.is_current(filter_ticket) {
                s.set_filter_types(catalog.iter().map(|t| t.id).collect());
                modified = true;
            }
            if self.option_requests.is_current(option_ticket) {
                s.set_all_types(type_options(&catalog, None));
                modified = true;
            }
            modified
        });
        Ok(Self::outcome("fetch_all_types", applied))
    }

    /// Loads the type catalog and offers only the given types as options.
    ///
    /// `filter_types` is left alone.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of a failed request; the state is unchanged.
    pub async fn set_all_types(
        &self,
        types: impl IntoIterator<Item = TypeId>,
    ) -> Result<Outcome, ApiError> {
        let keep: BTreeSet<TypeId> = types.into_iter().collect();
        let ticket = self.option_requests.begin();
        let catalog = self.api.fetch_types().await.inspect_err(|e| {
            tracing::error!(error = %e, "type catalog fetch failed");
        })?;

        let applied = self.state.send_if_modified(|s| {
            if !self.option_requests.is_current(ticket) {
                return false;
            }
            s.set_all_types(type_options(&catalog, Some(&keep)));
            true
        });
        Ok(Self::outcome("set_all_types", applied))
    }

    // -----------------------------------------------------------------------
    // Popup
    // -----------------------------------------------------------------------

    /// Holds `popup` as the live popup, removing the previous one from the map.
    pub fn add_popup(&self, popup: Arc<dyn MapPopup>) {
        let incoming = Arc::clone(&popup);
        let mut previous = None;
        self.state
            .send_modify(|s| previous = s.replace_popup(Some(popup)));

        // Removed after the state write: a popup's close handler may call
        // back into the store.
        if let Some(old) = previous {
            if !Arc::ptr_eq(&old, &incoming) {
                old.remove();
            }
        }
    }

    /// Removes the live popup from the map, if there is one.
    pub fn del_popup(&self) {
        let mut previous = None;
        self.state.send_if_modified(|s| {
            previous = s.replace_popup(None);
            previous.is_some()
        });
        if let Some(old) = previous {
            old.remove();
        }
    }

    fn outcome(op: &'static str, applied: bool) -> Outcome {
        if applied {
            Outcome::Applied
        } else {
            tracing::debug!(op, "discarding response superseded by a newer request");
            Outcome::Stale
        }
    }
}
