//! Client-side state for the map location browser.
//!
//! [`LocationStore`] owns a [`LocationStoreState`] and is the only way to
//! change it. Network-backed actions fetch from the backend through
//! [`poimap_api::LocationApiClient`]; every action lands as a single
//! notification to subscribers.

mod generation;
mod handle;
mod state;
mod store;

pub use handle::{MapPopup, UiHandle};
pub use state::{LocationStoreState, NO_HOVER, RESULTS_SEARCHING};
pub use store::{LocationStore, Outcome};
