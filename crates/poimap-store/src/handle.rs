use std::any::Any;
use std::sync::Arc;

/// Opaque reference to a UI collaborator (navbar, map instance).
///
/// The store only holds these so components can find each other; it never
/// looks inside them.
pub type UiHandle = Arc<dyn Any + Send + Sync>;

/// A popup attached to the map.
pub trait MapPopup: Send + Sync {
    /// Detaches the popup from the map.
    fn remove(&self);
}
