use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic request counter for one family of fetches.
///
/// Each request takes a ticket before it is sent; its response may only be
/// applied while that ticket is still the latest one issued.
#[derive(Debug, Default)]
pub(crate) struct RequestGeneration(AtomicU64);

impl RequestGeneration {
    /// Issues a new ticket, invalidating all earlier ones.
    pub(crate) fn begin(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn is_current(&self, ticket: u64) -> bool {
        self.0.load(Ordering::SeqCst) == ticket
    }
}
