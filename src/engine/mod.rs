//! The aggregation/statistics engine behind every dashboard view.
//! Record categories are loaded through the injected [RecordStore], merged by
//! calendar date, and reduced to completion metrics, streak counters and
//! month/timeline projections. All computation is synchronous; only the store
//! round-trips are async.

pub mod aggregate;
pub mod calendar;
pub mod commands;
pub mod stats;
pub mod streak;

use crate::{store::record_store::RecordStore, utils::clock::Clock};

/// Ties one record store and one clock together. Every dashboard operation is
/// a method on this, split across the submodules by concern.
pub struct Dashboard<S, C> {
    store: S,
    clock: C,
}

impl<S: RecordStore, C: Clock> Dashboard<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
