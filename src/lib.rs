//! Terminal productivity dashboard. Recurring weekday tasks, highlights,
//! schedule entries, weekly plans and reviews all live as JSON records on
//! disk, and every view (calendar, timeline, statistics, streaks) is computed
//! from them on demand.

pub mod cli;
pub mod engine;
pub mod store;
pub mod utils;
