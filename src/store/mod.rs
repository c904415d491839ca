//! Persistence for the dashboard.
//! The basic idea is:
//!  - Every record category has one [record_store::StoreKey].
//!  - Values are JSON strings, one locked file per key.
//!  - Shape defaults are resolved once at this boundary; malformed values
//!    degrade to the category default instead of failing the caller.

pub mod entities;
pub mod record_store;
