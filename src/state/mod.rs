//! Run history persistence.
//!
//! History is informational only: whether a package is installed is always
//! decided by probing the R library, never by this record.

pub mod history;
pub mod store;

pub use history::{PackageRecord, RunRecord, RunStatus};
pub use store::HistoryStore;
