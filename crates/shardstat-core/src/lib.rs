pub mod config;
pub mod error;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod report;
pub mod reporter;
pub mod runbook;
pub mod setup;
pub mod store;
