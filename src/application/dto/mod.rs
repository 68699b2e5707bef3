//! Data transfer objects for application layer.

mod load_report;

pub use load_report::{LoadReport, LoadStatus};
