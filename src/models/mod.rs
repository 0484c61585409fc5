pub mod log_entry;

pub use log_entry::{LogEntry, LogField, LogId, ProjectedLog, Projection};
