//! Reading committers out of a Git working copy.

pub mod log;
pub mod parser;

pub use log::GitLog;
pub use parser::{parse_log, parse_log_lines, LogEntry};
