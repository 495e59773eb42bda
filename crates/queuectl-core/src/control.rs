//! The global control-flag key space. Currently a single recognized key.

/// Set to `"1"` to ask every worker to exit at its next loop boundary.
/// Absent or any other value means "no stop".
pub const STOP_WORKERS: &str = "stop_workers";

/// The value that means "stop".
pub const STOP_VALUE: &str = "1";
