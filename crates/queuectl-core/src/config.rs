//! Typed access to the runtime tunables table.
//!
//! The registry itself is just rows in the `config` table (via [`Store`]);
//! this module is the typed layer on top that every other component reads
//! through, plus the recognized keys and their defaults.

use crate::error::CoreError;
use crate::store::Store;

/// Recognized config keys, normalized (`-` replaced with `_`) form.
pub mod keys {
    pub const MAX_RETRIES: &str = "max_retries";
    pub const BACKOFF_BASE: &str = "backoff_base";
    pub const CMD_TIMEOUT: &str = "cmd_timeout";
    pub const STUCK_AFTER: &str = "stuck_after";
}

pub const DEFAULT_MAX_RETRIES: i64 = 3;
pub const DEFAULT_BACKOFF_BASE: i64 = 2;
pub const DEFAULT_CMD_TIMEOUT_SECS: i64 = 60;
pub const DEFAULT_STUCK_AFTER_SECS: i64 = 120;

/// Normalize an operator-supplied key: `-` becomes `_` before lookup, per
/// spec. Storage always uses the underscore form.
pub fn normalize_key(key: &str) -> String {
    key.replace('-', "_")
}

/// Read a config value as `i64`, falling back to `default` when the key is
/// absent or fails to parse.
pub async fn get_i64(store: &dyn Store, key: &str, default: i64) -> Result<i64, CoreError> {
    Ok(store
        .get_config(key)
        .await?
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default))
}
