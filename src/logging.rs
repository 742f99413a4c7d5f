//! ## Logging Configuration
//!
//! This module sets up logging automatically at program startup using the `ctor` crate.
//! Logging behavior is controlled by the `DEBUG_TABULAR_PREP` environment variable:
//!
//! - **Disabled** (default): If the variable is unset, empty, or explicitly set to `"0"` or `"false"`,
//!   no subscriber is installed and the library stays silent (unless the host application installs
//!   its own subscriber).
//! - **Enabled**: Any other value enables logging with a maximum log level of `DEBUG`.
//!
//! ### Usage Example
//!
//! ```sh
//! export DEBUG_TABULAR_PREP=true
//! ```

use ctor::ctor;
use tracing::Level;

/// Name of the environment variable that switches debug logging on.
pub const DEBUG_ENV_VAR: &str = "DEBUG_TABULAR_PREP";

/// Returns true if the given value of [`DEBUG_ENV_VAR`] enables logging.
pub fn logging_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !(v.is_empty() || v == "0" || v.eq_ignore_ascii_case("false")))
}

#[ctor]
fn set_debug_level() {
    let value = std::env::var(DEBUG_ENV_VAR).ok();
    if logging_enabled(value.as_deref()) {
        // `try_init` so a subscriber installed by the host wins.
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::logging_enabled;

    #[test]
    fn test_logging_switch() {
        assert!(!logging_enabled(None));
        assert!(!logging_enabled(Some("")));
        assert!(!logging_enabled(Some("0")));
        assert!(!logging_enabled(Some("false")));
        assert!(!logging_enabled(Some("FALSE")));
        assert!(logging_enabled(Some("1")));
        assert!(logging_enabled(Some("true")));
    }
}
