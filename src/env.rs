//! Environment variable names read by
//! [`LoggingConfig::from_env`](crate::init::LoggingConfig::from_env).
//!
//! These are purely helpers; the context and sinks never read the
//! environment themselves.

/// Truthy value (`1`, `true`, `yes`, `on`) enables debug logging.
pub const QUBES_LOG_DEBUG_ENV: &str = "QUBES_LOG_DEBUG";

/// Path of a file that additionally receives persistent-format lines.
pub const QUBES_LOG_FILE_ENV: &str = "QUBES_LOG_FILE";

/// Falsy value (`0`, `false`, `no`, `off`) disables desktop notifications.
pub const QUBES_LOG_NOTIFY_ENV: &str = "QUBES_LOG_NOTIFY";

/// Minimum severity forwarded as notifications, e.g. `error`.
pub const QUBES_LOG_NOTIFY_LEVEL_ENV: &str = "QUBES_LOG_NOTIFY_LEVEL";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Interpret a switch value. `None` for anything unrecognised.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
