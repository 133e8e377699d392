use crate::context::LoggingContext;
use crate::env::{
    parse_flag, QUBES_LOG_DEBUG_ENV, QUBES_LOG_FILE_ENV, QUBES_LOG_NOTIFY_ENV, QUBES_LOG_NOTIFY_LEVEL_ENV,
};
use crate::severity::Severity;
use crate::sink::WriterSink;
use std::io;
use std::path::PathBuf;

/// Startup logging configuration.
///
/// **Fields**
/// - `debug`: lower the threshold to `Debug` and use the debug line
///   format on every sink.
/// - `log_file`: additionally append persistent-format lines to this file.
/// - `desktop_notifications`: forward warnings and errors as desktop
///   popups (needs the `desktop` feature).
/// - `notification_threshold`: lowest severity turned into a popup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub debug: bool,
    pub log_file: Option<PathBuf>,
    pub desktop_notifications: bool,
    pub notification_threshold: Severity,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug: false,
            log_file: None,
            desktop_notifications: true,
            notification_threshold: Severity::Warning,
        }
    }
}

impl LoggingConfig {
    /// Configuration from the `QUBES_LOG_*` variables in [`crate::env`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an injected variable lookup.
    /// Values that do not parse keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(debug) = lookup(QUBES_LOG_DEBUG_ENV).as_deref().and_then(parse_flag) {
            config.debug = debug;
        }
        if let Some(path) = lookup(QUBES_LOG_FILE_ENV).filter(|p| !p.is_empty()) {
            config.log_file = Some(PathBuf::from(path));
        }
        if let Some(notify) = lookup(QUBES_LOG_NOTIFY_ENV).as_deref().and_then(parse_flag) {
            config.desktop_notifications = notify;
        }
        if let Some(level) = lookup(QUBES_LOG_NOTIFY_LEVEL_ENV).and_then(|l| l.parse::<Severity>().ok()) {
            config.notification_threshold = level;
        }
        config
    }
}

/// Error returned by [`init_logging_with_config`].
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("cannot open log file: {0}")]
    LogFile(#[from] io::Error),

    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Build a [`LoggingContext`] from `config` without installing it.
///
/// Sinks are added in order: stderr console, log file, notification
/// bridge. Debug mode is applied last so it reaches every sink. A bridge
/// that cannot reach the notification service is skipped and its error
/// returned alongside the context.
pub fn build_context(config: &LoggingConfig) -> Result<(LoggingContext, Option<String>), InitError> {
    let context = LoggingContext::new();
    context.enable();

    if let Some(path) = &config.log_file {
        context.add_sink(WriterSink::file(path)?);
    }

    let mut unavailable = None;
    if config.desktop_notifications {
        #[cfg(feature = "desktop")]
        {
            match crate::notify::NotificationBridge::connect() {
                Ok(bridge) => context.add_sink(bridge.with_min_severity(config.notification_threshold)),
                Err(e) => unavailable = Some(e.to_string()),
            }
        }
        #[cfg(not(feature = "desktop"))]
        {
            unavailable = Some("built without the desktop feature".to_string());
        }
    }

    if config.debug {
        context.enable_debug();
    }

    Ok((context, unavailable))
}

/// Build a context from `config` and install it as the global `tracing`
/// subscriber.
///
/// **Effects**
///
/// After this returns, every `tracing` event in the process at or above
/// the context threshold reaches the configured sinks. A missing
/// notification service is reported with a warning once logging is up
/// and otherwise ignored.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<LoggingContext, InitError> {
    let (context, unavailable) = build_context(config)?;
    context.install()?;

    if let Some(reason) = unavailable {
        tracing::warn!(target: "qubes_log", %reason, "desktop notifications disabled");
    }
    Ok(context)
}

/// Initialize logging from the environment; see [`LoggingConfig::from_env`].
pub fn init_logging() -> Result<LoggingContext, InitError> {
    init_logging_with_config(&LoggingConfig::from_env())
}
