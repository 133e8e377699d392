//! Logging setup for Qubes tools on top of `tracing`.
//!
//! A [`LoggingContext`](context::LoggingContext) owns the installed sinks
//! and the global threshold and acts as a `tracing_subscriber` layer.
//! Text sinks render records with one of three [`Profile`](format::Profile)s;
//! the [`NotificationBridge`](notify::NotificationBridge) forwards warnings
//! and errors as desktop popups.

pub mod severity;
pub mod record;
pub mod format;
pub mod sink;
pub mod noop_sink;
pub mod notify;
pub mod context;
pub mod layer;

pub mod env;
pub mod init;
