use crate::severity::Severity;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// A single log event, owned and immutable once built.
///
/// The layer produces one of these per `tracing` event that passes the
/// context threshold and hands the same record to every sink.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    /// Originating component; the `tracing` target.
    pub component: String,
    /// Raw message text, empty when the event carries none.
    pub message: String,
    pub module_path: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    /// Name of the innermost span the event was emitted in.
    pub function: Option<String>,
    pub process_name: Option<String>,
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogRecord {
    /// Build a record stamped with the current local time and process name.
    pub fn new(severity: Severity, component: impl Into<String>, message: impl Into<String>) -> Self {
        LogRecord {
            timestamp: Local::now(),
            severity,
            component: component.into(),
            message: message.into(),
            module_path: None,
            file: None,
            line: None,
            function: None,
            process_name: process_name().map(str::to_string),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_location(mut self, module_path: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        self.module_path = Some(module_path.into());
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn with_process_name(mut self, process_name: impl Into<String>) -> Self {
        self.process_name = Some(process_name.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Short module name: last segment of the module path, or the source
    /// file stem when no module path was recorded.
    pub fn module(&self) -> Option<&str> {
        if let Some(path) = &self.module_path {
            return path.rsplit("::").next();
        }
        self.file
            .as_deref()
            .and_then(|file| Path::new(file).file_stem())
            .and_then(|stem| stem.to_str())
    }
}

/// Stem of the running executable, resolved once per process.
pub fn process_name() -> Option<&'static str> {
    static NAME: OnceLock<Option<String>> = OnceLock::new();
    NAME.get_or_init(|| {
        std::env::args_os().next().and_then(|arg0| {
            Path::new(&arg0)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
    })
    .as_deref()
}
