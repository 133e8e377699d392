use crate::context::LoggingContext;
use crate::record::{process_name, LogRecord};
use crate::severity::Severity;
use chrono::Local;
use std::collections::BTreeMap;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Feeds every `tracing` event at or above the context threshold through
/// [`LoggingContext::dispatch`].
///
/// The threshold is checked before the event is turned into a
/// [`LogRecord`], so dropped events are never formatted. Events raised by
/// a sink while it is handling a record are dropped as well.
impl<S> Layer<S> for LoggingContext
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let severity = Severity::from(*event.metadata().level());
        if severity < self.threshold() || LoggingContext::dispatching() {
            return;
        }

        let function = ctx.event_span(event).map(|span| span.name().to_string());
        let record = record_from_event(event, severity, function);
        self.dispatch(&record);
    }
}

fn record_from_event(event: &Event<'_>, severity: Severity, function: Option<String>) -> LogRecord {
    let mut fields = BTreeMap::new();
    let mut message: Option<String> = None;

    let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message };
    event.record(&mut visitor);

    let meta = event.metadata();
    LogRecord {
        timestamp: Local::now(),
        severity,
        component: meta.target().to_string(),
        message: message.unwrap_or_default(),
        module_path: meta.module_path().map(|s| s.to_string()),
        file: meta.file().map(|s| s.to_string()),
        line: meta.line(),
        function,
        process_name: process_name().map(|s| s.to_string()),
        fields,
    }
}

/// Splits event fields into the `message` and everything else.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // Format-string messages arrive here as `fmt::Arguments`.
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
        }
    }
}
