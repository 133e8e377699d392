use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use qubes_log::context::LoggingContext;
use qubes_log::format::Profile;
use qubes_log::notify::{Notification, NotificationBridge, NotificationEndpoint, NotifyError};
use qubes_log::record::LogRecord;
use qubes_log::severity::Severity;
use qubes_log::sink::{LogSink, SinkError, WriterSink};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// In-memory text destination shared between the sink and the test.
#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Buffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Buffer {
    type Writer = Buffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[derive(Clone, Default)]
struct RecordingEndpoint(Arc<Mutex<Vec<Notification>>>);

impl RecordingEndpoint {
    fn calls(&self) -> Vec<Notification> {
        self.0.lock().unwrap().clone()
    }
}

impl NotificationEndpoint for RecordingEndpoint {
    fn notify(&mut self, notification: &Notification) -> Result<(), NotifyError> {
        self.0.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

struct UnreachableEndpoint;

impl NotificationEndpoint for UnreachableEndpoint {
    fn notify(&mut self, _notification: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected("The name org.freedesktop.Notifications was not provided".into()))
    }
}

/// Keeps full records so tests can look at fields and span names.
#[derive(Clone, Default)]
struct Records(Arc<Mutex<Vec<LogRecord>>>);

impl LogSink for Records {
    fn emit(&mut self, record: &LogRecord) -> Result<(), SinkError> {
        self.0.lock().unwrap().push(record.clone());
        Ok(())
    }
}

fn with_context<F: FnOnce()>(context: &LoggingContext, f: F) {
    tracing::subscriber::with_default(Registry::default().with(context.clone()), f);
}

#[test]
fn console_output_is_component_and_message() {
    let buffer = Buffer::default();
    let context = LoggingContext::new();
    context.add_sink(WriterSink::new(buffer.clone(), Profile::Console));
    context.set_threshold(Severity::Info);

    with_context(&context, || {
        tracing::info!(target: "X", "Y");
    });

    assert_eq!(buffer.contents(), "X: Y\n");
}

#[test]
fn debug_records_are_dropped_under_basic_logging() {
    let buffer = Buffer::default();
    let endpoint = RecordingEndpoint::default();
    let context = LoggingContext::new();
    context.enable();
    context.add_sink(WriterSink::new(buffer.clone(), Profile::Console));
    context.add_sink(NotificationBridge::new(endpoint.clone()).with_min_severity(Severity::NotSet));

    with_context(&context, || {
        tracing::debug!(target: "vm1", "polling qrexec");
    });

    assert_eq!(context.threshold(), Severity::Info);
    assert_eq!(buffer.contents(), "");
    assert!(endpoint.calls().is_empty());
}

#[test]
fn enable_debug_adds_location_to_every_text_sink() {
    let first = Buffer::default();
    let second = Buffer::default();
    let context = LoggingContext::new();
    context.add_sink(WriterSink::new(first.clone(), Profile::Console));
    context.add_sink(WriterSink::new(second.clone(), Profile::Persistent));
    context.enable_debug();

    let mut line = 0;
    with_context(&context, || {
        let span = tracing::info_span!("start_domain");
        let _entered = span.enter();
        line = line!() + 1;
        tracing::debug!(target: "X", "Y");
    });

    for output in [first.contents(), second.contents()] {
        assert!(output.contains("X: Y"), "{output}");
        assert!(output.contains(&format!("pipeline.start_domain:{line}]")), "{output}");
    }
}

#[test]
fn error_event_becomes_one_notification() {
    let endpoint = RecordingEndpoint::default();
    let context = LoggingContext::new();
    context.add_sink(NotificationBridge::new(endpoint.clone()));
    context.set_threshold(Severity::Info);

    with_context(&context, || {
        tracing::info!(target: "vm1", "started");
        tracing::error!(target: "vm1", "disk full");
    });

    let calls = endpoint.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].icon, "dialog-error");
    assert_eq!(calls[0].summary, "disk full");
    assert_eq!(calls[0].app_name, "Qubes");
    assert_eq!(calls[0].replaces_id, 0);
    assert_eq!(calls[0].body, "");
    assert_eq!(calls[0].timeout, 0);
}

#[test]
fn warning_event_uses_warning_icon() {
    let endpoint = RecordingEndpoint::default();
    let context = LoggingContext::new();
    context.add_sink(NotificationBridge::new(endpoint.clone()));

    with_context(&context, || {
        tracing::warn!(target: "vm1", free_mb = 12, "low memory: {} MiB free", 12);
    });

    let calls = endpoint.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].icon, "dialog-warning");
    assert_eq!(calls[0].summary, "low memory: 12 MiB free");
}

#[test]
fn trace_events_reach_bridge_with_information_icon() {
    let endpoint = RecordingEndpoint::default();
    let context = LoggingContext::new();
    context.set_threshold(Severity::NotSet);
    context.add_sink(NotificationBridge::new(endpoint.clone()).with_min_severity(Severity::NotSet));

    with_context(&context, || {
        tracing::trace!(target: "vm1", "state dump");
    });

    let calls = endpoint.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].icon, "dialog-information");
}

#[test]
fn broken_notification_service_leaves_other_sinks_alone() {
    let buffer = Buffer::default();
    let context = LoggingContext::new();
    context.add_sink(NotificationBridge::new(UnreachableEndpoint));
    context.add_sink(WriterSink::new(buffer.clone(), Profile::Console));

    with_context(&context, || {
        tracing::error!(target: "vm1", "disk full");
        tracing::error!(target: "vm2", "disk full too");
    });

    assert_eq!(buffer.contents(), "vm1: disk full\nvm2: disk full too\n");
}

#[test]
fn records_carry_fields_span_and_location() {
    let records = Records::default();
    let context = LoggingContext::new();
    context.add_sink(records.clone());

    let mut line = 0;
    with_context(&context, || {
        let span = tracing::warn_span!("shutdown");
        let _entered = span.enter();
        line = line!() + 1;
        tracing::warn!(target: "vm1", attempt = 3u64, forced = true, "shutdown timed out");
    });

    let records = records.0.lock().unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.severity, Severity::Warning);
    assert_eq!(record.component, "vm1");
    assert_eq!(record.message, "shutdown timed out");
    assert_eq!(record.function.as_deref(), Some("shutdown"));
    assert_eq!(record.line, Some(line));
    assert_eq!(record.module(), Some("pipeline"));
    assert_eq!(record.fields["attempt"], 3);
    assert_eq!(record.fields["forced"], true);
}

#[test]
fn events_from_many_threads_stay_whole_lines() {
    let buffer = Buffer::default();
    let context = LoggingContext::new();
    context.add_sink(WriterSink::new(buffer.clone(), Profile::Console));

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let context = context.clone();
            std::thread::spawn(move || {
                with_context(&context, || {
                    for _ in 0..25 {
                        tracing::error!(target: "worker", "thread {}", n);
                    }
                });
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let output = buffer.contents();
    assert_eq!(output.lines().count(), 100);
    assert!(output.lines().all(|l| l.starts_with("worker: thread ")));
}
