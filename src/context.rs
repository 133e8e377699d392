use crate::format::Profile;
use crate::record::LogRecord;
use crate::severity::Severity;
use crate::sink::{LogSink, WriterSink};
use std::cell::Cell;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

thread_local! {
    static DISPATCHING: Cell<bool> = const { Cell::new(false) };
}

/// Process logging state: the installed sinks and the global threshold.
///
/// Owned by startup code and passed around by reference; clones share the
/// same state, so a context installed as a `tracing` layer keeps seeing
/// later `enable`/`enable_debug` calls.
///
/// Each sink has its own lock, so one sink is never entered by two threads
/// at once while a slow sink does not hold up events that it would not
/// receive anyway. Events raised by a sink while it handles a record on
/// the same thread are dropped.
#[derive(Clone)]
pub struct LoggingContext {
    inner: Arc<Inner>,
}

struct Inner {
    threshold: AtomicU8,
    sinks: RwLock<Vec<Slot>>,
}

struct Slot {
    /// Read once at registration.
    min_severity: Severity,
    sink: Mutex<Box<dyn LogSink>>,
}

impl Slot {
    fn lock(&self) -> MutexGuard<'_, Box<dyn LogSink>> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LoggingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingContext {
    /// Empty context. Until [`enable`](Self::enable) runs the threshold is
    /// [`Severity::Warning`] and nothing is installed.
    pub fn new() -> Self {
        LoggingContext {
            inner: Arc::new(Inner {
                threshold: AtomicU8::new(encode(Severity::Warning)),
                sinks: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Install a console sink on stderr at `Info`, unless any sink is
    /// already installed, in which case nothing changes.
    pub fn enable(&self) {
        let mut sinks = self.inner.sinks.write().unwrap_or_else(PoisonError::into_inner);
        if !sinks.is_empty() {
            return;
        }
        sinks.push(slot(WriterSink::stderr()));
        self.set_threshold(Severity::Info);
    }

    /// [`enable`](Self::enable), then lower the threshold to `Debug` and
    /// switch every installed sink to the debug profile.
    pub fn enable_debug(&self) {
        self.enable();
        self.set_threshold(Severity::Debug);
        for slot in self.inner.sinks.read().unwrap_or_else(PoisonError::into_inner).iter() {
            slot.lock().set_profile(Profile::Debug);
        }
    }

    pub fn add_sink<K>(&self, sink: K)
    where
        K: LogSink + 'static,
    {
        self.inner
            .sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(slot(sink));
    }

    pub fn threshold(&self) -> Severity {
        decode(self.inner.threshold.load(Ordering::Relaxed))
    }

    pub fn set_threshold(&self, threshold: Severity) {
        self.inner.threshold.store(encode(threshold), Ordering::Relaxed);
    }

    pub fn sink_count(&self) -> usize {
        self.inner.sinks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Current profile of every installed sink, in installation order.
    pub fn profiles(&self) -> Vec<Option<Profile>> {
        self.inner
            .sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|slot| slot.lock().profile())
            .collect()
    }

    /// Whether the current thread is inside [`dispatch`](Self::dispatch).
    pub(crate) fn dispatching() -> bool {
        DISPATCHING.with(Cell::get)
    }

    /// Offer `record` to every sink whose minimum severity it meets.
    ///
    /// Records below the threshold are dropped. A failing sink is reported
    /// on stderr and does not affect the others.
    pub fn dispatch(&self, record: &LogRecord) {
        if record.severity < self.threshold() || Self::dispatching() {
            return;
        }
        let _guard = DispatchGuard::enter();

        let sinks = self.inner.sinks.read().unwrap_or_else(PoisonError::into_inner);
        for slot in sinks.iter().filter(|slot| record.severity >= slot.min_severity) {
            if let Err(e) = slot.lock().emit(record) {
                eprintln!("log sink failed: {}", e);
            }
        }
    }

    pub fn flush(&self) {
        for slot in self.inner.sinks.read().unwrap_or_else(PoisonError::into_inner).iter() {
            if let Err(e) = slot.lock().flush() {
                eprintln!("log sink flush failed: {}", e);
            }
        }
    }

    /// Install this context as the process-wide `tracing` subscriber.
    ///
    /// **Returns**
    /// - `Err(..)` if another global subscriber was installed first.
    pub fn install(&self) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
        let subscriber = Registry::default().with(self.clone());
        tracing::subscriber::set_global_default(subscriber)
    }
}

fn slot<K: LogSink + 'static>(sink: K) -> Slot {
    Slot {
        min_severity: sink.min_severity(),
        sink: Mutex::new(Box::new(sink)),
    }
}

struct DispatchGuard;

impl DispatchGuard {
    fn enter() -> Self {
        DISPATCHING.with(|flag| flag.set(true));
        DispatchGuard
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DISPATCHING.with(|flag| flag.set(false));
    }
}

fn encode(severity: Severity) -> u8 {
    severity as u8
}

fn decode(raw: u8) -> Severity {
    match raw {
        0 => Severity::NotSet,
        1 => Severity::Debug,
        2 => Severity::Info,
        3 => Severity::Warning,
        _ => Severity::Error,
    }
}
