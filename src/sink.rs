use crate::format::{render, Profile};
use crate::record::LogRecord;
use crate::severity::Severity;
use std::error::Error;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::MakeWriter;

pub type SinkError = Box<dyn Error + Send + Sync>;

/// Destination for [`LogRecord`]s registered on a
/// [`LoggingContext`](crate::context::LoggingContext).
///
/// The context calls `emit` synchronously on the thread that produced the
/// event while holding this sink's lock, so implementations never see
/// concurrent calls.
pub trait LogSink: Send {
    /// Deliver a single record.
    ///
    /// **Returns**
    /// - `Ok(())` if the record was written or deliberately dropped.
    /// - `Err(..)` if the destination failed. The context reports the
    ///   error on stderr and carries on with the remaining sinks.
    fn emit(&mut self, record: &LogRecord) -> Result<(), SinkError>;

    /// Switch the line format. Sinks that do not render text ignore it.
    fn set_profile(&mut self, _profile: Profile) {}

    /// Current line format, if this sink renders text.
    fn profile(&self) -> Option<Profile> {
        None
    }

    /// Records below this severity are not offered to the sink. Read once,
    /// when the sink is registered.
    fn min_severity(&self) -> Severity {
        Severity::NotSet
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Text sink writing one rendered line per record.
pub struct WriterSink<M> {
    make_writer: M,
    profile: Profile,
}

impl<M> WriterSink<M>
where
    M: for<'a> MakeWriter<'a> + Send + 'static,
{
    pub fn new(make_writer: M, profile: Profile) -> Self {
        WriterSink { make_writer, profile }
    }
}

impl WriterSink<fn() -> io::Stderr> {
    /// Console sink on stderr.
    pub fn stderr() -> Self {
        WriterSink::new(io::stderr as fn() -> io::Stderr, Profile::Console)
    }
}

impl WriterSink<Mutex<File>> {
    /// Persistent-profile sink appending to `path`, created if missing.
    pub fn file(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(WriterSink::new(Mutex::new(file), Profile::Persistent))
    }
}

impl<M> LogSink for WriterSink<M>
where
    M: for<'a> MakeWriter<'a> + Send + 'static,
{
    fn emit(&mut self, record: &LogRecord) -> Result<(), SinkError> {
        let mut line = render(record, self.profile);
        line.push('\n');
        // One write per record keeps lines whole on shared descriptors.
        self.make_writer.make_writer().write_all(line.as_bytes())?;
        Ok(())
    }

    fn set_profile(&mut self, profile: Profile) {
        self.profile = profile;
    }

    fn profile(&self) -> Option<Profile> {
        Some(self.profile)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.make_writer.make_writer().flush()?;
        Ok(())
    }
}
