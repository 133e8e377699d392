use crate::record::LogRecord;
use crate::sink::{LogSink, SinkError};

/// A sink that simply drops all records.
///
/// Handy for keeping [`LoggingContext::enable`](crate::context::LoggingContext::enable)
/// from installing the stderr console sink, and for tests that only care
/// about other sinks.
#[derive(Clone, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn emit(&mut self, _record: &LogRecord) -> Result<(), SinkError> {
        Ok(())
    }
}
