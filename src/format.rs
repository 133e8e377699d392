use crate::record::LogRecord;
use chrono::{DateTime, Local};

/// Named line format a text sink renders records with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// `<component>: <message>`
    Console,
    /// `<timestamp> <message>`
    Persistent,
    /// `<timestamp> [<process> <module>.<function>:<line>] <component>: <message>`
    Debug,
}

/// Render `record` as a single line (without trailing newline).
///
/// Optional record fields that are missing render as empty strings, so
/// this never fails.
pub fn render(record: &LogRecord, profile: Profile) -> String {
    match profile {
        Profile::Console => format!("{}: {}", record.component, record.message),
        Profile::Persistent => format!("{} {}", timestamp(&record.timestamp), record.message),
        Profile::Debug => format!(
            "{} [{} {}.{}:{}] {}: {}",
            timestamp(&record.timestamp),
            record.process_name.as_deref().unwrap_or(""),
            record.module().unwrap_or(""),
            record.function.as_deref().unwrap_or(""),
            record.line.map(|l| l.to_string()).unwrap_or_default(),
            record.component,
            record.message,
        ),
    }
}

/// `2024-03-01 12:00:00,042`
fn timestamp(ts: &DateTime<Local>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S,%3f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Severity;
    use chrono::TimeZone;

    fn record() -> LogRecord {
        let ts = Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
            + chrono::Duration::milliseconds(42);
        LogRecord::new(Severity::Info, "X", "Y").with_timestamp(ts)
    }

    #[test]
    fn console_is_component_and_message_only() {
        assert_eq!(render(&record(), Profile::Console), "X: Y");
    }

    #[test]
    fn persistent_prefixes_timestamp() {
        assert_eq!(render(&record(), Profile::Persistent), "2024-03-01 12:00:00,042 Y");
    }

    #[test]
    fn debug_includes_location() {
        let record = record()
            .with_process_name("qubesd")
            .with_location("qubes::vm::qubesvm", "src/vm/qubesvm.rs", 118)
            .with_function("start");
        assert_eq!(
            render(&record, Profile::Debug),
            "2024-03-01 12:00:00,042 [qubesd qubesvm.start:118] X: Y"
        );
    }

    #[test]
    fn debug_renders_missing_fields_empty() {
        let mut record = record();
        record.process_name = None;
        assert_eq!(render(&record, Profile::Debug), "2024-03-01 12:00:00,042 [ .:] X: Y");
    }
}
