//! History handoff: where completed sessions go.
//!
//! The controller builds one [`SessionRecord`] per completed session and
//! passes it, by value, to a [`HistorySink`]. Querying and rendering
//! history is somebody else's job.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tagkey_protocol::SessionRecord;

use crate::HistoryError;

/// Receives completed-session records.
///
/// Called exactly once per session, from the controller's task.
pub trait HistorySink: Send + 'static {
    /// Stores one record.
    ///
    /// # Errors
    /// Whatever the backing store reports. The controller logs the error;
    /// the session has already ended either way.
    fn record(&mut self, record: SessionRecord) -> Result<(), HistoryError>;
}

/// Keeps records in memory. Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    records: Arc<Mutex<Vec<SessionRecord>>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of all records, oldest first.
    pub fn records(&self) -> Vec<SessionRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SessionRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HistorySink for MemoryHistory {
    fn record(&mut self, record: SessionRecord) -> Result<(), HistoryError> {
        self.lock().push(record);
        Ok(())
    }
}

/// Appends each record as one line of JSON.
#[derive(Debug)]
pub struct JsonLinesHistory<W> {
    writer: W,
}

impl<W: Write + Send + 'static> JsonLinesHistory<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send + 'static> HistorySink for JsonLinesHistory<W> {
    fn record(&mut self, record: SessionRecord) -> Result<(), HistoryError> {
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tagkey_protocol::ProfileId;

    use super::*;

    fn record(name: &str) -> SessionRecord {
        let now = Utc::now();
        SessionRecord {
            started_at: now,
            ended_at: now,
            profile_id: ProfileId::new("p"),
            profile_name: name.into(),
            blocked_app_ids: vec!["app".into()],
            elapsed_seconds: 3,
        }
    }

    #[test]
    fn test_memory_history_clones_share_records() {
        let history = MemoryHistory::new();
        let mut sink = history.clone();
        sink.record(record("one")).unwrap();
        sink.record(record("two")).unwrap();

        let names: Vec<_> = history.records().into_iter().map(|r| r.profile_name).collect();
        assert_eq!(names, vec!["one", "two"]);
    }

    #[test]
    fn test_json_lines_history_writes_one_line_per_record() {
        let mut sink = JsonLinesHistory::new(Vec::new());
        sink.record(record("one")).unwrap();
        sink.record(record("two")).unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: SessionRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.profile_name, "two");
        assert_eq!(parsed.elapsed_seconds, 3);
    }
}
