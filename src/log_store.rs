use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::DailyLog;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("mood {0} is out of range (expected 1-5)")]
    MoodOutOfRange(u8),
    #[error("flow recorded on {0} but it is not marked as a period day")]
    FlowWithoutPeriod(NaiveDate),
    #[error("empty symptom tag")]
    EmptySymptom,
}

impl DailyLog {
    /// Check the record before it is admitted to the store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(mood) = self.mood {
            if !(1..=5).contains(&mood) {
                return Err(ValidationError::MoodOutOfRange(mood));
            }
        }
        if self.flow.is_some() && !self.is_period_day {
            return Err(ValidationError::FlowWithoutPeriod(self.date));
        }
        if self.symptoms.iter().any(|s| s.trim().is_empty()) {
            return Err(ValidationError::EmptySymptom);
        }
        Ok(())
    }
}

/// Per-user daily logs, unique per date and kept in ascending date order.
///
/// The analytics functions assume exactly this shape, so every write goes
/// through here. Deserialization re-normalizes the sequence (last record for
/// a date wins) so an edited export cannot break the ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<DailyLog>", into = "Vec<DailyLog>")]
pub struct LogStore {
    logs: Vec<DailyLog>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the log for `log.date`.
    pub fn upsert(&mut self, log: DailyLog) -> Result<(), ValidationError> {
        log.validate()?;
        match self.position(log.date) {
            Ok(i) => self.logs[i] = log,
            Err(i) => self.logs.insert(i, log),
        }
        Ok(())
    }

    pub fn remove(&mut self, date: NaiveDate) -> bool {
        match self.position(date) {
            Ok(i) => {
                self.logs.remove(i);
                true
            }
            Err(_) => false,
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyLog> {
        self.position(date).ok().map(|i| &self.logs[i])
    }

    /// Logs dated within `from..=to`.
    pub fn range(&self, from: NaiveDate, to: NaiveDate) -> &[DailyLog] {
        if from > to {
            return &[];
        }
        let start = self.logs.partition_point(|l| l.date < from);
        let end = self.logs.partition_point(|l| l.date <= to);
        &self.logs[start..end]
    }

    /// All logs, oldest first.
    pub fn logs(&self) -> &[DailyLog] {
        &self.logs
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    fn position(&self, date: NaiveDate) -> Result<usize, usize> {
        self.logs.binary_search_by_key(&date, |l| l.date)
    }
}

impl From<Vec<DailyLog>> for LogStore {
    fn from(mut logs: Vec<DailyLog>) -> Self {
        logs.sort_by_key(|l| l.date);
        let mut normalized: Vec<DailyLog> = Vec::with_capacity(logs.len());
        for log in logs {
            match normalized.last_mut() {
                Some(last) if last.date == log.date => *last = log,
                _ => normalized.push(log),
            }
        }
        Self { logs: normalized }
    }
}

impl From<LogStore> for Vec<DailyLog> {
    fn from(store: LogStore) -> Self {
        store.logs
    }
}
