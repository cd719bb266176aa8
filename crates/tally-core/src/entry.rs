//! Completed time entries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{EntryId, ValidationError, non_empty};

/// A completed, immutable record of time spent on a project.
///
/// Entries are only ever created by stopping the timer (or in tests) and are
/// never edited afterwards, so all fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeEntry {
    id: EntryId,
    project: String,
    duration_secs: u64,
    description: String,
    timestamp: DateTime<Utc>,
}

impl TimeEntry {
    /// Creates an entry with a fresh identifier.
    ///
    /// `timestamp` is the moment the interval ended.
    pub fn new(
        project: &str,
        duration_secs: u64,
        description: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let project = non_empty("project name", project)?;
        if duration_secs == 0 {
            return Err(ValidationError::ZeroDuration);
        }
        Ok(Self {
            id: EntryId::generate(),
            project,
            duration_secs,
            description: description.into(),
            timestamp,
        })
    }

    pub const fn id(&self) -> EntryId {
        self.id
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Tracked time in whole seconds, always at least one.
    pub const fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
