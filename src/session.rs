//! # Sessions
//!
//! A session is one performance plus everything needed to edit it, read from a
//! single YAML document:
//!
//! ```yaml
//! notes:
//!   - { onset: 0.0, duration: 0.5, pitch: 60, velocity: 80, id: n0 }
//!   - { onset: 1.0, duration: 0.5, pitch: 62, velocity: 80, id: n1 }
//! config:                  # optional, see TrackerConfig
//!   lookup-window: 0.05
//! annotation:              # optional, carried to target time
//!   - { time: 1.0, label: beat }
//! edits:
//!   - source-time: 0.5
//!     op: pitch_insert
//!     pitch: 61
//!     duration: 0.2
//!     velocity: 70
//!     category: mistouch
//! ```
//!
//! [`Session::run`] sorts the edits, applies them one by one and hands back the
//! tracker. A failing edit is logged and skipped; the rest of the batch still
//! runs.

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

use crate::config::{RawConfig, TrackerConfig};
use crate::error::MistakeError;
use crate::note::Note;
use crate::request::{sort_requests, EditRequest};
use crate::tracker::{EditOutcome, EditTracker, TimedLabel};

/// Raw session for YAML deserialization
#[derive(Deserialize, Debug)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawSession {
    pub notes: Vec<Note>,
    #[serde(default)]
    pub config: Option<RawConfig>,
    #[serde(default)]
    pub annotation: Vec<TimedLabel>,
    #[serde(default)]
    pub edits: Vec<EditRequest>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub notes: Vec<Note>,
    pub config: TrackerConfig,
    pub annotation: Vec<TimedLabel>,
    pub edits: Vec<EditRequest>,
}

/// What happened to a session's edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub applied: usize,
    pub missed: usize,
    pub skipped: usize,
}

impl TryFrom<RawSession> for Session {
    type Error = MistakeError;

    fn try_from(raw: RawSession) -> Result<Self, Self::Error> {
        if raw.notes.is_empty() {
            return Err(MistakeError::EmptySource);
        }
        let config = match raw.config {
            Some(config) => TrackerConfig::try_from(config)?,
            None => TrackerConfig::default(),
        };
        Ok(Session {
            notes: raw.notes,
            config,
            annotation: raw.annotation,
            edits: raw.edits,
        })
    }
}

impl Session {
    pub fn from_yaml(content: &str) -> Result<Self, MistakeError> {
        let raw: RawSession =
            serde_yaml::from_str(content).map_err(|e| MistakeError::ConfigError(e.to_string()))?;
        Session::try_from(raw)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MistakeError> {
        let content = fs::read_to_string(path)?;
        Session::from_yaml(&content)
    }

    /// Build the tracker and apply every edit in `(source_time, precedence)` order.
    pub fn run(self) -> Result<(EditTracker, SessionSummary), MistakeError> {
        let mut tracker =
            EditTracker::with_config(self.notes, self.config)?.with_annotation(self.annotation);
        let mut edits = self.edits;
        sort_requests(&mut edits);

        let mut summary = SessionSummary::default();
        for edit in &edits {
            match tracker.apply(edit) {
                Ok(EditOutcome::Applied) => summary.applied += 1,
                Ok(EditOutcome::LookupMiss) => summary.missed += 1,
                Err(e) => {
                    warn!("skipping {} at {:.3}s: {}", edit.kind.name(), edit.source_time, e);
                    summary.skipped += 1;
                }
            }
        }
        info!(
            "{} edits applied, {} missed, {} skipped",
            summary.applied, summary.missed, summary.skipped
        );
        Ok((tracker, summary))
    }
}
