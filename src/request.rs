//! # Edit Requests
//!
//! Serializable form of a single scheduled edit, as produced by a mistake
//! scheduler and consumed by [`EditTracker::apply`](crate::EditTracker::apply).
//!
//! Requests must reach the tracker sorted by source time, and at equal times by
//! precedence: insertion, deletion, duration change, time offset (drag),
//! rollback. [`sort_requests`] puts a list in that order.
//!
//! ## YAML Form
//! ```yaml
//! - source-time: 1.5
//!   op: pitch_insert
//!   pitch: 64
//!   duration: 0.3
//!   velocity: 80
//!   category: mistouch
//! - source-time: 2.0
//!   op: repeat
//!   events: 2
//! ```

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::category::CoarseCategory;
use crate::note::Note;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EditRequest {
    /// Anchor of the edit on the source timeline. For rollbacks this is the
    /// resume point.
    pub source_time: f64,
    #[serde(flatten)]
    pub kind: EditKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "kebab-case")]
pub enum EditKind {
    PitchInsert {
        pitch: u8,
        duration: f64,
        velocity: u8,
        category: CoarseCategory,
    },
    PitchDelete {
        pitch: u8,
        category: CoarseCategory,
    },
    ChangeDuration {
        pitch: u8,
        delta: f64,
        category: CoarseCategory,
    },
    TimeOffset {
        delta: f64,
        category: CoarseCategory,
    },
    /// Replay `notes` (already captured by the caller), going back to `return_point`.
    Rollback {
        return_point: f64,
        notes: Vec<Note>,
    },
    /// Replay the last `events` chord events of the source up to the request time.
    Repeat { events: usize },
}

impl EditKind {
    /// Tie-break order among edits anchored at the same source time.
    pub fn precedence(&self) -> u8 {
        match self {
            EditKind::PitchInsert { .. } => 0,
            EditKind::PitchDelete { .. } => 1,
            EditKind::ChangeDuration { .. } => 2,
            EditKind::TimeOffset { .. } => 3,
            EditKind::Rollback { .. } | EditKind::Repeat { .. } => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EditKind::PitchInsert { .. } => "pitch_insert",
            EditKind::PitchDelete { .. } => "pitch_delete",
            EditKind::ChangeDuration { .. } => "change_duration",
            EditKind::TimeOffset { .. } => "time_offset",
            EditKind::Rollback { .. } => "rollback",
            EditKind::Repeat { .. } => "repeat",
        }
    }
}

impl EditRequest {
    pub fn new(source_time: f64, kind: EditKind) -> Self {
        EditRequest { source_time, kind }
    }

    /// Application order: by source time, then by precedence.
    pub fn order(&self, other: &EditRequest) -> Ordering {
        self.source_time
            .total_cmp(&other.source_time)
            .then(self.kind.precedence().cmp(&other.kind.precedence()))
    }
}

/// Stable sort into application order.
pub fn sort_requests(requests: &mut [EditRequest]) {
    requests.sort_by(EditRequest::order);
}
