//! The edit tracker: applies edits anchored on the source timeline and keeps
//! the time map, target notes and labels consistent with each other.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::category::{CoarseCategory, FineCategory};
use crate::config::TrackerConfig;
use crate::error::MistakeError;
use crate::note::Note;
use crate::request::{EditKind, EditRequest};

use super::label_track::{LabelEntry, LabelTrack};
use super::note_store::NoteStore;
use super::time_grid::{TimeGrid, TimeMapRow};

/// Slack allowed when comparing source times for the ordering check.
const ORDER_EPSILON: f64 = 1e-9;

/// A time-stamped label from an external annotation (beats, downbeats, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedLabel {
    pub time: f64,
    pub label: String,
}

/// One rollback: the repeated source span and where its first pass sits in
/// target time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatRecord {
    pub return_point: f64,
    pub resume_point: f64,
    pub from_times: Vec<f64>,
    pub to_times: Vec<f64>,
}

/// Material for a rollback, captured from the source notes.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatMaterial {
    pub return_point: f64,
    pub resume_point: f64,
    /// Owned copies in chronological order, re-based so the first onset is zero
    pub notes: Vec<Note>,
}

/// Result of an edit that can miss its note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditOutcome {
    Applied,
    /// The pitch was not found near the resolved time; nothing changed.
    LookupMiss,
}

impl From<bool> for EditOutcome {
    fn from(found: bool) -> Self {
        if found {
            EditOutcome::Applied
        } else {
            EditOutcome::LookupMiss
        }
    }
}

/// Tracks a batch of edits applied to one performance.
///
/// Every operation takes a **source** time. The tracker resolves it through
/// the time grid and acts on the target notes and labels at the resolved
/// target time, so callers never reason about target time themselves.
///
/// Edits must arrive in ascending source time; an edit anchored earlier than
/// one already applied is rejected with [`MistakeError::OutOfOrder`].
///
/// # Example
/// ```rust
/// use mistaker::{EditTracker, Note};
///
/// let source = vec![
///     Note::new(0.0, 0.5, 60, 80),
///     Note::new(1.0, 0.5, 60, 80),
///     Note::new(2.0, 0.5, 60, 80),
/// ];
/// let mut tracker = EditTracker::new(source)?;
/// tracker.pitch_insert(1.5, 64, 0.3, 80, "mistouch")?;
/// tracker.time_offset(1.5, 0.5, "drag")?;
///
/// assert_eq!(tracker.target_notes().len(), 4);
/// assert!((tracker.target_notes()[3].onset - 2.5).abs() < 1e-9);
/// # Ok::<(), mistaker::MistakeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct EditTracker {
    config: TrackerConfig,
    source: NoteStore,
    target: NoteStore,
    grid: TimeGrid,
    labels: LabelTrack,
    repeats: Vec<RepeatRecord>,
    annotation: Vec<TimedLabel>,
    last_source_time: Option<f64>,
    last_request: Option<(f64, u8)>,
}

impl EditTracker {
    pub fn new(source: Vec<Note>) -> Result<Self, MistakeError> {
        EditTracker::with_config(source, TrackerConfig::default())
    }

    pub fn with_config(source: Vec<Note>, config: TrackerConfig) -> Result<Self, MistakeError> {
        if source.is_empty() {
            return Err(MistakeError::EmptySource);
        }
        for note in &source {
            note.validate()?;
        }
        let source = NoteStore::new(source);
        let first = source.notes()[0].onset;
        let last = source.notes()[source.len() - 1].onset;
        let grid = TimeGrid::for_onsets(first, last, config.samples_per_second);
        let labels = LabelTrack::new(config.codes.clone(), config.label_velocity);
        debug!(
            "tracking {} source notes, grid of {} samples over {:.3}s..{:.3}s",
            source.len(),
            grid.len(),
            first,
            grid.time_from()[grid.len() - 1]
        );

        Ok(EditTracker {
            config,
            target: source.clone(),
            source,
            grid,
            labels,
            repeats: Vec::new(),
            annotation: Vec::new(),
            last_source_time: None,
            last_request: None,
        })
    }

    /// Attach an external time-series annotation, carried through unmodified.
    pub fn with_annotation(mut self, annotation: Vec<TimedLabel>) -> Self {
        self.annotation = annotation;
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn source_notes(&self) -> &[Note] {
        self.source.notes()
    }

    pub fn target_notes(&self) -> &[Note] {
        self.target.notes()
    }

    pub fn labels(&self) -> &[LabelEntry] {
        self.labels.entries()
    }

    /// Labels as notes on the coarse ("mid-level") track.
    pub fn coarse_label_notes(&self) -> Vec<Note> {
        self.labels.coarse_notes()
    }

    /// Labels as notes on the fine ("low-level") track.
    pub fn fine_label_notes(&self) -> Vec<Note> {
        self.labels.fine_notes()
    }

    pub fn time_grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn time_map(&self) -> Vec<TimeMapRow> {
        self.grid.rows()
    }

    pub fn repeats(&self) -> &[RepeatRecord] {
        &self.repeats
    }

    pub fn annotation(&self) -> &[TimedLabel] {
        &self.annotation
    }

    /// The external annotation with every time mapped onto the target timeline.
    pub fn adjusted_annotation(&self) -> Vec<TimedLabel> {
        self.annotation
            .iter()
            .map(|a| TimedLabel {
                time: self.grid.to_target(a.time),
                label: a.label.clone(),
            })
            .collect()
    }

    /// Target-time equivalent of `source_time`.
    pub fn to_target(&self, source_time: f64) -> f64 {
        self.grid.to_target(source_time)
    }

    /// Up to `n_events` chord events of the **source** ending with the event
    /// nearest `source_time`, most recent first.
    pub fn events_before(&self, source_time: f64, n_events: usize) -> Vec<Note> {
        self.source
            .events_before(source_time, n_events, self.config.chord_tolerance)
    }

    /// Capture the material for a rollback: the last `n_events` source events
    /// up to `source_time`, as chronological copies starting at zero.
    ///
    /// Returns `None` when nothing can be repeated (no events, or a span of zero
    /// length).
    pub fn repeat_material(&self, source_time: f64, n_events: usize) -> Option<RepeatMaterial> {
        let mut notes = self.events_before(source_time, n_events);
        if notes.is_empty() {
            return None;
        }
        notes.reverse();
        let return_point = notes.iter().map(|n| n.onset).fold(f64::INFINITY, f64::min);
        let resume_point = notes.iter().map(Note::offset).fold(f64::NEG_INFINITY, f64::max);
        if resume_point <= return_point {
            return None;
        }
        for note in &mut notes {
            note.onset -= return_point;
        }
        Some(RepeatMaterial {
            return_point,
            resume_point,
            notes,
        })
    }

    /// Insert a new note at the target time of `source_time`.
    pub fn pitch_insert(
        &mut self,
        source_time: f64,
        pitch: u8,
        duration: f64,
        velocity: u8,
        category: impl Into<CoarseCategory>,
    ) -> Result<(), MistakeError> {
        self.check_time(source_time)?;
        let onset = self.grid.to_target(source_time);
        let note = Note::new(onset, duration, pitch, velocity);
        note.validate()?;
        let end = note.offset();
        self.target.insert(note);
        let label = self.labels.add(onset, end, FineCategory::PitchInsert, category.into());
        debug!("inserted pitch {} at {:.3}s ({})", pitch, onset, label.coarse);
        self.last_source_time = Some(source_time);
        Ok(())
    }

    /// Delete the note of `pitch` nearest the target time of `source_time`.
    ///
    /// Returns `Ok(false)` when no such note lies within the lookup window.
    pub fn pitch_delete(
        &mut self,
        source_time: f64,
        pitch: u8,
        category: impl Into<CoarseCategory>,
    ) -> Result<bool, MistakeError> {
        self.check_time(source_time)?;
        self.last_source_time = Some(source_time);
        let time = self.grid.to_target(source_time);
        let Some(idx) = self.target.find(time, pitch, self.config.lookup_window) else {
            warn!(
                "pitch {} not found near source time {:.3}s (target {:.3}s), nothing deleted",
                pitch, source_time, time
            );
            return Ok(false);
        };
        let note = self.target.notes()[idx].clone();
        self.target.delete(&note);
        self.labels
            .add(note.onset, note.offset(), FineCategory::PitchDelete, category.into());
        debug!("deleted pitch {} at {:.3}s", pitch, note.onset);
        Ok(true)
    }

    /// Add `delta` to the duration of the note of `pitch` nearest the target
    /// time of `source_time`.
    ///
    /// Returns `Ok(false)` when no such note lies within the lookup window.
    pub fn change_note_duration(
        &mut self,
        source_time: f64,
        pitch: u8,
        delta: f64,
        category: impl Into<CoarseCategory>,
    ) -> Result<bool, MistakeError> {
        self.check_time(source_time)?;
        finite("duration delta", delta)?;
        self.last_source_time = Some(source_time);
        let time = self.grid.to_target(source_time);
        let Some(note) = self
            .target
            .change_duration(time, pitch, delta, self.config.lookup_window)
        else {
            warn!(
                "pitch {} not found near source time {:.3}s (target {:.3}s), duration unchanged",
                pitch, source_time, time
            );
            return Ok(false);
        };
        self.labels
            .add(note.onset, note.offset(), FineCategory::ChangeDuration, category.into());
        debug!("changed duration of pitch {} at {:.3}s by {:.3}s", pitch, note.onset, delta);
        Ok(true)
    }

    /// Shift everything at or after `source_time` by `delta` in target time.
    ///
    /// The time map, the target notes and the labels move together, and a
    /// label describing the shift itself is added.
    pub fn time_offset(
        &mut self,
        source_time: f64,
        delta: f64,
        category: impl Into<CoarseCategory>,
    ) -> Result<(), MistakeError> {
        self.check_time(source_time)?;
        finite("delta", delta)?;
        self.shift(source_time, delta, category.into());
        self.last_source_time = Some(source_time);
        Ok(())
    }

    /// Go back from `resume_point` to `return_point` and replay `notes_to_repeat`.
    ///
    /// A gap of `resume_point - return_point` opens at the target time of
    /// `return_point`; the originals from there on move later by that amount.
    /// Owned copies of `notes_to_repeat`, re-based to their earliest onset, fill
    /// the gap starting at the pre-shift target time of `return_point`.
    pub fn rollback(
        &mut self,
        return_point: f64,
        resume_point: f64,
        notes_to_repeat: &[Note],
    ) -> Result<(), MistakeError> {
        finite("return point", return_point)?;
        self.check_time(resume_point)?;
        self.replay(return_point, resume_point, notes_to_repeat)?;
        self.last_source_time = Some(resume_point);
        Ok(())
    }

    /// Rollback without the ordering check; leaves the ordering anchor alone.
    fn replay(
        &mut self,
        return_point: f64,
        resume_point: f64,
        notes_to_repeat: &[Note],
    ) -> Result<(), MistakeError> {
        if !(return_point < resume_point) {
            return Err(MistakeError::InvalidRollbackRange {
                return_point,
                resume_point,
            });
        }
        for note in notes_to_repeat {
            note.validate()?;
        }

        let window = resume_point - return_point;
        let (from_times, to_times) = self.grid.sub_map(
            self.grid.nearest_index(return_point),
            self.grid.nearest_index(resume_point),
        );
        let anchor = self.shift(return_point, window, CoarseCategory::Rollback);

        let base = notes_to_repeat
            .iter()
            .map(|n| n.onset)
            .fold(f64::INFINITY, f64::min);
        self.target.extend(notes_to_repeat.iter().map(|n| {
            let mut copy = n.clone();
            copy.onset = anchor + (n.onset - base);
            copy
        }));
        self.labels
            .add(anchor, anchor + window, FineCategory::GoBack, CoarseCategory::Rollback);
        self.repeats.push(RepeatRecord {
            return_point,
            resume_point,
            from_times,
            to_times,
        });
        debug!(
            "rolled back from {:.3}s to {:.3}s, repeating {} notes at {:.3}s",
            resume_point,
            return_point,
            notes_to_repeat.len(),
            anchor
        );
        Ok(())
    }

    /// Apply one scheduled edit.
    ///
    /// Requests must come in `(source_time, precedence)` order.
    pub fn apply(&mut self, request: &EditRequest) -> Result<EditOutcome, MistakeError> {
        finite("source time", request.source_time)?;
        let key = (request.source_time, request.kind.precedence());
        if let Some((time, precedence)) = self.last_request {
            let earlier = key.0 < time - ORDER_EPSILON;
            let same_time = (key.0 - time).abs() <= ORDER_EPSILON;
            if earlier || (same_time && key.1 < precedence) {
                return Err(MistakeError::OutOfOrder {
                    previous: time,
                    requested: key.0,
                });
            }
        }

        let t = request.source_time;
        let outcome = match &request.kind {
            EditKind::PitchInsert {
                pitch,
                duration,
                velocity,
                category,
            } => {
                self.pitch_insert(t, *pitch, *duration, *velocity, category.clone())?;
                EditOutcome::Applied
            }
            EditKind::PitchDelete { pitch, category } => {
                self.pitch_delete(t, *pitch, category.clone())?.into()
            }
            EditKind::ChangeDuration {
                pitch,
                delta,
                category,
            } => self
                .change_note_duration(t, *pitch, *delta, category.clone())?
                .into(),
            EditKind::TimeOffset { delta, category } => {
                self.time_offset(t, *delta, category.clone())?;
                EditOutcome::Applied
            }
            EditKind::Rollback {
                return_point,
                notes,
            } => {
                self.rollback(*return_point, t, notes)?;
                EditOutcome::Applied
            }
            EditKind::Repeat { events } => {
                self.check_time(t)?;
                // ordered by the request time, not by the end of the repeated notes
                let outcome = match self.repeat_material(t, *events) {
                    Some(material) => {
                        let resume_point = material.resume_point.max(t);
                        self.replay(material.return_point, resume_point, &material.notes)?;
                        EditOutcome::Applied
                    }
                    None => {
                        warn!("nothing to repeat at source time {:.3}s ({} events)", t, events);
                        EditOutcome::LookupMiss
                    }
                };
                self.last_source_time = Some(t);
                outcome
            }
        };
        self.last_request = Some(key);
        Ok(outcome)
    }

    /// Apply requests in order, stopping at the first error.
    pub fn apply_all(
        &mut self,
        requests: &[EditRequest],
    ) -> Result<Vec<EditOutcome>, MistakeError> {
        requests.iter().map(|r| self.apply(r)).collect()
    }

    fn check_time(&self, source_time: f64) -> Result<(), MistakeError> {
        finite("source time", source_time)?;
        match self.last_source_time {
            Some(previous) if source_time < previous - ORDER_EPSILON => {
                Err(MistakeError::OutOfOrder {
                    previous,
                    requested: source_time,
                })
            }
            _ => Ok(()),
        }
    }

    /// Shift grid, notes and labels from `source_time` on; returns the
    /// pre-shift target time of the shift point.
    fn shift(&mut self, source_time: f64, delta: f64, category: CoarseCategory) -> f64 {
        let time = self.grid.to_target(source_time);
        self.grid.shift_from(source_time, delta);
        // notes up to half a grid step early still belong to the shifted sample
        let from = time - self.half_step();
        let moved = self.target.shift_from(from, delta);
        self.labels.shift_after(from, delta);
        self.labels
            .add(time, time + delta.abs(), FineCategory::TimeShift, category);
        debug!("shifted {} notes from {:.3}s by {:.3}s", moved, time, delta);
        time
    }

    fn half_step(&self) -> f64 {
        let from = self.grid.time_from();
        if from.len() < 2 {
            return ORDER_EPSILON;
        }
        (from[1] - from[0]) / 2.0 + ORDER_EPSILON
    }
}

fn finite(what: &str, value: f64) -> Result<f64, MistakeError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MistakeError::InvalidTime(format!("{} is {}", what, value)))
    }
}
