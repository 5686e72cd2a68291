//! # Tracker Module
//!
//! Keep an invertible record of how mistake edits displace a performance in time.
//!
//! ## Purpose
//! A clean performance (the **source**) is turned into a mistake-augmented one
//! (the **target**) by a batch of edits. Ground truth produced for the source
//! (beats, score alignment) must stay usable against the target, so every edit
//! is recorded in three places at once:
//! 1. **Time map** - where each source instant ended up in target time
//! 2. **Target notes** - the edited performance itself
//! 3. **Labels** - what was done where, as a coarse and a fine category
//!
//! ## Sub-modules
//! - `time_grid` - sampled source → target time map
//! - `note_store` - onset-ordered notes with windowed pitch lookup
//! - `label_track` - start-ordered edit labels
//! - `edit_tracker` - the operations that keep the three consistent
//!
//! ## Key Types
//! - [`EditTracker`] - entry point; one per performance
//! - [`TimeGrid`] - `time_from` / `time_to` samples
//! - [`LabelEntry`] - one annotated edit
//! - [`RepeatRecord`] - the sub-map of one rollback's repeated pass
//!
//! ## Source-Time Anchoring
//! Callers always speak in source time. The tracker resolves each anchor to
//! the nearest grid sample and acts at that sample's target time:
//!
//! ```text
//! source:  0.0 ---- 1.0 ---- 1.5 ---- 2.0
//!                             | time_offset(1.5, +0.5)
//! target:  0.0 ---- 1.0 ---- 1.5 ........ 2.5
//! ```
//!
//! ## Example
//! ```rust
//! use mistaker::{EditTracker, Note};
//!
//! let source: Vec<Note> = (0..4).map(|i| Note::new(i as f64, 0.5, 60, 80)).collect();
//! let mut tracker = EditTracker::new(source)?;
//!
//! let material = tracker.repeat_material(2.0, 2).unwrap();
//! assert_eq!(material.return_point, 1.0);
//! assert_eq!(material.resume_point, 2.5);
//!
//! tracker.rollback(material.return_point, material.resume_point, &material.notes)?;
//! assert_eq!(tracker.target_notes().len(), 6);
//! assert_eq!(tracker.repeats().len(), 1);
//! # Ok::<(), mistaker::MistakeError>(())
//! ```
//!
//! ## Ordering
//! Edits must be applied in ascending source time. Later shifts assume every
//! earlier edit is already folded into the time map; the tracker rejects
//! edits that go backwards.

mod edit_tracker;
mod label_track;
mod note_store;
mod time_grid;


pub use edit_tracker::{EditOutcome, EditTracker, RepeatMaterial, RepeatRecord, TimedLabel};
pub use label_track::{LabelEntry, LabelTrack};
pub use note_store::NoteStore;
pub use time_grid::{TimeGrid, TimeMapRow};
