//! # Mistaker
//!
//! Timeline edit tracking for mistake-augmented piano performances.
//!
//! A clean performance is edited into one that contains realistic mistakes:
//! inserted and deleted pitches, held notes, hesitations and rollbacks. The
//! [`EditTracker`] applies those edits and keeps a map from the original
//! timeline to the edited one, so annotations made for the original still line
//! up with the result.
//!
//! ## Modules
//! - [`tracker`] - time grid, note store, label track and the edit tracker
//! - [`category`] - coarse and fine label categories and their codes
//! - [`config`] - tracker constants, loadable from YAML
//! - [`request`] - serializable edit requests and their application order
//! - [`session`] - YAML sessions: a performance plus its edits
//! - [`export`] - MIDI and CSV writers
//!
//! ## Example
//! ```rust
//! use mistaker::{EditTracker, Note};
//!
//! let source = vec![
//!     Note::new(0.0, 0.5, 60, 80),
//!     Note::new(1.0, 0.5, 62, 80),
//!     Note::new(2.0, 0.5, 64, 80),
//! ];
//! let mut tracker = EditTracker::new(source)?;
//! tracker.time_offset(1.5, 0.5, "drag")?;
//!
//! assert!((tracker.to_target(2.0) - 2.5).abs() < 1e-9);
//! assert_eq!(tracker.to_target(0.0), 0.0);
//! # Ok::<(), mistaker::MistakeError>(())
//! ```

pub mod category;
pub mod config;
pub mod error;
pub mod export;
pub mod note;
pub mod request;
pub mod session;
pub mod tracker;

pub use category::{CodeTable, CoarseCategory, FineCategory};
pub use config::TrackerConfig;
pub use error::*;
pub use note::Note;
pub use request::{sort_requests, EditKind, EditRequest};
pub use session::{Session, SessionSummary};
pub use tracker::{
    EditOutcome, EditTracker, LabelEntry, RepeatMaterial, RepeatRecord, TimeMapRow, TimedLabel,
};

/// Load a YAML session and apply all of its edits.
pub fn run_session(content: &str) -> Result<(EditTracker, SessionSummary), MistakeError> {
    Session::from_yaml(content)?.run()
}
