//! # Error Types
//!
//! This module defines all error types for the edit tracker.
//!
//! Lookup misses (a pitch that cannot be found near the requested time) are not
//! errors: the affected operation reports them through its return value and logs
//! a warning. Everything else lands here so the caller can decide whether to skip
//! a single edit or abandon the whole performance.
//!
//! ## Error Types
//! - `EmptySource` - the tracker was built from an empty note array
//! - `InvalidNote` - a note does not fit the note schema (pitch range, negative duration)
//! - `InvalidTime` - a time or time delta that is not a finite number
//! - `OutOfOrder` - an edit arrived earlier than one already applied
//! - `InvalidRollbackRange` - rollback whose return point is not before its resume point
//! - `ConfigError` - invalid YAML configuration or session file
//! - `Io` - file or MIDI writing failed
//! - `Csv` - time map or repeats table could not be written
//!
//! ## Usage
//! ```rust
//! use mistaker::{EditTracker, MistakeError};
//!
//! match EditTracker::new(Vec::new()) {
//!     Err(MistakeError::EmptySource) => eprintln!("nothing to edit"),
//!     Err(e) => eprintln!("Error: {}", e),
//!     Ok(_) => unreachable!(),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MistakeError {
    /// The source note array was empty.
    ///
    /// # Example
    /// ```
    /// # use mistaker::MistakeError;
    /// assert_eq!(MistakeError::EmptySource.to_string(), "Source note array is empty");
    /// ```
    #[error("Source note array is empty")]
    EmptySource,

    /// A note does not conform to the note schema.
    ///
    /// # Example
    /// ```
    /// # use mistaker::MistakeError;
    /// let err = MistakeError::InvalidNote("pitch 130 is outside 0-127".to_string());
    /// assert_eq!(err.to_string(), "Invalid note: pitch 130 is outside 0-127");
    /// ```
    #[error("Invalid note: {0}")]
    InvalidNote(String),

    /// A source time or delta that is NaN or infinite.
    ///
    /// # Example
    /// ```
    /// # use mistaker::MistakeError;
    /// let err = MistakeError::InvalidTime("delta is NaN".to_string());
    /// assert_eq!(err.to_string(), "Invalid time: delta is NaN");
    /// ```
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    /// An edit was anchored earlier than an edit already applied.
    ///
    /// Edits must be supplied sorted by source time (and by precedence at equal
    /// times); the time map assumes every earlier edit is already folded in.
    ///
    /// # Example
    /// ```
    /// # use mistaker::MistakeError;
    /// let err = MistakeError::OutOfOrder { previous: 2.0, requested: 1.5 };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Edit at source time 1.500s arrived after an edit at 2.000s"
    /// );
    /// ```
    #[error("Edit at source time {requested:.3}s arrived after an edit at {previous:.3}s")]
    OutOfOrder {
        previous: f64,
        requested: f64,
    },

    /// Rollback range where the return point is not strictly before the resume point.
    ///
    /// # Example
    /// ```
    /// # use mistaker::MistakeError;
    /// let err = MistakeError::InvalidRollbackRange { return_point: 3.0, resume_point: 2.0 };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Rollback return point 3.000s must be before resume point 2.000s"
    /// );
    /// ```
    #[error(
        "Rollback return point {return_point:.3}s must be before resume point {resume_point:.3}s"
    )]
    InvalidRollbackRange {
        return_point: f64,
        resume_point: f64,
    },

    /// Invalid configuration or session content.
    ///
    /// # Example
    /// ```
    /// # use mistaker::MistakeError;
    /// let err = MistakeError::ConfigError("samples-per-second must be positive".to_string());
    /// assert_eq!(err.to_string(), "Invalid configuration: samples-per-second must be positive");
    /// ```
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
