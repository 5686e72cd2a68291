//! Performed note events.

use serde::{Deserialize, Serialize};

use crate::error::MistakeError;

/// Id carried by notes that do not come from the source performance.
pub const SYNTHETIC_ID: &str = "none";

fn synthetic_id() -> String {
    SYNTHETIC_ID.to_string()
}

/// One performed note.
///
/// Times are in seconds. `pitch` and `velocity` follow the MIDI 0-127 range
/// and `channel` the 0-15 range, which [`Note::validate`] enforces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub onset: f64,
    pub duration: f64,
    pub pitch: u8,
    pub velocity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
    #[serde(default = "synthetic_id")]
    pub id: String,
}

impl Note {
    /// Create a synthetic note (id `"none"`, no track or channel).
    pub fn new(onset: f64, duration: f64, pitch: u8, velocity: u8) -> Self {
        Note {
            onset,
            duration,
            pitch,
            velocity,
            track: None,
            channel: None,
            id: synthetic_id(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn offset(&self) -> f64 {
        self.onset + self.duration
    }

    /// Check the note against the note schema.
    ///
    /// ```
    /// # use mistaker::Note;
    /// assert!(Note::new(0.0, 0.5, 60, 80).validate().is_ok());
    /// assert!(Note::new(0.0, -0.5, 60, 80).validate().is_err());
    /// assert!(Note::new(0.0, 0.5, 128, 80).validate().is_err());
    ///
    /// let mut note = Note::new(0.0, 0.5, 60, 80);
    /// note.channel = Some(20);
    /// assert!(note.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), MistakeError> {
        if !self.onset.is_finite() {
            return Err(MistakeError::InvalidNote(format!(
                "onset {} is not a finite number",
                self.onset
            )));
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(MistakeError::InvalidNote(format!(
                "duration {} must be a finite, non-negative number",
                self.duration
            )));
        }
        if self.pitch > 127 {
            return Err(MistakeError::InvalidNote(format!(
                "pitch {} is outside 0-127",
                self.pitch
            )));
        }
        if self.velocity > 127 {
            return Err(MistakeError::InvalidNote(format!(
                "velocity {} is outside 0-127",
                self.velocity
            )));
        }
        if let Some(channel) = self.channel.filter(|&c| c > 15) {
            return Err(MistakeError::InvalidNote(format!(
                "channel {} is outside 0-15",
                channel
            )));
        }
        Ok(())
    }
}
