//! # Label Categories
//!
//! Every edit is annotated twice: once with a coarse ("mid-level") category that
//! says which kind of mistake the scheduler was simulating, and once with a fine
//! ("low-level") category that says which structural operation was applied.
//!
//! Both categories map to a numeric code through a [`CodeTable`], so the label
//! track can be written out as a MIDI-like stream where the note pitch stands for
//! the category.
//!
//! ## Parsing
//! Categories parse from the strings the scheduler uses (`"mistouch"`,
//! `"wrong_pred"`, `"drag"`, ...). Unknown strings are kept as `Other` and map to
//! the table's default code.
//!
//! ```rust
//! use mistaker::{CodeTable, CoarseCategory, FineCategory};
//!
//! let table = CodeTable::default();
//! assert_eq!(table.coarse_code(&CoarseCategory::from("rollback")), 25);
//! assert_eq!(table.fine_code(&FineCategory::PitchInsert), 1);
//! assert_eq!(table.coarse_code(&CoarseCategory::from("sneeze")), 0);
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse (mid-level) mistake category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CoarseCategory {
    /// A note doubled from the previous or next onset
    ForwardBackwardInsertion,
    /// A neighbouring key touched together with the intended one
    Mistouch,
    /// A confidently played wrong pitch
    WrongPitchPrediction,
    /// A hesitation that stretches a note and delays what follows
    Drag,
    /// The performer goes back and replays recent material
    Rollback,
    Other(String),
}

impl CoarseCategory {
    pub fn name(&self) -> &str {
        match self {
            CoarseCategory::ForwardBackwardInsertion => "fwdbackwd",
            CoarseCategory::Mistouch => "mistouch",
            CoarseCategory::WrongPitchPrediction => "wrong_pred",
            CoarseCategory::Drag => "drag",
            CoarseCategory::Rollback => "rollback",
            CoarseCategory::Other(name) => name,
        }
    }
}

impl From<&str> for CoarseCategory {
    fn from(s: &str) -> Self {
        match s.trim() {
            "fwdbackwd" | "forward_backward_insertion" => CoarseCategory::ForwardBackwardInsertion,
            "mistouch" => CoarseCategory::Mistouch,
            "wrong_pred" | "pitch_change" => CoarseCategory::WrongPitchPrediction,
            "drag" => CoarseCategory::Drag,
            "rollback" => CoarseCategory::Rollback,
            other => CoarseCategory::Other(other.to_string()),
        }
    }
}

impl From<String> for CoarseCategory {
    fn from(s: String) -> Self {
        CoarseCategory::from(s.as_str())
    }
}

impl From<CoarseCategory> for String {
    fn from(category: CoarseCategory) -> Self {
        category.name().to_string()
    }
}

impl fmt::Display for CoarseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fine (low-level) operation category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FineCategory {
    PitchInsert,
    PitchDelete,
    GoBack,
    TimeShift,
    ChangeDuration,
    Other(String),
}

impl FineCategory {
    pub fn name(&self) -> &str {
        match self {
            FineCategory::PitchInsert => "pitch_insert",
            FineCategory::PitchDelete => "pitch_delete",
            FineCategory::GoBack => "go_back",
            FineCategory::TimeShift => "time_shift",
            FineCategory::ChangeDuration => "change_duration",
            FineCategory::Other(name) => name,
        }
    }
}

impl From<&str> for FineCategory {
    fn from(s: &str) -> Self {
        match s.trim() {
            "pitch_insert" | "insertion" => FineCategory::PitchInsert,
            "pitch_delete" => FineCategory::PitchDelete,
            "go_back" => FineCategory::GoBack,
            "time_shift" | "offset" => FineCategory::TimeShift,
            "change_duration" => FineCategory::ChangeDuration,
            other => FineCategory::Other(other.to_string()),
        }
    }
}

impl From<String> for FineCategory {
    fn from(s: String) -> Self {
        FineCategory::from(s.as_str())
    }
}

impl From<FineCategory> for String {
    fn from(category: FineCategory) -> Self {
        category.name().to_string()
    }
}

impl fmt::Display for FineCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Category to numeric code mapping used when labels are exported.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeTable {
    coarse: HashMap<CoarseCategory, u8>,
    fine: HashMap<FineCategory, u8>,
    pub default_coarse: u8,
    pub default_fine: u8,
}

impl Default for CodeTable {
    fn default() -> Self {
        let coarse = HashMap::from([
            (CoarseCategory::ForwardBackwardInsertion, 19),
            (CoarseCategory::WrongPitchPrediction, 22),
            (CoarseCategory::Rollback, 25),
            (CoarseCategory::Mistouch, 28),
            (CoarseCategory::Drag, 31),
        ]);
        let fine = HashMap::from([
            (FineCategory::PitchInsert, 1),
            (FineCategory::PitchDelete, 3),
            (FineCategory::GoBack, 5),
            (FineCategory::TimeShift, 7),
            (FineCategory::ChangeDuration, 9),
        ]);
        CodeTable {
            coarse,
            fine,
            default_coarse: 0,
            default_fine: 0,
        }
    }
}

impl CodeTable {
    pub fn coarse_code(&self, category: &CoarseCategory) -> u8 {
        self.coarse.get(category).copied().unwrap_or(self.default_coarse)
    }

    pub fn fine_code(&self, category: &FineCategory) -> u8 {
        self.fine.get(category).copied().unwrap_or(self.default_fine)
    }

    /// Override (or add) the code of a coarse category.
    pub fn set_coarse(&mut self, category: CoarseCategory, code: u8) {
        self.coarse.insert(category, code);
    }

    /// Override (or add) the code of a fine category.
    pub fn set_fine(&mut self, category: FineCategory, code: u8) {
        self.fine.insert(category, code);
    }
}
