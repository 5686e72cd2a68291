//! Edit annotations on the target timeline.

use serde::Serialize;

use crate::category::{CodeTable, CoarseCategory, FineCategory};
use crate::note::Note;

/// One annotated edit: where it happened in target time and what it was.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelEntry {
    pub start: f64,
    pub duration: f64,
    pub coarse_code: u8,
    pub fine_code: u8,
    pub fine: FineCategory,
    pub coarse: CoarseCategory,
    pub velocity: u8,
}

impl LabelEntry {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Coarse ("mid-level") view as a note whose pitch is the category code.
    pub fn coarse_note(&self) -> Note {
        Note::new(self.start, self.duration, self.coarse_code, self.velocity)
            .with_id(self.coarse.name())
    }

    /// Fine ("low-level") view as a note whose pitch is the category code.
    pub fn fine_note(&self) -> Note {
        Note::new(self.start, self.duration, self.fine_code, self.velocity)
            .with_id(self.fine.name())
    }
}

/// Labels sorted by start time.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelTrack {
    entries: Vec<LabelEntry>,
    codes: CodeTable,
    velocity: u8,
}

impl LabelTrack {
    pub fn new(codes: CodeTable, velocity: u8) -> Self {
        LabelTrack {
            entries: Vec::new(),
            codes,
            velocity,
        }
    }

    pub fn entries(&self) -> &[LabelEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn codes(&self) -> &CodeTable {
        &self.codes
    }

    /// Record an edit spanning `start..end` in target time.
    pub fn add(
        &mut self,
        start: f64,
        end: f64,
        fine: FineCategory,
        coarse: CoarseCategory,
    ) -> &LabelEntry {
        let entry = LabelEntry {
            start,
            duration: (end - start).max(0.0),
            coarse_code: self.codes.coarse_code(&coarse),
            fine_code: self.codes.fine_code(&fine),
            fine,
            coarse,
            velocity: self.velocity,
        };
        let idx = self.entries.partition_point(|e| e.start <= start);
        self.entries.insert(idx, entry);
        &self.entries[idx]
    }

    /// Move every label starting at or after `target_time` by `delta`.
    ///
    /// Must accompany every time-grid shift so labels stay with the notes they
    /// describe.
    pub fn shift_after(&mut self, target_time: f64, delta: f64) -> usize {
        let start = self.entries.partition_point(|e| e.start < target_time);
        for entry in &mut self.entries[start..] {
            entry.start += delta;
        }
        if delta < 0.0 {
            self.entries.sort_by(|a, b| a.start.total_cmp(&b.start));
        }
        self.entries.len() - start
    }

    pub fn coarse_notes(&self) -> Vec<Note> {
        self.entries.iter().map(LabelEntry::coarse_note).collect()
    }

    pub fn fine_notes(&self) -> Vec<Note> {
        self.entries.iter().map(LabelEntry::fine_note).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> LabelTrack {
        LabelTrack::new(CodeTable::default(), 20)
    }

    #[test]
    fn test_add_keeps_start_order() {
        let mut labels = track();
        labels.add(2.0, 2.5, FineCategory::PitchInsert, CoarseCategory::Mistouch);
        labels.add(1.0, 1.2, FineCategory::PitchDelete, CoarseCategory::WrongPitchPrediction);
        labels.add(2.0, 3.0, FineCategory::TimeShift, CoarseCategory::Drag);
        let starts: Vec<f64> = labels.entries().iter().map(|e| e.start).collect();
        assert_eq!(starts, vec![1.0, 2.0, 2.0]);
        // same start keeps insertion order
        assert_eq!(labels.entries()[1].fine, FineCategory::PitchInsert);
        assert_eq!(labels.entries()[2].fine, FineCategory::TimeShift);
    }

    #[test]
    fn test_codes_resolved_on_add() {
        let mut labels = track();
        let entry = labels.add(0.0, 0.3, FineCategory::GoBack, CoarseCategory::Rollback).clone();
        assert_eq!(entry.coarse_code, 25);
        assert_eq!(entry.fine_code, 5);
        assert_eq!(entry.velocity, 20);
        assert!((entry.duration - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_category_uses_default_code() {
        let mut labels = track();
        let entry = labels
            .add(0.0, 1.0, FineCategory::from("wobble"), CoarseCategory::from("sneeze"))
            .clone();
        assert_eq!(entry.coarse_code, 0);
        assert_eq!(entry.fine_code, 0);
        assert_eq!(entry.coarse.name(), "sneeze");
    }

    #[test]
    fn test_shift_after() {
        let mut labels = track();
        labels.add(0.5, 0.6, FineCategory::PitchInsert, CoarseCategory::Mistouch);
        labels.add(1.5, 1.6, FineCategory::PitchInsert, CoarseCategory::Mistouch);
        labels.add(2.5, 2.6, FineCategory::PitchInsert, CoarseCategory::Mistouch);
        assert_eq!(labels.shift_after(1.5, 1.0), 2);
        let starts: Vec<f64> = labels.entries().iter().map(|e| e.start).collect();
        assert_eq!(starts, vec![0.5, 2.5, 3.5]);
    }

    #[test]
    fn test_parallel_views() {
        let mut labels = track();
        labels.add(1.0, 1.5, FineCategory::PitchInsert, CoarseCategory::Mistouch);
        let coarse = labels.coarse_notes();
        let fine = labels.fine_notes();
        assert_eq!(coarse.len(), 1);
        assert_eq!(fine.len(), 1);
        assert_eq!(coarse[0].pitch, 28);
        assert_eq!(fine[0].pitch, 1);
        assert_eq!(coarse[0].onset, fine[0].onset);
        assert_eq!(fine[0].id, "pitch_insert");
    }
}
