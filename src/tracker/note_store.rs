//! Onset-ordered note collection with windowed lookup.

use std::ops::Range;

use crate::note::Note;

/// Notes kept sorted by onset.
///
/// Inserts are positional (binary search), so the order is maintained without
/// re-sorting the whole collection. Notes sharing an onset keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteStore {
    notes: Vec<Note>,
}

impl NoteStore {
    /// Build a store from notes in any order. The sort is stable.
    pub fn new(mut notes: Vec<Note>) -> Self {
        notes.sort_by(|a, b| a.onset.total_cmp(&b.onset));
        NoteStore { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    pub fn into_notes(self) -> Vec<Note> {
        self.notes
    }

    /// Insert after any notes with the same onset. Returns the new note's index.
    pub fn insert(&mut self, note: Note) -> usize {
        let idx = self.notes.partition_point(|n| n.onset <= note.onset);
        self.notes.insert(idx, note);
        idx
    }

    pub fn extend(&mut self, notes: impl IntoIterator<Item = Note>) {
        for note in notes {
            self.insert(note);
        }
    }

    /// Index of the note with `pitch` whose onset lies within `window` of `time`
    /// and is closest to it. Ties go to the earlier note.
    pub fn find(&self, time: f64, pitch: u8, window: f64) -> Option<usize> {
        let lo = self.notes.partition_point(|n| n.onset < time - window);
        let hi = self.notes.partition_point(|n| n.onset <= time + window);
        self.notes[lo..hi.max(lo)]
            .iter()
            .enumerate()
            .filter(|(_, n)| n.pitch == pitch)
            .min_by(|(_, a), (_, b)| (a.onset - time).abs().total_cmp(&(b.onset - time).abs()))
            .map(|(i, _)| lo + i)
    }

    /// Remove the first note matching `note` by onset and pitch.
    ///
    /// Matching is by value rather than index because earlier edits may have
    /// moved indices around.
    pub fn delete(&mut self, note: &Note) -> Option<Note> {
        let idx = self
            .notes
            .iter()
            .position(|n| n.onset == note.onset && n.pitch == note.pitch)?;
        Some(self.notes.remove(idx))
    }

    /// Add `delta` to the duration of the note found by [`NoteStore::find`].
    ///
    /// Durations never drop below zero. Returns the updated note, or `None` when
    /// no note matches.
    pub fn change_duration(
        &mut self,
        time: f64,
        pitch: u8,
        delta: f64,
        window: f64,
    ) -> Option<Note> {
        let idx = self.find(time, pitch, window)?;
        let note = &mut self.notes[idx];
        note.duration = (note.duration + delta).max(0.0);
        Some(note.clone())
    }

    /// Move every note with onset at or after `time` by `delta`.
    /// Returns how many notes moved.
    pub fn shift_from(&mut self, time: f64, delta: f64) -> usize {
        let start = self.notes.partition_point(|n| n.onset < time);
        for note in &mut self.notes[start..] {
            note.onset += delta;
        }
        if delta < 0.0 {
            self.notes.sort_by(|a, b| a.onset.total_cmp(&b.onset));
        }
        self.notes.len() - start
    }

    /// Index of the note whose onset is closest to `time` (ties go low).
    pub fn nearest_index(&self, time: f64) -> Option<usize> {
        if self.notes.is_empty() {
            return None;
        }
        let i = self.notes.partition_point(|n| n.onset < time);
        if i == 0 {
            return Some(0);
        }
        if i >= self.notes.len() {
            return Some(self.notes.len() - 1);
        }
        let below = time - self.notes[i - 1].onset;
        let above = self.notes[i].onset - time;
        Some(if below <= above { i - 1 } else { i })
    }

    /// Split the notes into chords: runs whose onsets lie within `tolerance`
    /// of the run's first onset.
    pub fn chord_groups(&self, tolerance: f64) -> Vec<Range<usize>> {
        let mut groups = Vec::new();
        let mut start = 0;
        for i in 1..self.notes.len() {
            if self.notes[i].onset - self.notes[start].onset > tolerance {
                groups.push(start..i);
                start = i;
            }
        }
        if !self.notes.is_empty() {
            groups.push(start..self.notes.len());
        }
        groups
    }

    /// Up to `n_events` chord events ending with the event nearest `time`,
    /// most recent first.
    ///
    /// Simultaneous onsets (within `chord_tolerance`) count as one event. The
    /// walk stops early at the start of the piece.
    pub fn events_before(&self, time: f64, n_events: usize, chord_tolerance: f64) -> Vec<Note> {
        let Some(nearest) = self.nearest_index(time) else {
            return Vec::new();
        };
        if n_events == 0 {
            return Vec::new();
        }
        let groups = self.chord_groups(chord_tolerance);
        let Some(g) = groups.iter().position(|r| r.contains(&nearest)) else {
            return Vec::new();
        };
        let first = (g + 1).saturating_sub(n_events);
        groups[first..=g]
            .iter()
            .rev()
            .flat_map(|r| self.notes[r.clone()].iter().rev().cloned())
            .collect()
    }
}
