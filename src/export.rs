//! # Export
//!
//! Writers for everything an edited performance produces.
//!
//! ## Outputs
//! - [`notes_to_midi`] - a note sequence (source or target) as a single-track SMF
//! - [`labels_to_midi`] - the label track as a two-track SMF (coarse, fine)
//! - [`time_map_csv`] - `time_from,time_to` rows of the time grid
//! - [`repeats_csv`] - one row per sample of every repeat record
//! - [`annotation_csv`] - `time,label` rows of an annotation (source or adjusted)
//! - [`edits_csv`] - the edit requests that were applied, one row each
//!
//! MIDI files use a fixed 480 ticks per beat at 120 bpm, so one second is 960
//! ticks and note times survive the round trip to the millisecond.
//!
//! ## Example
//! ```rust
//! use mistaker::{export, EditTracker, Note};
//!
//! let source = vec![Note::new(0.0, 0.5, 60, 80), Note::new(1.0, 0.5, 62, 80)];
//! let mut tracker = EditTracker::new(source)?;
//! tracker.pitch_insert(0.5, 61, 0.25, 70, "mistouch")?;
//!
//! let target = export::notes_to_midi(tracker.target_notes())?;
//! let labels = export::labels_to_midi(tracker.labels())?;
//! let time_map = export::time_map_csv(&tracker.time_map())?;
//! assert!(target.starts_with(b"MThd"));
//! assert!(labels.starts_with(b"MThd"));
//! assert!(time_map.starts_with("time_from,time_to\n"));
//! # Ok::<(), mistaker::MistakeError>(())
//! ```

use std::io::Cursor;

use midly::num::{u4, u7};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use serde::Serialize;

use crate::error::MistakeError;
use crate::note::Note;
use crate::request::{EditKind, EditRequest};
use crate::tracker::{LabelEntry, RepeatRecord, TimeMapRow, TimedLabel};

pub const TICKS_PER_BEAT: u16 = 480;
pub const BEATS_PER_MINUTE: u32 = 120;
pub const TICKS_PER_SECOND: f64 = TICKS_PER_BEAT as f64 * BEATS_PER_MINUTE as f64 / 60.0;

#[derive(Debug, Clone)]
struct AbsoluteEvent<'a> {
    tick: u32,
    kind: TrackEventKind<'a>,
}

fn to_ticks(seconds: f64) -> u32 {
    (seconds.max(0.0) * TICKS_PER_SECOND).round() as u32
}

/// NoteOn/NoteOff pairs for `notes`, as delta-timed track events.
///
/// At equal ticks a NoteOff goes before a NoteOn, so a note repeated right
/// after itself is not cut short. Every note lasts at least one tick.
fn note_events(notes: &[Note]) -> Result<Vec<TrackEvent<'static>>, MistakeError> {
    let mut absolute = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        note.validate()?;
        let channel = u4::new(note.channel.unwrap_or(0));
        let key = u7::new(note.pitch);
        let vel = u7::new(note.velocity);
        let start = to_ticks(note.onset);
        absolute.push(AbsoluteEvent {
            tick: start,
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key, vel },
            },
        });
        absolute.push(AbsoluteEvent {
            tick: to_ticks(note.offset()).max(start + 1),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff { key, vel },
            },
        });
    }
    absolute.sort_by_key(|e| {
        let is_on = matches!(
            e.kind,
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { .. },
                ..
            }
        );
        (e.tick, is_on)
    });

    let mut previous = 0;
    Ok(absolute
        .into_iter()
        .map(|e| {
            let delta = e.tick - previous;
            previous = e.tick;
            TrackEvent {
                delta: delta.into(),
                kind: e.kind,
            }
        })
        .collect())
}

fn tempo_event() -> TrackEvent<'static> {
    TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::Tempo((60_000_000 / BEATS_PER_MINUTE).into())),
    }
}

fn end_of_track() -> TrackEvent<'static> {
    TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    }
}

fn named_track(
    name: &'static [u8],
    notes: &[Note],
    with_tempo: bool,
) -> Result<Track<'static>, MistakeError> {
    let mut track = Track::new();
    if with_tempo {
        track.push(tempo_event());
    }
    track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(name)),
    });
    track.extend(note_events(notes)?);
    track.push(end_of_track());
    Ok(track)
}

fn write_smf(smf: &Smf) -> Result<Vec<u8>, MistakeError> {
    let mut buffer = Vec::new();
    smf.write_std(&mut Cursor::new(&mut buffer))?;
    Ok(buffer)
}

/// Write `notes` as a single-track Standard MIDI File.
///
/// Every note is checked with [`Note::validate`] first, so an out-of-range
/// channel is an error rather than a wrapped value.
pub fn notes_to_midi(notes: &[Note]) -> Result<Vec<u8>, MistakeError> {
    let mut smf = Smf::new(Header {
        format: Format::SingleTrack,
        timing: Timing::Metrical(TICKS_PER_BEAT.into()),
    });
    let mut track = Track::new();
    track.push(tempo_event());
    track.extend(note_events(notes)?);
    track.push(end_of_track());
    smf.tracks.push(track);
    write_smf(&smf)
}

/// Write the labels as a two-track Standard MIDI File.
///
/// Track 0 holds the coarse categories, track 1 the fine ones; each label is a
/// note whose pitch is its category code.
pub fn labels_to_midi(labels: &[LabelEntry]) -> Result<Vec<u8>, MistakeError> {
    let coarse: Vec<Note> = labels.iter().map(LabelEntry::coarse_note).collect();
    let fine: Vec<Note> = labels.iter().map(LabelEntry::fine_note).collect();

    let mut smf = Smf::new(Header {
        format: Format::Parallel,
        timing: Timing::Metrical(TICKS_PER_BEAT.into()),
    });
    smf.tracks.push(named_track(b"coarse", &coarse, true)?);
    smf.tracks.push(named_track(b"fine", &fine, false)?);
    write_smf(&smf)
}

fn into_csv_string(writer: csv::Writer<Vec<u8>>) -> Result<String, MistakeError> {
    let bytes = writer.into_inner().map_err(|e| MistakeError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| MistakeError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Time map as CSV with a `time_from,time_to` header.
pub fn time_map_csv(rows: &[TimeMapRow]) -> Result<String, MistakeError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    into_csv_string(writer)
}

#[derive(Serialize)]
struct RepeatRow {
    return_point: f64,
    resume_point: f64,
    time_from: f64,
    time_to: f64,
}

/// Repeat records as CSV, one row per sample of each record's sub-map.
pub fn repeats_csv(repeats: &[RepeatRecord]) -> Result<String, MistakeError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(["return_point", "resume_point", "time_from", "time_to"])?;
    for record in repeats {
        for (&time_from, &time_to) in record.from_times.iter().zip(&record.to_times) {
            writer.serialize(RepeatRow {
                return_point: record.return_point,
                resume_point: record.resume_point,
                time_from,
                time_to,
            })?;
        }
    }
    into_csv_string(writer)
}

/// Annotation labels as CSV with a `time,label` header.
pub fn annotation_csv(labels: &[TimedLabel]) -> Result<String, MistakeError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for label in labels {
        writer.serialize(label)?;
    }
    into_csv_string(writer)
}

#[derive(Serialize, Default)]
struct EditRow<'a> {
    source_time: f64,
    op: &'a str,
    pitch: Option<u8>,
    duration: Option<f64>,
    velocity: Option<u8>,
    delta: Option<f64>,
    category: Option<&'a str>,
    return_point: Option<f64>,
    events: Option<usize>,
    notes: Option<usize>,
}

impl<'a> From<&'a EditRequest> for EditRow<'a> {
    fn from(request: &'a EditRequest) -> Self {
        let row = EditRow {
            source_time: request.source_time,
            op: request.kind.name(),
            ..EditRow::default()
        };
        match &request.kind {
            EditKind::PitchInsert {
                pitch,
                duration,
                velocity,
                category,
            } => EditRow {
                pitch: Some(*pitch),
                duration: Some(*duration),
                velocity: Some(*velocity),
                category: Some(category.name()),
                ..row
            },
            EditKind::PitchDelete { pitch, category } => EditRow {
                pitch: Some(*pitch),
                category: Some(category.name()),
                ..row
            },
            EditKind::ChangeDuration {
                pitch,
                delta,
                category,
            } => EditRow {
                pitch: Some(*pitch),
                delta: Some(*delta),
                category: Some(category.name()),
                ..row
            },
            EditKind::TimeOffset { delta, category } => EditRow {
                delta: Some(*delta),
                category: Some(category.name()),
                ..row
            },
            EditKind::Rollback {
                return_point,
                notes,
            } => EditRow {
                return_point: Some(*return_point),
                notes: Some(notes.len()),
                ..row
            },
            EditKind::Repeat { events } => EditRow {
                events: Some(*events),
                ..row
            },
        }
    }
}

/// Edit requests as CSV, one row per request.
///
/// Columns that do not apply to a request's `op` are left empty; a rollback
/// lists how many notes it replays rather than the notes themselves.
pub fn edits_csv(requests: &[EditRequest]) -> Result<String, MistakeError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record([
        "source_time",
        "op",
        "pitch",
        "duration",
        "velocity",
        "delta",
        "category",
        "return_point",
        "events",
        "notes",
    ])?;
    for request in requests {
        writer.serialize(EditRow::from(request))?;
    }
    into_csv_string(writer)
}
