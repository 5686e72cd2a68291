//! Integration tests for the edit tracker
//!
//! Tests whole edit batches, from a YAML session or a request list, through to
//! the exported MIDI and time map.

use midly::{MidiMessage, Smf, TrackEventKind};
use mistaker::{
    export, run_session, sort_requests, EditKind, EditOutcome, EditRequest, EditTracker, Note,
};

fn etude() -> Vec<Note> {
    // C major arpeggio with a chord on beat three
    vec![
        Note::new(0.0, 0.4, 60, 70).with_id("0"),
        Note::new(0.5, 0.4, 64, 70).with_id("1"),
        Note::new(1.0, 0.9, 67, 70).with_id("2"),
        Note::new(1.01, 0.9, 72, 70).with_id("3"),
        Note::new(2.0, 0.4, 65, 70).with_id("4"),
        Note::new(2.5, 0.4, 62, 70).with_id("5"),
        Note::new(3.0, 0.9, 60, 70).with_id("6"),
    ]
}

fn count_note_ons(bytes: &[u8]) -> usize {
    let smf = Smf::parse(bytes).unwrap();
    smf.tracks
        .iter()
        .flatten()
        .filter(|e| {
            matches!(
                e.kind,
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { .. },
                    ..
                }
            )
        })
        .count()
}

#[test]
fn test_mixed_batch() {
    let mut requests = vec![
        EditRequest::new(2.5, EditKind::Repeat { events: 2 }),
        EditRequest::new(
            1.5,
            EditKind::TimeOffset {
                delta: 0.3,
                category: "drag".into(),
            },
        ),
        EditRequest::new(
            0.5,
            EditKind::PitchDelete {
                pitch: 64,
                category: "wrong_pred".into(),
            },
        ),
        EditRequest::new(
            0.5,
            EditKind::PitchInsert {
                pitch: 65,
                duration: 0.4,
                velocity: 70,
                category: "wrong_pred".into(),
            },
        ),
    ];
    sort_requests(&mut requests);
    assert_eq!(requests[0].kind.name(), "pitch_insert");
    assert_eq!(requests[1].kind.name(), "pitch_delete");

    let mut tracker = EditTracker::new(etude()).unwrap();
    let outcomes = tracker.apply_all(&requests).unwrap();
    assert!(outcomes.iter().all(|o| *o == EditOutcome::Applied));

    // wrong pitch replaced, then two events (4 and 5) repeated
    let target = tracker.target_notes();
    assert_eq!(target.len(), 9);
    assert!(target.iter().all(|n| n.pitch != 64));
    assert_eq!(target.iter().filter(|n| n.id == "4").count(), 2);
    assert_eq!(target.iter().filter(|n| n.id == "5").count(), 2);
    assert!(target.windows(2).all(|w| w[0].onset <= w[1].onset));
    assert!(tracker.time_grid().is_monotonic());

    // notes after the drag are 0.3 later; the last one also waits out the repeat
    let last = target.iter().find(|n| n.id == "6").unwrap();
    let window = tracker.repeats()[0].resume_point - tracker.repeats()[0].return_point;
    assert!((last.onset - (3.0 + 0.3 + window)).abs() < 1e-9);

    // one label per applied edit, plus the shift label of the rollback
    assert_eq!(tracker.labels().len(), 5);
    assert_eq!(tracker.coarse_label_notes().len(), tracker.fine_label_notes().len());

    // the source is untouched
    assert_eq!(tracker.source_notes(), etude().as_slice());
}

#[test]
fn test_exports_match_tracker() {
    let mut tracker = EditTracker::new(etude()).unwrap();
    tracker.pitch_insert(1.5, 71, 0.2, 50, "mistouch").unwrap();
    let repeated = tracker.source_notes()[4..6].to_vec();
    tracker.rollback(2.0, 3.0, &repeated).unwrap();

    let target = export::notes_to_midi(tracker.target_notes()).unwrap();
    assert_eq!(count_note_ons(&target), tracker.target_notes().len());

    let labels = export::labels_to_midi(tracker.labels()).unwrap();
    assert_eq!(count_note_ons(&labels), 2 * tracker.labels().len());

    let time_map = export::time_map_csv(&tracker.time_map()).unwrap();
    assert_eq!(time_map.lines().count(), tracker.time_grid().len() + 1);

    let repeats = export::repeats_csv(tracker.repeats()).unwrap();
    assert_eq!(
        repeats.lines().count(),
        tracker.repeats()[0].from_times.len() + 1
    );
}

#[test]
fn test_session_end_to_end() {
    let yaml = r#"
notes:
  - { onset: 0.0, duration: 0.5, pitch: 60, velocity: 80, id: a }
  - { onset: 1.0, duration: 0.5, pitch: 62, velocity: 80, id: b }
  - { onset: 2.0, duration: 0.5, pitch: 64, velocity: 80, id: c }
  - { onset: 3.0, duration: 0.5, pitch: 65, velocity: 80, id: d }
config:
  coarse-codes:
    drag: 40
annotation:
  - { time: 0.0, label: downbeat }
  - { time: 3.0, label: beat }
edits:
  - source-time: 2.0
    op: change_duration
    pitch: 64
    delta: 0.5
    category: drag
  - source-time: 1.0
    op: time_offset
    delta: 0.25
    category: drag
"#;
    let (tracker, summary) = run_session(yaml).unwrap();
    assert_eq!(summary.applied, 2);

    let c = tracker.target_notes().iter().find(|n| n.id == "c").unwrap();
    assert!((c.onset - 2.25).abs() < 1e-9);
    assert!((c.duration - 1.0).abs() < 1e-9);

    let adjusted = tracker.adjusted_annotation();
    assert_eq!(adjusted[0].time, 0.0);
    assert!((adjusted[1].time - 3.25).abs() < 1e-9);

    assert!(tracker.coarse_label_notes().iter().all(|n| n.pitch == 40));
}

#[test]
fn test_identity_exports_source() {
    let tracker = EditTracker::new(etude()).unwrap();
    let source = export::notes_to_midi(tracker.source_notes()).unwrap();
    let target = export::notes_to_midi(tracker.target_notes()).unwrap();
    assert_eq!(source, target);
    assert!(tracker
        .time_map()
        .iter()
        .all(|row| row.time_from == row.time_to));
}

#[test]
fn test_session_tables() {
    let yaml = r#"
notes:
  - { onset: 0.0, duration: 0.5, pitch: 60, velocity: 80 }
  - { onset: 1.0, duration: 0.5, pitch: 62, velocity: 80 }
  - { onset: 2.0, duration: 0.5, pitch: 64, velocity: 80 }
annotation:
  - { time: 2.0, label: beat }
edits:
  - source-time: 1.0
    op: time_offset
    delta: 0.5
    category: drag
  - source-time: 1.0
    op: pitch_delete
    pitch: 62
    category: wrong_pred
"#;
    let session = mistaker::Session::from_yaml(yaml).unwrap();
    let mut edits = session.edits.clone();
    sort_requests(&mut edits);
    let (tracker, _) = session.run().unwrap();

    let table = export::edits_csv(&edits).unwrap();
    let rows: Vec<&str> = table.lines().skip(1).collect();
    assert_eq!(
        rows,
        vec![
            "1.0,pitch_delete,62,,,,wrong_pred,,,",
            "1.0,time_offset,,,,0.5,drag,,,"
        ]
    );

    let source = export::annotation_csv(tracker.annotation()).unwrap();
    assert_eq!(source, "time,label\n2.0,beat\n");
    let adjusted = export::annotation_csv(&tracker.adjusted_annotation()).unwrap();
    assert_eq!(adjusted, "time,label\n2.5,beat\n");
}
