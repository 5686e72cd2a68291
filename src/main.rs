use std::env;
use std::fs;
use std::path::Path;
use std::process;

use log::{info, LevelFilter};
use mistaker::{export, sort_requests, EditRequest, EditTracker, MistakeError, Session};

/// Logging is controlled with RUST_LOG; if it is not set, the level is Info.
fn init_logging() {
    let mut log_builder = env_logger::builder();
    if env::var("RUST_LOG").is_err() {
        log_builder.filter_level(LevelFilter::Info);
    }
    log_builder.init();
}

fn write_outputs(
    tracker: &EditTracker,
    edits: &[EditRequest],
    out_dir: &Path,
) -> Result<(), MistakeError> {
    fs::create_dir_all(out_dir)?;

    fs::write(out_dir.join("target.mid"), export::notes_to_midi(tracker.target_notes())?)?;
    fs::write(out_dir.join("source.mid"), export::notes_to_midi(tracker.source_notes())?)?;
    fs::write(out_dir.join("labels.mid"), export::labels_to_midi(tracker.labels())?)?;
    fs::write(out_dir.join("time_map.csv"), export::time_map_csv(&tracker.time_map())?)?;
    fs::write(out_dir.join("repeats.csv"), export::repeats_csv(tracker.repeats())?)?;
    fs::write(out_dir.join("edits.csv"), export::edits_csv(edits)?)?;

    let labels = serde_json::to_string_pretty(tracker.labels())
        .map_err(|e| MistakeError::Io(e.into()))?;
    fs::write(out_dir.join("labels.json"), labels)?;

    if !tracker.annotation().is_empty() {
        let source = export::annotation_csv(tracker.annotation())?;
        fs::write(out_dir.join("source_annotation.csv"), source)?;
        let adjusted = export::annotation_csv(&tracker.adjusted_annotation())?;
        fs::write(out_dir.join("annotation.csv"), adjusted)?;
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: mistaker <session.yaml> <output-dir>");
        process::exit(1);
    }
    init_logging();

    let input_path = &args[1];
    let out_dir = Path::new(&args[2]);

    let session = match Session::load(input_path) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error reading session '{}': {}", input_path, e);
            process::exit(1);
        }
    };

    let mut edits = session.edits.clone();
    sort_requests(&mut edits);

    let (tracker, summary) = match session.run() {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_outputs(&tracker, &edits, out_dir) {
        eprintln!("Error writing to '{}': {}", out_dir.display(), e);
        process::exit(1);
    }
    info!(
        "wrote {} target notes and {} labels to {} ({} lookup misses, {} skipped)",
        tracker.target_notes().len(),
        tracker.labels().len(),
        out_dir.display(),
        summary.missed,
        summary.skipped
    );
}
