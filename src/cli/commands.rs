//! CLI Command Implementations
//!
//! Each command builds an editor around a generated tone, since decoding is
//! left to external collaborators.

use std::str::FromStr;

use log::{info, warn};

use crate::cli::ToneArgs;
use crate::config::EditorConfig;
use crate::editor::{EditorController, EditorEvent};
use crate::engine::{
    compute_peaks, generate_stereo_test_tone, generate_test_tone, ManualClock, NullOutput,
    SampleBuffer,
};
use crate::error::{Result, WaveditError};

/// One step of an `edit` session
#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    Select(f64, f64),
    Clear,
    Seek(f64),
    Cut,
    Copy,
    Paste,
    Delete,
    Undo,
    Redo,
}

impl FromStr for EditOp {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();
        let number = |text: &str| {
            text.parse::<f64>()
                .map_err(|_| format!("'{}' is not a number in '{}'", text, s))
        };

        match (name, args.as_slice()) {
            ("select", [start, end]) => Ok(EditOp::Select(number(*start)?, number(*end)?)),
            ("clear", []) => Ok(EditOp::Clear),
            ("seek", [t]) => Ok(EditOp::Seek(number(*t)?)),
            ("cut", []) => Ok(EditOp::Cut),
            ("copy", []) => Ok(EditOp::Copy),
            ("paste", []) => Ok(EditOp::Paste),
            ("delete", []) => Ok(EditOp::Delete),
            ("undo", []) => Ok(EditOp::Undo),
            ("redo", []) => Ok(EditOp::Redo),
            _ => Err(format!("unknown edit operation '{}'", s)),
        }
    }
}

impl EditOp {
    /// Apply to the controller; returns false if the command was rejected
    pub fn apply(&self, editor: &mut EditorController) -> bool {
        match *self {
            EditOp::Select(start, end) => editor.set_selection(Some(start), Some(end)),
            EditOp::Clear => editor.clear_selection(),
            EditOp::Seek(t) => editor.seek(t),
            EditOp::Cut => editor.cut(),
            EditOp::Copy => editor.copy(),
            EditOp::Paste => editor.paste(),
            EditOp::Delete => editor.delete_selection(),
            EditOp::Undo => editor.undo(),
            EditOp::Redo => editor.redo(),
        }
    }
}

/// Parse a `START:END` range in seconds
pub fn parse_range(text: &str) -> Result<(f64, f64)> {
    let invalid = || WaveditError::InvalidRange {
        reason: format!("expected START:END, got '{}'", text),
    };
    let (start, end) = text.split_once(':').ok_or_else(invalid)?;
    let start = start.trim().parse::<f64>().map_err(|_| invalid())?;
    let end = end.trim().parse::<f64>().map_err(|_| invalid())?;
    Ok((start, end))
}

fn build_tone(tone: &ToneArgs) -> Result<SampleBuffer> {
    if tone.stereo {
        generate_stereo_test_tone(
            tone.frequency,
            tone.frequency * 2.0,
            tone.duration,
            tone.sample_rate,
        )
    } else {
        generate_test_tone(tone.frequency, tone.duration, tone.sample_rate)
    }
}

fn new_editor(config: &EditorConfig, clock: &ManualClock) -> EditorController {
    EditorController::new(
        config.clone(),
        Box::new(clock.clone()),
        Box::new(NullOutput),
    )
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the peak summary of a generated tone
pub fn peaks(tone: &ToneArgs, width: usize) -> Result<()> {
    let buffer = build_tone(tone)?;
    info!(
        "Computing {} peak columns over {} frames",
        width,
        buffer.frame_count()
    );
    print_json(&compute_peaks(&buffer, width))
}

/// Run an edit session, streaming events as JSON lines
pub fn edit(config: &EditorConfig, tone: &ToneArgs, ops: &[EditOp]) -> Result<()> {
    let clock = ManualClock::new();
    let mut editor = new_editor(config, &clock);
    editor.subscribe(|event: &EditorEvent| match serde_json::to_string(event) {
        Ok(line) => println!("{}", line),
        Err(err) => warn!("Could not serialize event: {}", err),
    });

    editor.load_buffer("tone", build_tone(tone)?);
    for op in ops {
        if !op.apply(&mut editor) {
            warn!("{:?} had no effect", op);
        }
    }

    let history = editor.history().undo_summary();
    info!("{} undoable edit(s)", history.len());
    print_json(&editor.snapshot())?;
    print_json(&history)
}

/// Simulate playback and print the resulting snapshot
pub fn play(
    config: &EditorConfig,
    tone: &ToneArgs,
    seek: f64,
    elapsed: f64,
    selection: Option<(f64, f64)>,
    selection_only: bool,
    loop_playback: bool,
) -> Result<()> {
    let clock = ManualClock::new();
    let mut editor = new_editor(config, &clock);
    editor.load_buffer("tone", build_tone(tone)?);

    if let Some((start, end)) = selection {
        editor.set_selection(Some(start), Some(end));
    }
    editor.set_play_selection_only(selection_only);
    editor.set_loop_playback(loop_playback);
    editor.seek(seek);
    if !editor.play() {
        return Err(WaveditError::NoBufferLoaded);
    }

    clock.advance(elapsed);
    let position = editor.poll_position();
    info!("Position after {:.3}s: {:.3}s", elapsed, position);
    print_json(&editor.snapshot())
}
