//! CLI Module
//!
//! Command-line interface for driving the editor core on generated tones.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::EditOp;

/// Wavedit - sample-accurate waveform editing core
#[derive(Parser, Debug)]
#[command(name = "wavedit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Editor config file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Test tone parameters shared by every command
#[derive(clap::Args, Debug, Clone)]
pub struct ToneArgs {
    /// Tone frequency in Hz
    #[arg(long, default_value_t = 440.0)]
    pub frequency: f32,

    /// Tone length in seconds
    #[arg(long, default_value_t = 10.0)]
    pub duration: f64,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 44_100)]
    pub sample_rate: u32,

    /// Generate a stereo tone (right channel an octave up)
    #[arg(long)]
    pub stereo: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the min/max peak summary of a tone as JSON
    #[command(name = "peaks")]
    Peaks {
        #[command(flatten)]
        tone: ToneArgs,

        /// Number of display columns
        #[arg(short, long, default_value_t = 64)]
        width: usize,
    },

    /// Run an edit session and print every editor event as a JSON line
    ///
    /// Operations: select:START:END, clear, seek:T, cut, copy, paste,
    /// delete, undo, redo
    #[command(name = "edit")]
    Edit {
        #[command(flatten)]
        tone: ToneArgs,

        /// Operations applied in order
        #[arg(short, long = "op", required = true)]
        ops: Vec<EditOp>,
    },

    /// Simulate playback against a manual clock and print the final snapshot
    #[command(name = "play")]
    Play {
        #[command(flatten)]
        tone: ToneArgs,

        /// Start position in seconds
        #[arg(long, default_value_t = 0.0)]
        seek: f64,

        /// Engine time elapsed after starting, in seconds
        #[arg(long, default_value_t = 1.0)]
        elapsed: f64,

        /// Selection as START:END
        #[arg(long)]
        selection: Option<String>,

        /// Restrict playback to the selection
        #[arg(long)]
        selection_only: bool,

        /// Loop playback
        #[arg(long = "loop")]
        loop_playback: bool,
    },
}
