//! Wavedit - Sample-Accurate Waveform Editing Core
//!
//! Load, play and edit sampled audio without a UI or audio device attached.
//!
//! # Architecture
//!
//! - `engine`: sample buffers, pure cut/copy/paste/delete, peak decimation
//!   and the playback scheduler
//! - `state`: bounded undo/redo history
//! - `editor`: the controller that owns editor state and notifies observers
//!
//! Decoding, capture and audio output are collaborators supplied through
//! traits ([`editor::Decoder`], [`editor::CaptureDevice`],
//! [`engine::OutputDevice`], [`engine::EngineClock`]).

pub mod cli;
pub mod config;
pub mod editor;
pub mod engine;
pub mod error;
pub mod state;

pub use config::EditorConfig;
pub use editor::{EditorController, EditorEvent, EditorSnapshot};
pub use error::{Result, WaveditError};
