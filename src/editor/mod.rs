//! Editor Module
//!
//! Orchestrates buffers, playback and peaks against the editor state and
//! publishes snapshots and events to observers.

pub mod controller;
pub mod events;
pub mod snapshot;
pub mod source;

pub use controller::{EditorController, RECORDING_NAME};
pub use events::{EditorEvent, EditorObserver, ObserverId, ObserverRegistry};
pub use snapshot::{EditorSnapshot, EditorState};
pub use source::{AudioSource, CaptureDevice, Decoder, LoadTicket};
