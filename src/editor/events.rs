//! Editor notifications and observer registration

use std::sync::Arc;

use serde::Serialize;

use crate::editor::snapshot::EditorSnapshot;
use crate::engine::PeakSummary;

/// Notification emitted by the controller
///
/// `StateChanged` carries the full snapshot after every committed change;
/// the other variants mark discrete transitions and are emitted at most once
/// per transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum EditorEvent {
    AudioLoaded { file_name: String, duration: f64 },
    PlayStateChanged { is_playing: bool },
    SelectionChanged {
        start: Option<f64>,
        end: Option<f64>,
    },
    PositionChanged { position: f64 },
    RecordingStateChanged { is_recording: bool },
    Error { message: String },
    StateChanged(EditorSnapshot),
    PeaksChanged(Arc<PeakSummary>),
}

/// Receives editor notifications in command order
pub trait EditorObserver {
    fn on_event(&mut self, event: &EditorEvent);
}

impl<F> EditorObserver for F
where
    F: FnMut(&EditorEvent),
{
    fn on_event(&mut self, event: &EditorEvent) {
        self(event)
    }
}

/// Handle returned by [`ObserverRegistry::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Ordered set of observers
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    observers: Vec<(ObserverId, Box<dyn EditorObserver>)>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<O>(&mut self, observer: O) -> ObserverId
    where
        O: EditorObserver + 'static,
    {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer; returns false if it was not registered
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    pub fn clear(&mut self) {
        self.observers.clear();
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver `event` to every observer in registration order
    pub fn emit(&mut self, event: &EditorEvent) {
        for (_, observer) in self.observers.iter_mut() {
            observer.on_event(event);
        }
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_emit_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ObserverRegistry::new();

        let first = Rc::clone(&seen);
        registry.subscribe(move |_: &EditorEvent| first.borrow_mut().push(1));
        let second = Rc::clone(&seen);
        registry.subscribe(move |_: &EditorEvent| second.borrow_mut().push(2));

        registry.emit(&EditorEvent::PlayStateChanged { is_playing: true });
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut registry = ObserverRegistry::new();
        let counter = Rc::clone(&count);
        let id = registry.subscribe(move |_: &EditorEvent| *counter.borrow_mut() += 1);

        registry.emit(&EditorEvent::PositionChanged { position: 1.0 });
        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        registry.emit(&EditorEvent::PositionChanged { position: 2.0 });

        assert_eq!(*count.borrow(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_event_json_shape() {
        let event = EditorEvent::AudioLoaded {
            file_name: "a.wav".to_string(),
            duration: 3.0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "audioloaded");
        assert_eq!(json["fileName"], "a.wav");
        assert_eq!(json["duration"], 3.0);
        assert!(json.get("file_name").is_none());

        let event = EditorEvent::PlayStateChanged { is_playing: true };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["isPlaying"], true);

        let event = EditorEvent::RecordingStateChanged {
            is_recording: false,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["isRecording"], false);

        let json = serde_json::to_value(EditorEvent::Error {
            message: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "error");
    }
}
