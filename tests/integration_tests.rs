//! Integration Tests
//!
//! End-to-end properties of editing, playback and peak decimation through
//! the public API.

use approx::assert_relative_eq;
use pretty_assertions::assert_eq;

use wavedit::editor::EditorController;
use wavedit::engine::edit::{copy, cut, delete, paste, selection_frames};
use wavedit::engine::{
    compute_peaks, frame_to_time, generate_stereo_test_tone, ManualClock, NullOutput,
    PlaybackPolicy, PlaybackScheduler, SampleBuffer, SelectionRange,
};
use wavedit::EditorConfig;

/// 100 frames at 10 Hz with a distinct value per frame
fn ramp_buffer() -> SampleBuffer {
    let left: Vec<f32> = (0..100).map(|i| i as f32).collect();
    let right: Vec<f32> = (0..100).map(|i| -(i as f32)).collect();
    SampleBuffer::new(10, vec![left, right]).unwrap()
}

fn editor_with_clock() -> (EditorController, ManualClock) {
    let clock = ManualClock::new();
    let editor = EditorController::new(
        EditorConfig::default(),
        Box::new(clock.clone()),
        Box::new(NullOutput),
    );
    (editor, clock)
}

// === Editing Properties ===

#[test]
fn test_delete_copy_paste_round_trip() {
    let buffer = generate_stereo_test_tone(440.0, 660.0, 2.0, 44_100).unwrap();
    for &(start, end) in &[(0.0, 0.5), (0.25, 1.75), (1.999, 2.0), (0.000_01, 1.333_33)] {
        let selection = SelectionRange::new(start, end);
        let range = selection_frames(&buffer, &selection).unwrap();
        let removed = delete(&buffer, &selection).unwrap();
        let clip = copy(&buffer, &selection).unwrap();
        let restored = paste(&removed, &clip, frame_to_time(range.start, 44_100)).unwrap();
        assert!(restored == buffer, "round trip failed for {:?}", selection);
    }
}

#[test]
fn test_length_laws() {
    let buffer = ramp_buffer();
    let selection = SelectionRange::new(1.25, 6.5);
    let range = selection_frames(&buffer, &selection).unwrap();

    let removed = delete(&buffer, &selection).unwrap();
    assert_eq!(removed.frame_count(), buffer.frame_count() - range.len());

    let clip = copy(&buffer, &selection).unwrap();
    let pasted = paste(&buffer, &clip, 9.0).unwrap();
    assert_eq!(
        pasted.frame_count(),
        buffer.frame_count() + clip.frame_count()
    );
}

#[test]
fn test_cut_and_paste_back_restores_original() {
    let buffer = ramp_buffer();
    let (remainder, extracted) = cut(&buffer, &SelectionRange::new(3.0, 5.0)).unwrap();
    assert_eq!(remainder.frame_count(), 80);
    assert_eq!(extracted.frame_count(), 20);

    let restored = paste(&remainder, &extracted, 3.0).unwrap();
    assert!(restored == buffer);
}

#[test]
fn test_selection_normalization() {
    let (mut editor, _clock) = editor_with_clock();
    editor.load_buffer("ramp", ramp_buffer());
    assert!(editor.set_selection(Some(5.0), Some(2.0)));
    assert_eq!(editor.snapshot().selection, SelectionRange::new(2.0, 5.0));
}

// === Peak Properties ===

#[test]
fn test_peak_shape_and_silence() {
    let silence = SampleBuffer::silence(2, 48_000, 48_000).unwrap();
    for width in [1, 7, 640, 48_000, 100_000] {
        let peaks = compute_peaks(&silence, width);
        assert_eq!(peaks.num_channels(), 2);
        for ch in 0..2 {
            assert_eq!(peaks.channel(ch).len(), 2 * width);
            assert!(peaks.pairs(ch).all(|pair| pair == (0.0, 0.0)));
        }
    }
}

#[test]
fn test_peaks_bound_every_sample() {
    let tone = generate_stereo_test_tone(100.0, 250.0, 0.5, 8_000).unwrap();
    let width = 37;
    let peaks = compute_peaks(&tone, width);
    let per_column = tone.frame_count() / width;

    for ch in 0..2 {
        for (column, (min, max)) in peaks.pairs(ch).enumerate() {
            let start = column * per_column;
            let end = if column + 1 == width {
                tone.frame_count()
            } else {
                start + per_column
            };
            for &sample in &tone.channel(ch)[start..end] {
                assert!(min <= sample && sample <= max);
            }
        }
    }
}

// === Playback Scenarios ===

#[test]
fn test_scenario_seek_and_play() {
    let (mut editor, clock) = editor_with_clock();
    editor.load_buffer("ten", SampleBuffer::silence(1, 100, 10).unwrap());

    assert!(editor.seek(4.0));
    assert!(editor.play());
    clock.advance(1.5);

    let snapshot = editor.snapshot();
    assert!(snapshot.is_playing);
    assert_relative_eq!(snapshot.current_position, 5.5, epsilon = 1e-9);
}

#[test]
fn test_scenario_selection_loop() {
    let (mut editor, clock) = editor_with_clock();
    editor.load_buffer("ten", SampleBuffer::silence(1, 100, 10).unwrap());

    editor.set_selection(Some(2.0), Some(4.0));
    editor.set_play_selection_only(true);
    editor.set_loop_playback(true);
    assert!(editor.play());
    clock.advance(3.0);

    assert_relative_eq!(editor.poll_position(), 3.0, epsilon = 1e-9);
    assert!(editor.snapshot().is_playing);
}

#[test]
fn test_scenario_cut_then_paste_back() {
    let (mut editor, _clock) = editor_with_clock();
    let original = ramp_buffer();
    editor.load_buffer("ramp", original.clone());

    editor.set_selection(Some(3.0), Some(5.0));
    assert!(editor.cut());
    assert_eq!(editor.state().buffer.as_ref().unwrap().frame_count(), 80);
    assert_eq!(editor.clipboard().unwrap().frame_count(), 20);

    assert!(editor.seek(3.0));
    assert!(editor.paste());
    let restored = editor.state().buffer.clone().unwrap();
    assert!(restored == original);
}

#[test]
fn test_loop_wrap_never_exceeds_loop_end() {
    let clock = ManualClock::new();
    let mut scheduler = PlaybackScheduler::new(Box::new(clock.clone()), Box::new(NullOutput));
    scheduler.replace_buffer(Some(SampleBuffer::silence(1, 100, 10).unwrap()), 0.0);
    scheduler.set_policy(PlaybackPolicy {
        loop_playback: true,
        play_selection_only: true,
        selection: SelectionRange::new(2.5, 3.5),
    });
    scheduler.play().unwrap();

    for _ in 0..1_000 {
        clock.advance(0.013);
        let position = scheduler.position();
        assert!(
            (2.5..3.5).contains(&position),
            "position {} escaped loop",
            position
        );
    }
}
