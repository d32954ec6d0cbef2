use super::*;

#[test]
fn test_default_chunk_fits_wake_window() {
    let chunk = chunk_len_for(DEFAULT_SAMPLE_RATE, DEFAULT_CHUNK_DURATION_MS);
    assert_eq!(chunk, 8000);
    assert!(chunk <= WAKE_WORD_WINDOW_SAMPLES);
}

#[test]
fn test_window_samples_match_formula() {
    assert_eq!(
        WAKE_WORD_WINDOW_SAMPLES,
        (WAKE_WORD_WINDOW_SECS * DEFAULT_SAMPLE_RATE as f32) as usize
    );
}

#[test]
fn test_chunk_len_for_odd_durations() {
    assert_eq!(chunk_len_for(16000, 100), 1600);
    assert_eq!(chunk_len_for(16000, 0), 0);
    assert_eq!(chunk_len_for(8000, 250), 2000);
}

#[test]
fn test_threshold_is_probability() {
    assert!(DEFAULT_WAKE_THRESHOLD > 0.0);
    assert!(DEFAULT_WAKE_THRESHOLD < 1.0);
}

#[test]
fn test_loop_pacing_ordering() {
    // Wake word must be polled more often than the camera
    assert!(WAKE_LOOP_INTERVAL_MS < VISION_LOOP_INTERVAL_MS);
    // Cooldown should outlast several wake iterations
    assert!(DEFAULT_COOLDOWN_MS > WAKE_LOOP_INTERVAL_MS);
}

#[test]
fn test_model_input_smaller_than_capture() {
    assert!(EMOTION_MODEL_INPUT_SIZE <= CAPTURE_WIDTH);
    assert!(EMOTION_MODEL_INPUT_SIZE <= CAPTURE_HEIGHT);
}

#[test]
fn test_reaction_template_has_placeholder() {
    assert!(DEFAULT_REACTION_TEMPLATE.contains("{emotion}"));
}
