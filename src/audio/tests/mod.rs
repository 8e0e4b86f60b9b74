//! Scripted collaborators for driving `PlaybackEngine` without a network or a sound card.


use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tokio::sync::Notify;

use crate::audio::{AudioOutput, ManualClock, PlaybackEngine, SpeechSynthesizer, SPEECH_SAMPLE_RATE};
use crate::error::{AudioError, PlaybackError};
use crate::logging::ReaderLogger;
use crate::models::AudioBuffer;

/// Base64 PCM16 payload of `seconds` of a quiet constant tone at the speech rate
pub fn speech_payload(seconds: f64) -> String {
    let frames = (seconds * SPEECH_SAMPLE_RATE as f64).round() as usize;
    let bytes: Vec<u8> = std::iter::repeat(1200i16.to_le_bytes()).take(frames).flatten().collect();
    STANDARD.encode(bytes)
}

/// Answers synthesis requests from a queue of canned responses
pub struct ScriptedSynthesizer {
    responses: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedSynthesizer {
    pub fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requested_texts(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<String, PlaybackError> {
        self.requests.lock().unwrap().push(text.to_string());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(payload)) => Ok(payload),
            Some(Err(message)) => Err(PlaybackError::SynthesisFailure(message)),
            None => Err(PlaybackError::SynthesisFailure("no scripted response".to_string())),
        }
    }
}

/// Holds every request open until the test releases it
pub struct GatedSynthesizer {
    pub entered: Notify,
    pub release: Notify,
    payload: String,
    calls: AtomicUsize,
}

impl GatedSynthesizer {
    pub fn new(payload: String) -> Self {
        Self {
            entered: Notify::new(),
            release: Notify::new(),
            payload,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for GatedSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<String, PlaybackError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.payload.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStart {
    pub offset: Duration,
    pub render_id: u64,
    pub frames: usize,
}

/// Output that records what it was asked to render
#[derive(Default)]
pub struct RecordingOutput {
    starts: Mutex<Vec<RecordedStart>>,
    stops: AtomicUsize,
    fail_starts: AtomicBool,
    fail_stops: AtomicBool,
    volume: Mutex<Option<f32>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starts(&self) -> Vec<RecordedStart> {
        self.starts.lock().unwrap().clone()
    }

    pub fn last_render_id(&self) -> u64 {
        self.starts().last().map(|start| start.render_id).unwrap_or(0)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn fail_starts(&self, fail: bool) {
        self.fail_starts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_stops(&self, fail: bool) {
        self.fail_stops.store(fail, Ordering::SeqCst);
    }

    pub fn volume(&self) -> Option<f32> {
        *self.volume.lock().unwrap()
    }
}

impl AudioOutput for RecordingOutput {
    fn start(&self, buffer: Arc<AudioBuffer>, offset: Duration, render_id: u64) -> Result<(), AudioError> {
        if self.fail_starts.load(Ordering::SeqCst) {
            return Err(AudioError::StreamError("device unplugged".to_string()));
        }
        self.starts.lock().unwrap().push(RecordedStart {
            offset,
            render_id,
            frames: buffer.frames(),
        });
        Ok(())
    }

    fn stop(&self) -> Result<(), AudioError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.fail_stops.load(Ordering::SeqCst) {
            return Err(AudioError::StreamError("device busy".to_string()));
        }
        Ok(())
    }

    fn set_volume(&self, volume: f32) -> Result<(), AudioError> {
        *self.volume.lock().unwrap() = Some(volume);
        Ok(())
    }
}

pub struct Harness<S> {
    pub engine: PlaybackEngine,
    pub synthesizer: Arc<S>,
    pub output: Arc<RecordingOutput>,
    pub clock: Arc<ManualClock>,
    pub logger: ReaderLogger,
}

pub fn harness<S: SpeechSynthesizer + 'static>(synthesizer: S) -> Harness<S> {
    let synthesizer = Arc::new(synthesizer);
    let output = Arc::new(RecordingOutput::new());
    let clock = Arc::new(ManualClock::new());
    let logger = ReaderLogger::new();
    let engine = PlaybackEngine::new(
        synthesizer.clone(),
        output.clone(),
        clock.clone(),
        SPEECH_SAMPLE_RATE,
        logger.clone(),
    );
    Harness { engine, synthesizer, output, clock, logger }
}

pub fn assert_close(actual: Duration, expected: Duration) {
    let diff = (actual.as_secs_f64() - expected.as_secs_f64()).abs();
    assert!(diff < 1e-3, "expected ~{:?}, got {:?}", expected, actual);
}
