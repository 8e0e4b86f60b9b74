use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use log::{debug, warn};

use crate::audio::pcm::decode_base64_pcm16;
use crate::audio::{AudioOutput, Clock, RenderEvent, SpeechSynthesizer};
use crate::error::PlaybackError;
use crate::logging::{OperationTimer, ReaderLogger};
use crate::models::{AudioBuffer, PlaybackState, PlaybackStatus};

/// Playback bookkeeping for one text passage.
///
/// `render_start` is clock seconds minus the offset the active render began at,
/// so `now - render_start` is the playback position whether the render started
/// fresh or resumed.
#[derive(Debug, Default)]
pub struct PlaybackSession {
    source_text: String,
    decoded_audio: Option<Arc<AudioBuffer>>,
    playback_offset: Duration,
    state: PlaybackState,
    render_start: f64,
    /// Bumped on every render start, stop and reset; completions carrying an older id are stale
    render_id: u64,
    /// Bumped on reset; synthesis results issued under an older id are discarded
    session_id: u64,
}

impl PlaybackSession {
    pub fn new(source_text: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            ..Self::default()
        }
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Saved position, meaningful while paused
    pub fn playback_offset(&self) -> Duration {
        self.playback_offset
    }

    pub fn has_audio(&self) -> bool {
        self.decoded_audio.is_some()
    }

    fn audio_duration(&self) -> Option<Duration> {
        self.decoded_audio.as_ref().map(|buffer| buffer.duration())
    }

    fn position_at(&self, now: f64) -> Duration {
        match self.state {
            PlaybackState::Playing => {
                let elapsed = Duration::from_secs_f64((now - self.render_start).max(0.0));
                match self.audio_duration() {
                    Some(duration) => elapsed.min(duration),
                    None => elapsed,
                }
            }
            PlaybackState::Paused => self.playback_offset,
            PlaybackState::Idle | PlaybackState::Loading => Duration::ZERO,
        }
    }
}

/// Speech playback state machine.
///
/// Cloning yields another handle to the same session, so `toggle` can run on a
/// spawned task while the caller keeps issuing commands. All mutation goes
/// through `toggle`, `reset_for_new_text`, `stop` and the render callbacks.
#[derive(Clone)]
pub struct PlaybackEngine {
    session: Arc<Mutex<PlaybackSession>>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    output: Arc<dyn AudioOutput>,
    clock: Arc<dyn Clock>,
    sample_rate: u32,
    volume: Arc<AtomicU32>,
    logger: ReaderLogger,
}

impl PlaybackEngine {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        output: Arc<dyn AudioOutput>,
        clock: Arc<dyn Clock>,
        sample_rate: u32,
        logger: ReaderLogger,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(PlaybackSession::default())),
            synthesizer,
            output,
            clock,
            sample_rate,
            volume: Arc::new(AtomicU32::new(1.0f32.to_bits())),
            logger,
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, PlaybackSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now(&self) -> f64 {
        self.clock.now().as_secs_f64()
    }

    pub fn state(&self) -> PlaybackState {
        self.lock_session().state
    }

    pub fn source_text(&self) -> String {
        self.lock_session().source_text.clone()
    }

    pub fn has_audio(&self) -> bool {
        self.lock_session().has_audio()
    }

    pub fn playback_offset(&self) -> Duration {
        self.lock_session().playback_offset
    }

    /// Current position within the decoded audio
    pub fn position(&self) -> Duration {
        let now = self.now();
        self.lock_session().position_at(now)
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    pub fn status(&self) -> PlaybackStatus {
        let now = self.now();
        let session = self.lock_session();
        PlaybackStatus {
            state: session.state,
            position: session.position_at(now),
            duration: session.audio_duration(),
            has_audio: session.has_audio(),
            volume: self.volume(),
        }
    }

    /// The single user-facing control: play, pause or resume depending on state.
    ///
    /// Returns the state the session is in once this call is done with it. While
    /// a synthesis request is outstanding every other call is a no-op that
    /// returns `Loading`.
    pub async fn toggle(&self) -> Result<PlaybackState, PlaybackError> {
        let (request_session, text) = {
            let mut session = self.lock_session();
            match session.state {
                PlaybackState::Loading => {
                    debug!("Toggle ignored while speech is being generated");
                    return Ok(PlaybackState::Loading);
                }
                PlaybackState::Playing => {
                    self.pause_locked(&mut session);
                    return Ok(PlaybackState::Paused);
                }
                PlaybackState::Idle | PlaybackState::Paused => {
                    if let Some(buffer) = session.decoded_audio.clone() {
                        let offset = session.playback_offset;
                        self.start_render_locked(&mut session, buffer, offset)?;
                        return Ok(PlaybackState::Playing);
                    }
                    if session.source_text.trim().is_empty() {
                        return Err(PlaybackError::NothingToPlay);
                    }
                    session.state = PlaybackState::Loading;
                    (session.session_id, session.source_text.clone())
                }
            }
        };

        self.logger.log_synthesis_requested(text.chars().count());
        let timer = OperationTimer::new("speech synthesis");
        let outcome = match self.synthesizer.synthesize(&text).await {
            Ok(payload) => decode_base64_pcm16(&payload, self.sample_rate)
                .map_err(|e| PlaybackError::SynthesisFailure(format!("undecodable audio: {}", e))),
            Err(e) => Err(e),
        };
        let elapsed = timer.finish();

        let mut session = self.lock_session();
        if session.session_id != request_session || session.state != PlaybackState::Loading {
            self.logger.log_stale_event(format!(
                "Discarded speech generated for a replaced passage (session {} now {})",
                request_session, session.session_id
            ));
            return Ok(session.state);
        }

        let buffer = match outcome {
            Ok(buffer) if !buffer.is_empty() => Arc::new(buffer),
            Ok(_) => {
                return Err(self.fail_loading(
                    &mut session,
                    PlaybackError::SynthesisFailure("synthesized audio is empty".to_string()),
                ));
            }
            Err(e) => return Err(self.fail_loading(&mut session, e)),
        };
        self.logger.log_synthesis_completed(buffer.duration(), elapsed);

        if let Err(e) = self.start_render_locked(&mut session, Arc::clone(&buffer), Duration::ZERO) {
            return Err(self.fail_loading(&mut session, e));
        }
        session.decoded_audio = Some(buffer);
        Ok(PlaybackState::Playing)
    }

    /// Switch the session to another passage. Identical text is a no-op.
    ///
    /// Returns whether anything was reset.
    pub fn reset_for_new_text(&self, new_text: &str) -> bool {
        let mut session = self.lock_session();
        if session.source_text == new_text {
            return false;
        }

        if session.state == PlaybackState::Playing {
            if let Err(e) = self.output.stop() {
                warn!("Failed to stop render while switching passages: {}", e);
            }
        }

        session.source_text = new_text.to_string();
        session.decoded_audio = None;
        session.playback_offset = Duration::ZERO;
        session.state = PlaybackState::Idle;
        session.session_id += 1;
        session.render_id += 1;

        self.logger.log_playback_reset(&format!(
            "Session {} now holds {} characters",
            session.session_id,
            new_text.chars().count()
        ));
        true
    }

    /// Stop playback and rewind, keeping any decoded audio
    pub fn stop(&self) -> Result<(), PlaybackError> {
        let mut session = self.lock_session();
        match session.state {
            PlaybackState::Playing => {
                if let Err(e) = self.output.stop() {
                    warn!("Failed to stop render: {}", e);
                }
            }
            // Abandon the outstanding request; its result will be discarded
            PlaybackState::Loading => session.session_id += 1,
            PlaybackState::Idle | PlaybackState::Paused => {}
        }
        session.state = PlaybackState::Idle;
        session.playback_offset = Duration::ZERO;
        session.render_id += 1;
        Ok(())
    }

    /// Natural end of a render. Ignored unless it is the active, still-playing render.
    pub fn on_render_finished(&self, render_id: u64) -> bool {
        let mut session = self.lock_session();
        if session.state != PlaybackState::Playing || session.render_id != render_id {
            self.logger.log_stale_event(format!(
                "Ignored completion of render {} (active render {}, {})",
                render_id,
                session.render_id,
                session.state.as_str()
            ));
            return false;
        }

        session.state = PlaybackState::Idle;
        session.playback_offset = Duration::ZERO;
        // Release the stream now instead of letting it write silence until the next start
        if let Err(e) = self.output.stop() {
            debug!("Stopping finished render {}: {}", render_id, e);
        }
        self.logger.log_playback_finished(render_id);
        true
    }

    /// Apply an event reported by the output. Returns whether it changed the session.
    pub fn handle_render_event(&self, event: &RenderEvent) -> bool {
        match event {
            RenderEvent::Finished { render_id } => self.on_render_finished(*render_id),
            RenderEvent::StreamError { render_id, message } => {
                let now = self.now();
                let mut session = self.lock_session();
                if session.state != PlaybackState::Playing || session.render_id != *render_id {
                    self.logger.log_stale_event(format!("Ignored stream error of render {}", render_id));
                    return false;
                }
                warn!("Audio stream failed during render {}: {}", render_id, message);
                if let Err(e) = self.output.stop() {
                    debug!("Stopping failed stream: {}", e);
                }
                session.playback_offset = session.position_at(now);
                session.state = PlaybackState::Paused;
                self.logger.log_playback_paused(session.playback_offset);
                true
            }
        }
    }

    /// Set the output volume (0.0 to 1.0)
    pub fn set_volume(&self, volume: f32) -> Result<(), PlaybackError> {
        let volume = volume.clamp(0.0, 1.0);
        self.output.set_volume(volume)?;
        self.volume.store(volume.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    // The offset is saved even when the output refuses to stop
    fn pause_locked(&self, session: &mut PlaybackSession) {
        session.playback_offset = session.position_at(self.now());
        session.state = PlaybackState::Paused;
        if let Err(e) = self.output.stop() {
            warn!("Failed to stop render while pausing: {}", e);
        }
        self.logger.log_playback_paused(session.playback_offset);
    }

    fn start_render_locked(
        &self,
        session: &mut PlaybackSession,
        buffer: Arc<AudioBuffer>,
        offset: Duration,
    ) -> Result<(), PlaybackError> {
        let render_id = session.render_id + 1;
        self.output.start(buffer, offset, render_id)?;

        session.render_id = render_id;
        session.render_start = self.now() - offset.as_secs_f64();
        session.state = PlaybackState::Playing;
        self.logger.log_playback_started(offset, render_id);
        Ok(())
    }

    fn fail_loading(&self, session: &mut PlaybackSession, error: PlaybackError) -> PlaybackError {
        session.state = PlaybackState::Idle;
        session.decoded_audio = None;
        session.playback_offset = Duration::ZERO;
        self.logger.log_synthesis_failed(&error.to_string());
        error
    }
}
