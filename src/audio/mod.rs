pub mod clock;
pub mod device;
pub mod engine;
pub mod output;
pub mod pcm;
pub mod resampler;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use crate::error::{AudioError, PlaybackError};

pub use crate::models::{AudioBuffer, PlaybackState, PlaybackStatus};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use device::DeviceManager;
pub use engine::PlaybackEngine;
pub use output::{CpalOutput, DisconnectedOutput};
pub use pcm::{decode_base64_pcm16, pcm16_le_to_f32, SPEECH_SAMPLE_RATE};
pub use resampler::LinearResampler;

/// Turns text into an encoded speech payload (base64 PCM16LE mono)
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<String, PlaybackError>;
}

/// Something that can render a decoded buffer from an offset
pub trait AudioOutput: Send + Sync {
    /// Begin rendering `buffer` at `offset`, replacing any active render.
    /// Natural completion is reported as `RenderEvent::Finished { render_id }`.
    fn start(&self, buffer: Arc<AudioBuffer>, offset: Duration, render_id: u64) -> Result<(), AudioError>;

    /// Stop the active render. Must not report it as finished.
    fn stop(&self) -> Result<(), AudioError>;

    /// Set the output volume (0.0 to 1.0)
    fn set_volume(&self, volume: f32) -> Result<(), AudioError>;
}

/// Notifications from the output back to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Finished { render_id: u64 },
    StreamError { render_id: u64, message: String },
}
