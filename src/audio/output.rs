use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use cpal::{SampleFormat, Stream, StreamConfig};
use cpal::traits::{DeviceTrait, StreamTrait};
use log::{debug, error, warn};
use tokio::sync::mpsc as tokio_mpsc;

use crate::audio::device::DeviceManager;
use crate::audio::resampler::{remap_channels, LinearResampler};
use crate::audio::{AudioOutput, RenderEvent};
use crate::error::AudioError;
use crate::models::AudioBuffer;

enum OutputCommand {
    Start {
        buffer: Arc<AudioBuffer>,
        offset: Duration,
        render_id: u64,
        reply: Sender<Result<(), AudioError>>,
    },
    Stop,
    Shutdown,
}

/// Renders buffers on a cpal output stream.
///
/// The stream lives on a dedicated `audio-output` thread because cpal streams
/// are not `Send` on every host. Each `start` replaces the previous stream;
/// reaching the end of the buffer reports `RenderEvent::Finished` once.
pub struct CpalOutput {
    command_sender: Mutex<Sender<OutputCommand>>,
    volume: Arc<AtomicU32>,
    device_name: String,
    thread_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl CpalOutput {
    pub fn new(
        device_manager: &DeviceManager,
        volume: f32,
        events: tokio_mpsc::UnboundedSender<RenderEvent>,
    ) -> Result<Self, AudioError> {
        let device = device_manager.current_device()
            .ok_or_else(|| AudioError::InitializationFailed("No device selected".to_string()))?
            .clone();
        let device_name = device_manager.current_device_name()?.unwrap_or_else(|| "default".to_string());

        let default_config = device.default_output_config()
            .map_err(|e| AudioError::InitializationFailed(format!("Failed to get default config: {}", e)))?;
        let sample_format = default_config.sample_format();
        if !matches!(sample_format, SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16) {
            return Err(AudioError::UnsupportedSampleFormat {
                format: format!("{:?}", sample_format),
            });
        }
        let config: StreamConfig = default_config.config();
        debug!(
            "Opening '{}' at {} Hz, {} channels, {:?}",
            device_name, config.sample_rate.0, config.channels, sample_format
        );

        let volume = Arc::new(AtomicU32::new(volume.clamp(0.0, 1.0).to_bits()));
        let (command_sender, command_receiver) = mpsc::channel();
        let thread_volume = Arc::clone(&volume);

        let handle = thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                run_output_thread(device, config, sample_format, thread_volume, command_receiver, events)
            })
            .map_err(|e| AudioError::InitializationFailed(format!("Failed to create audio thread: {}", e)))?;

        Ok(Self {
            command_sender: Mutex::new(command_sender),
            volume,
            device_name,
            thread_handle: Mutex::new(Some(handle)),
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    fn send(&self, command: OutputCommand) -> Result<(), AudioError> {
        self.command_sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(command)
            .map_err(|_| AudioError::StreamError("Audio output thread has stopped".to_string()))
    }
}

impl AudioOutput for CpalOutput {
    fn start(&self, buffer: Arc<AudioBuffer>, offset: Duration, render_id: u64) -> Result<(), AudioError> {
        let (reply, response) = mpsc::channel();
        self.send(OutputCommand::Start { buffer, offset, render_id, reply })?;
        response
            .recv()
            .map_err(|_| AudioError::StreamError("Audio output thread did not answer".to_string()))?
    }

    fn stop(&self) -> Result<(), AudioError> {
        self.send(OutputCommand::Stop)
    }

    fn set_volume(&self, volume: f32) -> Result<(), AudioError> {
        self.volume.store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
        Ok(())
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        let _ = self.send(OutputCommand::Shutdown);
        let handle = self.thread_handle.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("Audio output thread panicked");
            }
        }
    }
}

fn run_output_thread(
    device: cpal::Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    volume: Arc<AtomicU32>,
    commands: Receiver<OutputCommand>,
    events: tokio_mpsc::UnboundedSender<RenderEvent>,
) {
    let mut active: Option<Stream> = None;

    while let Ok(command) = commands.recv() {
        match command {
            OutputCommand::Start { buffer, offset, render_id, reply } => {
                // Dropping the stream silences it without reporting completion
                active = None;

                let samples = prepare_samples(&buffer, offset, config.sample_rate.0, config.channels as usize);
                if samples.is_empty() {
                    debug!("Render {} starts at the end of its buffer", render_id);
                    let _ = events.send(RenderEvent::Finished { render_id });
                    let _ = reply.send(Ok(()));
                    continue;
                }

                let result = open_stream(&device, &config, sample_format, samples, &volume, &events, render_id)
                    .and_then(|stream| {
                        stream.play()
                            .map_err(|e| AudioError::StreamError(format!("Failed to start audio stream: {}", e)))?;
                        Ok(stream)
                    });

                match result {
                    Ok(stream) => {
                        active = Some(stream);
                        let _ = reply.send(Ok(()));
                    }
                    Err(e) => {
                        warn!("Render {} could not start: {}", render_id, e);
                        let _ = reply.send(Err(e));
                    }
                }
            }
            OutputCommand::Stop => {
                active = None;
            }
            OutputCommand::Shutdown => break,
        }
    }

    if let Some(stream) = active.take() {
        let _ = stream.pause();
    }
}

/// Slice the buffer from `offset` and convert it to the device's rate and channel count
fn prepare_samples(buffer: &AudioBuffer, offset: Duration, device_rate: u32, device_channels: usize) -> Vec<f32> {
    let channels = (buffer.channels as usize).max(1);
    let start = buffer.frame_at(offset) * channels;
    let tail = buffer.samples.get(start..).unwrap_or(&[]);
    if tail.is_empty() {
        return Vec::new();
    }

    let resampled = if buffer.sample_rate == device_rate {
        tail.to_vec()
    } else {
        LinearResampler::new(buffer.sample_rate, device_rate, channels).process(tail)
    };
    remap_channels(&resampled, channels, device_channels)
}

fn open_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
    samples: Vec<f32>,
    volume: &Arc<AtomicU32>,
    events: &tokio_mpsc::UnboundedSender<RenderEvent>,
    render_id: u64,
) -> Result<Stream, AudioError> {
    match sample_format {
        SampleFormat::F32 => create_render_stream::<f32>(device, config, samples, volume, events, render_id),
        SampleFormat::I16 => create_render_stream::<i16>(device, config, samples, volume, events, render_id),
        SampleFormat::U16 => create_render_stream::<u16>(device, config, samples, volume, events, render_id),
        other => Err(AudioError::UnsupportedSampleFormat {
            format: format!("{:?}", other),
        }),
    }
}

/// Build a typed stream that plays `samples` once, then outputs silence
fn create_render_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    samples: Vec<f32>,
    volume: &Arc<AtomicU32>,
    events: &tokio_mpsc::UnboundedSender<RenderEvent>,
    render_id: u64,
) -> Result<Stream, AudioError>
where
    T: cpal::Sample + cpal::SizedSample + Send + 'static,
    T: cpal::FromSample<f32>,
{
    let volume = Arc::clone(volume);
    let finished_events = events.clone();
    let error_events = events.clone();
    let mut cursor = 0usize;
    let mut finished = false;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let current_volume = f32::from_bits(volume.load(Ordering::Relaxed));
            let available = samples.len().saturating_sub(cursor);
            let count = available.min(data.len());

            for (out, sample) in data[..count].iter_mut().zip(&samples[cursor..cursor + count]) {
                *out = cpal::Sample::from_sample(sample * current_volume);
            }
            for out in data[count..].iter_mut() {
                *out = cpal::Sample::from_sample(0.0f32);
            }
            cursor += count;

            if cursor >= samples.len() && !finished {
                finished = true;
                let _ = finished_events.send(RenderEvent::Finished { render_id });
            }
        },
        move |err| {
            let _ = error_events.send(RenderEvent::StreamError {
                render_id,
                message: err.to_string(),
            });
        },
        None,
    )
    .map_err(|e| AudioError::StreamError(format!("Failed to build output stream: {}", e)))?;

    Ok(stream)
}

/// Stand-in used when no output device could be opened. Every render fails.
#[derive(Debug, Default)]
pub struct DisconnectedOutput {
    reason: String,
}

impl DisconnectedOutput {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl AudioOutput for DisconnectedOutput {
    fn start(&self, _buffer: Arc<AudioBuffer>, _offset: Duration, _render_id: u64) -> Result<(), AudioError> {
        Err(AudioError::DeviceNotFound {
            device: format!("no output device ({})", self.reason),
        })
    }

    fn stop(&self) -> Result<(), AudioError> {
        Ok(())
    }

    fn set_volume(&self, _volume: f32) -> Result<(), AudioError> {
        Ok(())
    }
}
