use log::{debug, error, info, trace, warn};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use chrono::{DateTime, Utc};

/// Environment variable holding the log level
pub const LOG_LEVEL_ENV: &str = "LITURGY_LOG_LEVEL";

/// Reader event for logging and debugging
#[derive(Debug, Clone)]
pub struct ReaderEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: ReaderEventType,
    pub duration: Option<Duration>,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEventType {
    ReadingsLoaded,
    ReadingsFailed,
    ReflectionGenerated,
    ReflectionFailed,
    SynthesisRequested,
    SynthesisCompleted,
    SynthesisFailed,
    PlaybackStarted,
    PlaybackPaused,
    PlaybackFinished,
    PlaybackReset,
    StaleEventIgnored,
}

impl ReaderEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReaderEventType::ReadingsLoaded => "READINGS_LOADED",
            ReaderEventType::ReadingsFailed => "READINGS_FAILED",
            ReaderEventType::ReflectionGenerated => "REFLECTION_GENERATED",
            ReaderEventType::ReflectionFailed => "REFLECTION_FAILED",
            ReaderEventType::SynthesisRequested => "SYNTHESIS_REQUESTED",
            ReaderEventType::SynthesisCompleted => "SYNTHESIS_COMPLETED",
            ReaderEventType::SynthesisFailed => "SYNTHESIS_FAILED",
            ReaderEventType::PlaybackStarted => "PLAYBACK_STARTED",
            ReaderEventType::PlaybackPaused => "PLAYBACK_PAUSED",
            ReaderEventType::PlaybackFinished => "PLAYBACK_FINISHED",
            ReaderEventType::PlaybackReset => "PLAYBACK_RESET",
            ReaderEventType::StaleEventIgnored => "STALE_EVENT_IGNORED",
        }
    }
}

/// Logger for reader operations with a bounded in-memory history
#[derive(Clone)]
pub struct ReaderLogger {
    events: Arc<Mutex<VecDeque<ReaderEvent>>>,
    max_events: usize,
}

impl ReaderLogger {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            max_events: 1000, // Keep last 1000 events
        }
    }

    /// Initialize logging system with appropriate log level
    pub fn init() -> Result<(), Box<dyn std::error::Error>> {
        let log_level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "warn".to_string());

        let mut builder = env_logger::Builder::new();

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] [{}:{}] {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        });

        builder.filter_level(Self::parse_level(&log_level));
        builder.try_init()?;

        info!("Liturgy reader logging initialized with level: {}", log_level);
        Ok(())
    }

    fn parse_level(level: &str) -> log::LevelFilter {
        match level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            "off" => log::LevelFilter::Off,
            _ => log::LevelFilter::Info,
        }
    }

    fn history(&self) -> MutexGuard<'_, VecDeque<ReaderEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Log a reader event
    pub fn log_event(&self, event_type: ReaderEventType, details: String, duration: Option<Duration>) {
        match event_type {
            ReaderEventType::ReadingsLoaded
            | ReaderEventType::ReflectionGenerated
            | ReaderEventType::PlaybackStarted
            | ReaderEventType::PlaybackPaused
            | ReaderEventType::PlaybackFinished => {
                info!("[{}] {}", event_type.as_str(), details);
            }
            ReaderEventType::SynthesisRequested
            | ReaderEventType::SynthesisCompleted
            | ReaderEventType::PlaybackReset => {
                debug!("[{}] {} (took: {:?})", event_type.as_str(), details, duration);
            }
            ReaderEventType::StaleEventIgnored => {
                trace!("[{}] {}", event_type.as_str(), details);
            }
            ReaderEventType::ReflectionFailed => {
                warn!("[{}] {}", event_type.as_str(), details);
            }
            ReaderEventType::ReadingsFailed | ReaderEventType::SynthesisFailed => {
                error!("[{}] {}", event_type.as_str(), details);
            }
        }

        let mut events = self.history();
        events.push_back(ReaderEvent {
            timestamp: Utc::now(),
            event_type,
            duration,
            details,
        });
        while events.len() > self.max_events {
            events.pop_front();
        }
    }

    pub fn log_readings_loaded(&self, day_name: &str, elapsed: Duration) {
        self.log_event(
            ReaderEventType::ReadingsLoaded,
            format!("Loaded readings for '{}'", day_name),
            Some(elapsed),
        );
    }

    pub fn log_readings_failed(&self, date_label: &str, error: &str) {
        self.log_event(
            ReaderEventType::ReadingsFailed,
            format!("Could not load readings for '{}': {}", date_label, error),
            None,
        );
    }

    pub fn log_reflection_generated(&self, words: usize, elapsed: Duration) {
        self.log_event(
            ReaderEventType::ReflectionGenerated,
            format!("Reflection generated ({} words)", words),
            Some(elapsed),
        );
    }

    pub fn log_reflection_failed(&self, error: &str) {
        self.log_event(
            ReaderEventType::ReflectionFailed,
            format!("Reflection failed: {}", error),
            None,
        );
    }

    pub fn log_synthesis_requested(&self, characters: usize) {
        self.log_event(
            ReaderEventType::SynthesisRequested,
            format!("Requesting speech for {} characters", characters),
            None,
        );
    }

    pub fn log_synthesis_completed(&self, audio_length: Duration, elapsed: Duration) {
        self.log_event(
            ReaderEventType::SynthesisCompleted,
            format!("Synthesized {:.2}s of audio", audio_length.as_secs_f64()),
            Some(elapsed),
        );
    }

    pub fn log_synthesis_failed(&self, error: &str) {
        self.log_event(
            ReaderEventType::SynthesisFailed,
            format!("Speech synthesis failed: {}", error),
            None,
        );
    }

    pub fn log_playback_started(&self, offset: Duration, render_id: u64) {
        self.log_event(
            ReaderEventType::PlaybackStarted,
            format!("Render {} started at {:.2}s", render_id, offset.as_secs_f64()),
            None,
        );
    }

    pub fn log_playback_paused(&self, position: Duration) {
        self.log_event(
            ReaderEventType::PlaybackPaused,
            format!("Playback paused at position: {:.2}s", position.as_secs_f64()),
            None,
        );
    }

    pub fn log_playback_finished(&self, render_id: u64) {
        self.log_event(
            ReaderEventType::PlaybackFinished,
            format!("Render {} reached the end of the buffer", render_id),
            None,
        );
    }

    pub fn log_playback_reset(&self, reason: &str) {
        self.log_event(ReaderEventType::PlaybackReset, reason.to_string(), None);
    }

    pub fn log_stale_event(&self, details: String) {
        self.log_event(ReaderEventType::StaleEventIgnored, details, None);
    }

    /// Get recent events for debugging
    pub fn get_recent_events(&self, count: usize) -> Vec<ReaderEvent> {
        let events = self.history();
        let skip = events.len().saturating_sub(count);
        events.iter().skip(skip).cloned().collect()
    }

    /// Get event statistics
    pub fn get_event_statistics(&self) -> EventStatistics {
        let events = self.history();
        let mut stats = EventStatistics::new();

        for event in events.iter() {
            match event.event_type {
                ReaderEventType::ReadingsFailed => stats.content_failures += 1,
                ReaderEventType::SynthesisRequested => stats.synthesis_requests += 1,
                ReaderEventType::SynthesisFailed => stats.synthesis_failures += 1,
                ReaderEventType::StaleEventIgnored => stats.stale_events += 1,
                ReaderEventType::PlaybackStarted => stats.renders_started += 1,
                _ => {}
            }
        }

        stats.total_events = events.len();
        stats
    }
}

impl Default for ReaderLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about logged events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStatistics {
    pub total_events: usize,
    pub content_failures: usize,
    pub synthesis_requests: usize,
    pub synthesis_failures: usize,
    pub renders_started: usize,
    pub stale_events: usize,
}

impl EventStatistics {
    pub fn new() -> Self {
        Self {
            total_events: 0,
            content_failures: 0,
            synthesis_requests: 0,
            synthesis_failures: 0,
            renders_started: 0,
            stale_events: 0,
        }
    }
}

/// Timer utility for measuring operation durations
pub struct OperationTimer {
    start_time: Instant,
    operation_name: String,
}

impl OperationTimer {
    pub fn new(operation_name: &str) -> Self {
        trace!("Starting operation: {}", operation_name);
        Self {
            start_time: Instant::now(),
            operation_name: operation_name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn finish(self) -> Duration {
        let duration = self.elapsed();
        trace!("Completed operation '{}' in {}ms", self.operation_name, duration.as_millis());
        duration
    }

    pub fn finish_with_threshold(self, threshold: Duration) -> Duration {
        let duration = self.elapsed();
        if duration > threshold {
            warn!("Operation '{}' took {}ms (threshold: {}ms)",
                self.operation_name, duration.as_millis(), threshold.as_millis());
        } else {
            debug!("Completed operation '{}' in {}ms", self.operation_name, duration.as_millis());
        }
        duration
    }
}
