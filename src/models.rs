use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A titled, referenced block of liturgical text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Reading {
    pub title: String,
    pub reference: String,
    pub text: String,
}

impl Reading {
    /// True when the generator returned the object but left every field blank
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.reference.trim().is_empty() && self.text.trim().is_empty()
    }

    /// Heading line used when rendering, e.g. "Gospel (Luke 1:26-38)"
    pub fn heading(&self) -> String {
        match (self.title.trim().is_empty(), self.reference.trim().is_empty()) {
            (false, false) => format!("{} ({})", self.title.trim(), self.reference.trim()),
            (false, true) => self.title.trim().to_string(),
            (true, false) => self.reference.trim().to_string(),
            (true, true) => String::new(),
        }
    }
}

/// Liturgical color of the day, used for presentation only
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LiturgicalColor {
    Green,
    Red,
    White,
    Purple,
    Rose,
}

impl LiturgicalColor {
    pub const ALL: [LiturgicalColor; 5] = [
        LiturgicalColor::Green,
        LiturgicalColor::Red,
        LiturgicalColor::White,
        LiturgicalColor::Purple,
        LiturgicalColor::Rose,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LiturgicalColor::Green => "green",
            LiturgicalColor::Red => "red",
            LiturgicalColor::White => "white",
            LiturgicalColor::Purple => "purple",
            LiturgicalColor::Rose => "rose",
        }
    }

    /// Short season badge shown next to the date
    pub fn season_label(&self) -> &'static str {
        match self {
            LiturgicalColor::Green => "Ordinary Time",
            LiturgicalColor::Purple => "Lent / Advent",
            LiturgicalColor::White => "Feast / Solemnity",
            LiturgicalColor::Red => "Martyrs / Holy Spirit",
            LiturgicalColor::Rose => "Liturgy",
        }
    }
}

/// The readings of one day. Produced once per date query and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReadingSet {
    pub date: String,
    pub liturgical_color: LiturgicalColor,
    #[serde(rename = "liturgicalDayName")]
    pub day_name: String,
    pub gospel: Reading,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_reading: Option<Reading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psalm: Option<Reading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_reading: Option<Reading>,
}

impl ReadingSet {
    /// Drop optional readings the generator returned as empty shells
    pub fn normalized(mut self) -> Self {
        for slot in [&mut self.first_reading, &mut self.psalm, &mut self.second_reading] {
            if slot.as_ref().map_or(false, Reading::is_blank) {
                *slot = None;
            }
        }
        self
    }

    /// Readings in liturgical order, skipping the absent ones
    pub fn readings(&self) -> Vec<(&'static str, &Reading)> {
        let mut out = Vec::with_capacity(4);
        if let Some(reading) = &self.first_reading {
            out.push(("First Reading", reading));
        }
        if let Some(reading) = &self.psalm {
            out.push(("Psalm", reading));
        }
        if let Some(reading) = &self.second_reading {
            out.push(("Second Reading", reading));
        }
        out.push(("Gospel", &self.gospel));
        out
    }

    /// Text handed to speech synthesis: the intro line with `{reference}` filled in, then the gospel
    pub fn narration_text(&self, intro_template: &str) -> String {
        let intro = intro_template.replace("{reference}", self.gospel.reference.trim());
        let intro = intro.trim();
        if intro.is_empty() {
            self.gospel.text.trim().to_string()
        } else {
            format!("{} {}", intro, self.gospel.text.trim())
        }
    }
}

/// Which panel the reader is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Reading,
    Reflection,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Reading => "Readings",
            ViewMode::Reflection => "Reflection",
        }
    }
}

/// Playback state of a session. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "Idle",
            PlaybackState::Loading => "Loading",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
        }
    }
}

/// Snapshot of the playback engine for status display
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub has_audio: bool,
    pub volume: f32,
}

impl PlaybackStatus {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Idle,
            position: Duration::ZERO,
            duration: None,
            has_audio: false,
            volume: 1.0,
        }
    }

    /// Progress through the decoded audio (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        match self.duration {
            Some(duration) if !duration.is_zero() => {
                (self.position.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Decoded audio samples (interleaved f32)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
    pub frames: usize,
}

impl AudioBuffer {
    /// Wrap mono samples at the given rate
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        let frames = samples.len();
        Self {
            samples,
            channels: 1,
            sample_rate,
            frames,
        }
    }

    /// Get the number of samples per channel
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Playable length of the buffer
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames as f64 / self.sample_rate as f64)
    }

    /// Frame index corresponding to a time offset, clamped to the buffer length
    pub fn frame_at(&self, offset: Duration) -> usize {
        let frame = (offset.as_secs_f64() * self.sample_rate as f64).floor() as usize;
        frame.min(self.frames)
    }
}
