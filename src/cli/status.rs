use std::time::Duration;
use crate::error::{ErrorSeverity, ReaderError};
use crate::models::{PlaybackState, PlaybackStatus, Reading, ReadingSet};

const TEXT_WIDTH: usize = 72;

/// Terminal rendering for the reader
pub struct StatusDisplay;

impl StatusDisplay {
    /// Header line plus every reading of the day, in liturgical order
    pub fn display_reading_set(set: &ReadingSet, date_label: &str) {
        Self::display_day_header(set, date_label);
        for (label, reading) in set.readings() {
            Self::display_reading(label, reading);
        }
    }

    pub fn display_day_header(set: &ReadingSet, date_label: &str) {
        println!("┌─ {} ─", date_label);
        println!("│ {}", set.day_name);
        println!(
            "│ {} · {}",
            set.liturgical_color.season_label(),
            set.liturgical_color.as_str()
        );
        println!("└─────────────────────────────────────────────────────────");
    }

    fn display_reading(label: &str, reading: &Reading) {
        println!();
        let heading = reading.heading();
        if heading.is_empty() || heading == label {
            println!("== {} ==", label);
        } else {
            println!("== {} · {} ==", label, heading);
        }
        for line in Self::wrap_paragraphs(&reading.text, TEXT_WIDTH) {
            println!("{}", line);
        }
    }

    pub fn display_reflection(set: &ReadingSet, reflection: &str) {
        println!();
        println!("== Reflection · {} ==", set.gospel.heading());
        for line in Self::wrap_paragraphs(reflection, TEXT_WIDTH) {
            println!("{}", line);
        }
    }

    pub fn display_playback_status(status: &PlaybackStatus, device: Option<&str>) {
        println!("┌─ Gospel Audio ───────────────────────────────────────────┐");
        println!("│ Status: {}", Self::format_playback_state(status.state));
        match status.duration {
            Some(duration) => {
                println!(
                    "│ Position: {} / {}",
                    Self::format_duration(status.position),
                    Self::format_duration(duration)
                );
                let progress = status.progress();
                println!("│ Progress: [{}] {:.1}%", Self::create_progress_bar(progress, 40), progress * 100.0);
            }
            None => println!("│ Audio: not generated yet"),
        }
        println!("│");
        println!("│ Volume: {}%", (status.volume * 100.0).round() as u8);
        println!("│ Device: {}", Self::truncate(device.unwrap_or("Default"), 49));
        println!("└──────────────────────────────────────────────────────────┘");
    }

    pub fn display_devices(devices: &[String], current: Option<&str>) {
        if devices.is_empty() {
            println!("No audio output devices found");
            return;
        }
        println!("Audio output devices:");
        for device in devices {
            let marker = if Some(device.as_str()) == current { "*" } else { " " };
            println!("  {} {}", marker, device);
        }
    }

    /// Boxed error message with recovery suggestions
    pub fn display_error(error: &ReaderError) {
        let severity = error.severity();
        let severity_icon = match severity {
            ErrorSeverity::Info => "ℹ",
            ErrorSeverity::Warning => "⚠",
            ErrorSeverity::Error => "✗",
            ErrorSeverity::Critical => "🔥",
        };

        eprintln!("┌─ {} {} ─────────────────────────────────────────────────┐",
            severity_icon, severity.as_str());

        for line in Self::wrap_text(&error.user_message(), 55) {
            eprintln!("│ {}", line);
        }

        let suggestions = error.recovery_suggestions();
        if !suggestions.is_empty() {
            eprintln!("│");
            eprintln!("│ Suggestions:");
            for suggestion in suggestions.iter().take(3) {
                for line in Self::wrap_text(&format!("• {}", suggestion), 53) {
                    eprintln!("│   {}", line);
                }
            }
        }

        eprintln!("└─────────────────────────────────────────────────────────┘");
    }

    /// One-line error for one-shot commands
    pub fn display_simple_error(error: &ReaderError) {
        eprintln!("[{}] {}", error.severity().as_str(), error.user_message());

        let suggestions = error.recovery_suggestions();
        if let Some(first) = suggestions.first() {
            eprintln!("Suggestion: {}", first);
        }
    }

    /// Short notice printed after a toggle or a playback event
    pub fn playback_notice(state: PlaybackState) -> &'static str {
        match state {
            PlaybackState::Idle => "Gospel audio stopped",
            PlaybackState::Loading => "Preparing the gospel audio...",
            PlaybackState::Playing => "Reading the gospel aloud",
            PlaybackState::Paused => "Paused",
        }
    }

    pub fn format_playback_state(state: PlaybackState) -> String {
        let icon = match state {
            PlaybackState::Idle => "⏹",
            PlaybackState::Loading => "…",
            PlaybackState::Playing => "▶",
            PlaybackState::Paused => "⏸",
        };
        format!("{} {}", icon, state.as_str())
    }

    /// Format duration as MM:SS, or HH:MM:SS past an hour
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{:02}:{:02}", minutes, seconds)
        }
    }

    pub fn create_progress_bar(progress: f64, width: usize) -> String {
        let filled = ((progress.clamp(0.0, 1.0) * width as f64) as usize).min(width);
        format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
    }

    /// Truncate to `max_len` characters with an ellipsis
    pub fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len || max_len <= 3 {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len - 3).collect();
            format!("{}...", kept)
        }
    }

    /// Word-wrap each paragraph, keeping blank lines between them
    pub fn wrap_paragraphs(text: &str, width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.trim().split('\n') {
            if paragraph.trim().is_empty() {
                lines.push(String::new());
            } else {
                lines.extend(Self::wrap_text(paragraph, width).into_iter().map(|line| line.trim_end().to_string()));
            }
        }
        lines
    }

    /// Wrap text to `width` characters, padding every line to that width
    fn wrap_text(text: &str, width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current_line = String::new();

        for word in text.split_whitespace() {
            if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_line.chars().count() + word.chars().count() + 1 <= width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                lines.push(current_line);
                current_line = word.to_string();
            }
        }

        if !current_line.is_empty() {
            lines.push(current_line);
        }

        lines.into_iter()
            .map(|line| format!("{:<width$}", line, width = width))
            .collect()
    }
}
