use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("CLI parse error: {0}")]
    Parse(#[from] crate::cli::ParseError),
}

impl ReaderError {
    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ReaderError::Content(err) => err.user_message(),
            ReaderError::Playback(err) => err.user_message(),
            ReaderError::Audio(err) => err.user_message(),
            ReaderError::Config(err) => err.user_message(),
            ReaderError::Parse(err) => format!("Command error: {}", err),
        }
    }

    /// Get suggested actions for the error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReaderError::Content(err) => err.recovery_suggestions(),
            ReaderError::Playback(err) => err.recovery_suggestions(),
            ReaderError::Audio(err) => err.recovery_suggestions(),
            ReaderError::Config(err) => err.recovery_suggestions(),
            ReaderError::Parse(_) => vec!["Type 'help' to see available commands".to_string()],
        }
    }

    /// Whether the user can recover by re-triggering the same operation
    pub fn is_recoverable(&self) -> bool {
        match self {
            ReaderError::Content(_) => true,
            ReaderError::Playback(err) => err.is_recoverable(),
            ReaderError::Audio(err) => err.is_recoverable(),
            ReaderError::Config(err) => err.is_recoverable(),
            ReaderError::Parse(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ReaderError::Content(_) => ErrorSeverity::Error,
            ReaderError::Playback(PlaybackError::NothingToPlay) => ErrorSeverity::Info,
            ReaderError::Playback(_) => ErrorSeverity::Warning,
            ReaderError::Audio(AudioError::DeviceNotFound { .. }) => ErrorSeverity::Error,
            ReaderError::Audio(_) => ErrorSeverity::Critical,
            ReaderError::Config(ConfigError::MissingApiKey) => ErrorSeverity::Critical,
            ReaderError::Config(_) => ErrorSeverity::Warning,
            ReaderError::Parse(_) => ErrorSeverity::Info,
        }
    }
}

/// Error severity levels for logging and user feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "INFO",
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        }
    }

    pub fn log_level(&self) -> log::Level {
        match self {
            ErrorSeverity::Info => log::Level::Info,
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error => log::Level::Error,
            ErrorSeverity::Critical => log::Level::Error,
        }
    }
}

/// Failures of the text-generation calls
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContentError {
    /// The call failed or came back without a payload
    #[error("Content unavailable: {0}")]
    Unavailable(String),

    /// The payload did not match the expected reading-set shape
    #[error("Malformed content: {0}")]
    Malformed(String),
}

impl ContentError {
    /// Both kinds collapse to the same message for the reader
    pub fn user_message(&self) -> String {
        "Could not load the readings. Check your connection.".to_string()
    }

    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ContentError::Unavailable(_) => vec![
                "Type 'retry' to fetch the readings again".to_string(),
                "Check your network connection and API key".to_string(),
            ],
            ContentError::Malformed(_) => vec![
                "Type 'retry' to fetch the readings again".to_string(),
            ],
        }
    }
}

/// Failures of the speech playback path
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailure(String),

    #[error("Audio output failed: {0}")]
    Output(#[from] AudioError),

    #[error("No text to play")]
    NothingToPlay,
}

impl PlaybackError {
    pub fn user_message(&self) -> String {
        match self {
            PlaybackError::SynthesisFailure(_) => "The gospel audio could not be generated".to_string(),
            PlaybackError::Output(err) => err.user_message(),
            PlaybackError::NothingToPlay => "Load a day's readings before playing".to_string(),
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            PlaybackError::SynthesisFailure(_) => vec![
                "Type 'play' to try again".to_string(),
            ],
            PlaybackError::Output(err) => err.recovery_suggestions(),
            PlaybackError::NothingToPlay => vec![
                "Type 'today' or 'retry' to load the readings".to_string(),
            ],
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            PlaybackError::Output(err) => err.is_recoverable(),
            _ => true,
        }
    }
}

/// PCM payload decoding errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),

    #[error("PCM16 payload has odd length of {len} bytes")]
    OddByteLength { len: usize },
}

/// Audio output errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AudioError {
    #[error("Device not found: {device}")]
    DeviceNotFound { device: String },

    #[error("Unsupported sample format: {format}")]
    UnsupportedSampleFormat { format: String },

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Audio initialization failed: {0}")]
    InitializationFailed(String),
}

impl AudioError {
    pub fn user_message(&self) -> String {
        match self {
            AudioError::DeviceNotFound { device } => {
                format!("Audio device '{}' is not available or has been disconnected", device)
            }
            AudioError::UnsupportedSampleFormat { format } => {
                format!("The output device uses an unsupported sample format ({})", format)
            }
            AudioError::StreamError(msg) => format!("Audio playback interrupted: {}", msg),
            AudioError::InitializationFailed(msg) => {
                format!("Failed to initialize audio system: {}", msg)
            }
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            AudioError::DeviceNotFound { .. } => vec![
                "Use 'devices' to see available audio devices".to_string(),
                "Set 'preferred_device' in the configuration file".to_string(),
            ],
            AudioError::UnsupportedSampleFormat { .. } => vec![
                "Select a different output device".to_string(),
            ],
            AudioError::StreamError(_) => vec![
                "Type 'play' to restart playback".to_string(),
                "Check audio device connections".to_string(),
            ],
            AudioError::InitializationFailed(_) => vec![
                "Restart the application".to_string(),
                "Verify audio drivers are properly installed".to_string(),
            ],
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            AudioError::DeviceNotFound { .. } => true,
            AudioError::UnsupportedSampleFormat { .. } => false,
            AudioError::StreamError(_) => true,
            AudioError::InitializationFailed(_) => true,
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    ConfigDirNotFound,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] toml::de::Error),

    #[error("No API key configured")]
    MissingApiKey,
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::ConfigDirNotFound => {
                "Cannot find or create the configuration directory".to_string()
            }
            ConfigError::IoError(err) => format!("Cannot read or write configuration: {}", err),
            ConfigError::SerializationError(_) => "Failed to save configuration".to_string(),
            ConfigError::DeserializationError(_) => {
                "Configuration file is corrupted or has an invalid format".to_string()
            }
            ConfigError::MissingApiKey => "No Gemini API key is configured".to_string(),
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ConfigError::ConfigDirNotFound | ConfigError::IoError(_) => vec![
                "Check permissions on ~/.config/liturgy-reader".to_string(),
            ],
            ConfigError::SerializationError(_) => vec!["Try the operation again".to_string()],
            ConfigError::DeserializationError(_) => vec![
                "Fix or delete ~/.config/liturgy-reader/config.toml".to_string(),
            ],
            ConfigError::MissingApiKey => vec![
                "Export GEMINI_API_KEY before starting".to_string(),
                "Or set 'api_key' in ~/.config/liturgy-reader/config.toml".to_string(),
            ],
        }
    }

    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ConfigError::MissingApiKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_reader_error_from_content_error() {
        let error: ReaderError = ContentError::Unavailable("timeout".to_string()).into();
        match error {
            ReaderError::Content(ContentError::Unavailable(msg)) => assert_eq!(msg, "timeout"),
            _ => panic!("Expected Content error"),
        }
    }

    #[test]
    fn test_content_errors_share_user_message() {
        let unavailable = ContentError::Unavailable("HTTP 503".to_string());
        let malformed = ContentError::Malformed("missing gospel".to_string());
        assert_eq!(unavailable.user_message(), malformed.user_message());
        assert!(ReaderError::from(malformed).is_recoverable());
    }

    #[test]
    fn test_content_error_display() {
        let error = ContentError::Unavailable("no payload".to_string());
        assert_eq!(format!("{}", error), "Content unavailable: no payload");

        let error = ContentError::Malformed("bad json".to_string());
        assert_eq!(format!("{}", error), "Malformed content: bad json");
    }

    #[test]
    fn test_playback_error_classification() {
        let failure = PlaybackError::SynthesisFailure("undecodable audio".to_string());
        assert_eq!(failure.user_message(), "The gospel audio could not be generated");
        assert!(failure.is_recoverable());
        assert!(!PlaybackError::Output(AudioError::UnsupportedSampleFormat { format: "I24".to_string() }).is_recoverable());
    }

    #[test]
    fn test_decode_error_display() {
        let error = DecodeError::OddByteLength { len: 5 };
        assert_eq!(format!("{}", error), "PCM16 payload has odd length of 5 bytes");
    }

    #[test]
    fn test_severity_mapping() {
        let error = ReaderError::Playback(PlaybackError::NothingToPlay);
        assert_eq!(error.severity(), ErrorSeverity::Info);

        let error = ReaderError::Config(ConfigError::MissingApiKey);
        assert_eq!(error.severity(), ErrorSeverity::Critical);
        assert_eq!(error.severity().log_level(), log::Level::Error);
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_config_error_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied");
        let config_error: ConfigError = io_error.into();
        assert!(matches!(config_error, ConfigError::IoError(_)));
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;

        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied");
        let reader_error = ReaderError::Config(ConfigError::IoError(io_error));

        let mut current_error: &dyn Error = &reader_error;
        let mut error_count = 0;
        while let Some(source) = current_error.source() {
            current_error = source;
            error_count += 1;
        }
        assert!(error_count >= 1);
    }

    #[test]
    fn test_recovery_suggestions_not_empty() {
        let errors: Vec<ReaderError> = vec![
            ContentError::Unavailable("x".to_string()).into(),
            PlaybackError::SynthesisFailure("x".to_string()).into(),
            AudioError::DeviceNotFound { device: "DAC".to_string() }.into(),
            ConfigError::MissingApiKey.into(),
        ];
        for error in errors {
            assert!(!error.recovery_suggestions().is_empty(), "{:?}", error);
        }
    }
}
