pub mod gemini;
pub mod prompts;

use std::sync::Arc;
use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use crate::error::ContentError;
use crate::logging::{OperationTimer, ReaderLogger};
use crate::models::ReadingSet;

pub use gemini::GeminiClient;

/// Shown when the reflection call succeeds but returns nothing
pub const NO_REFLECTION_TEXT: &str = "No reflection available.";

/// Shown in place of a reflection whose generation failed
pub const REFLECTION_FAILED_TEXT: &str = "The reflection could not be generated.";

/// External text generator. `Ok(None)` means the call succeeded without a payload.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a JSON payload constrained by `schema`
    async fn generate_structured(&self, prompt: &str, schema: &Value) -> Result<Option<String>, ContentError>;

    async fn generate_text(&self, prompt: &str) -> Result<Option<String>, ContentError>;
}

/// Fetches the day's readings and reflections. Nothing is cached here.
#[derive(Clone)]
pub struct ContentClient {
    generator: Arc<dyn TextGenerator>,
    reading_language: String,
    logger: ReaderLogger,
}

impl ContentClient {
    pub fn new(generator: Arc<dyn TextGenerator>, reading_language: &str, logger: ReaderLogger) -> Self {
        Self {
            generator,
            reading_language: reading_language.to_string(),
            logger,
        }
    }

    /// Ask for the readings of the day described by `date_label`
    pub async fn fetch_reading_set(&self, date_label: &str) -> Result<ReadingSet, ContentError> {
        let prompt = prompts::reading_set_prompt(date_label, &self.reading_language);
        let schema = prompts::reading_set_schema();
        let timer = OperationTimer::new("reading set request");

        let result = match self.generator.generate_structured(&prompt, &schema).await {
            Ok(Some(payload)) if !payload.trim().is_empty() => parse_reading_set(&payload),
            Ok(_) => Err(ContentError::Unavailable("no payload returned".to_string())),
            Err(e) => Err(e),
        };
        let elapsed = timer.finish_with_threshold(std::time::Duration::from_secs(20));

        match &result {
            Ok(set) => self.logger.log_readings_loaded(&set.day_name, elapsed),
            Err(e) => self.logger.log_readings_failed(date_label, &e.to_string()),
        }
        result
    }

    /// Short devotional commentary on the gospel, or the fallback text on empty output
    pub async fn fetch_reflection(&self, gospel_text: &str) -> Result<String, ContentError> {
        let prompt = prompts::reflection_prompt(gospel_text, &self.reading_language);
        let timer = OperationTimer::new("reflection request");

        match self.generator.generate_text(&prompt).await {
            Ok(Some(text)) if !text.trim().is_empty() => {
                let text = text.trim().to_string();
                self.logger.log_reflection_generated(text.split_whitespace().count(), timer.finish());
                Ok(text)
            }
            Ok(_) => {
                debug!("Reflection came back empty");
                Ok(NO_REFLECTION_TEXT.to_string())
            }
            Err(e) => {
                self.logger.log_reflection_failed(&e.to_string());
                Err(e)
            }
        }
    }

    /// Reflection failures are not retried; the fixed failure text stands in
    pub async fn fetch_reflection_or_fallback(&self, gospel_text: &str) -> String {
        self.fetch_reflection(gospel_text)
            .await
            .unwrap_or_else(|_| REFLECTION_FAILED_TEXT.to_string())
    }
}

/// Parse and validate a reading set payload
pub fn parse_reading_set(payload: &str) -> Result<ReadingSet, ContentError> {
    let set: ReadingSet = serde_json::from_str(strip_code_fence(payload))
        .map_err(|e| ContentError::Malformed(e.to_string()))?;
    let set = set.normalized();

    if set.gospel.text.trim().is_empty() {
        return Err(ContentError::Malformed("gospel text is empty".to_string()));
    }
    Ok(set)
}

// Some models wrap JSON in a markdown fence even when asked not to
fn strip_code_fence(payload: &str) -> &str {
    let trimmed = payload.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let body = rest.strip_prefix("json").unwrap_or(rest);
            body.strip_suffix("```").unwrap_or(body).trim()
        }
        None => trimmed,
    }
}
