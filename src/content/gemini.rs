//! Adapter for the Gemini `generateContent` REST endpoint.
//!
//! One client serves both collaborators: the text generator behind
//! `ContentClient` and the speech synthesizer behind `PlaybackEngine`.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::audio::SpeechSynthesizer;
use crate::config::ReaderConfig;
use crate::content::TextGenerator;
use crate::error::{ContentError, PlaybackError};

const API_KEY_HEADER: &str = "x-goog-api-key";

// Error bodies can be long; keep log lines and messages readable
const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    pub fn text(prompt: &str) -> Self {
        Self {
            contents: vec![Content::user_text(prompt)],
            generation_config: None,
        }
    }

    pub fn structured(prompt: &str, schema: &Value) -> Self {
        Self {
            contents: vec![Content::user_text(prompt)],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(schema.clone()),
                ..GenerationConfig::default()
            }),
        }
    }

    pub fn speech(text: &str, voice_name: &str) -> Self {
        Self {
            contents: vec![Content::user_text(text)],
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice_name.to_string(),
                        },
                    },
                }),
                ..GenerationConfig::default()
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn user_text(text: &str) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(text.to_string()),
                inline_data: None,
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or(&[])
    }

    /// Concatenated text parts of the first candidate, if any
    pub fn text(&self) -> Option<String> {
        let text: String = self.first_parts()
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Base64 audio carried by the first part of the first candidate
    pub fn inline_audio(&self) -> Option<&str> {
        self.first_parts()
            .first()
            .and_then(|part| part.inline_data.as_ref())
            .map(|inline| inline.data.as_str())
            .filter(|data| !data.is_empty())
    }
}

pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    text_model: String,
    speech_model: String,
    voice_name: String,
}

impl GeminiClient {
    pub fn new(config: &ReaderConfig, api_key: String) -> Result<Self, ContentError> {
        let client = Client::builder()
            .use_rustls_tls()
            .user_agent(format!("liturgy-reader/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ContentError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key,
            text_model: config.text_model.clone(),
            speech_model: config.speech_model.clone(),
            voice_name: config.voice_name.clone(),
        })
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    async fn generate(&self, model: &str, request: &GenerateContentRequest) -> Result<GenerateContentResponse, String> {
        let url = self.endpoint(model);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            warn!("{} answered HTTP {}: {}", model, status, body);
            return Err(format!("HTTP {} from {}", status, model));
        }

        response
            .json()
            .await
            .map_err(|e| format!("Unreadable response from {}: {}", model, e))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_structured(&self, prompt: &str, schema: &Value) -> Result<Option<String>, ContentError> {
        let request = GenerateContentRequest::structured(prompt, schema);
        let response = self.generate(&self.text_model, &request).await.map_err(ContentError::Unavailable)?;
        Ok(response.text())
    }

    async fn generate_text(&self, prompt: &str) -> Result<Option<String>, ContentError> {
        let request = GenerateContentRequest::text(prompt);
        let response = self.generate(&self.text_model, &request).await.map_err(ContentError::Unavailable)?;
        Ok(response.text())
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiClient {
    async fn synthesize(&self, text: &str) -> Result<String, PlaybackError> {
        let request = GenerateContentRequest::speech(text, &self.voice_name);
        let response = self
            .generate(&self.speech_model, &request)
            .await
            .map_err(PlaybackError::SynthesisFailure)?;

        response
            .inline_audio()
            .map(str::to_string)
            .ok_or_else(|| PlaybackError::SynthesisFailure("No audio generated".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_speech_request_shape() {
        let request = GenerateContentRequest::speech("Gloire à toi, Seigneur.", "Kore");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["contents"][0]["parts"][0]["text"], "Gloire à toi, Seigneur.");
        assert_eq!(value["generationConfig"]["responseModalities"], json!(["AUDIO"]));
        assert_eq!(
            value["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
            "Kore"
        );
        assert!(value["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn test_structured_request_shape() {
        let schema = json!({"type": "OBJECT"});
        let value = serde_json::to_value(GenerateContentRequest::structured("prompt", &schema)).unwrap();

        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(value["generationConfig"]["responseSchema"], schema);
        assert!(value["generationConfig"].get("speechConfig").is_none());

        let plain = serde_json::to_value(GenerateContentRequest::text("prompt")).unwrap();
        assert!(plain.get("generationConfig").is_none());
    }

    #[test]
    fn test_text_response_concatenates_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"date\":"}, {"text": " \"x\"}"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"totalTokenCount": 42}
        }))
        .unwrap();

        assert_eq!(response.text().as_deref(), Some("{\"date\": \"x\"}"));
        assert_eq!(response.inline_audio(), None);
    }

    #[test]
    fn test_audio_response() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"inlineData": {"mimeType": "audio/L16;codec=pcm;rate=24000", "data": "AAABAA=="}}]}
            }]
        }))
        .unwrap();

        assert_eq!(response.inline_audio(), Some("AAABAA=="));
        assert_eq!(response.text(), None);
    }

    #[test]
    fn test_empty_responses_carry_nothing() {
        let blocked: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert_eq!(blocked.text(), None);
        assert_eq!(blocked.inline_audio(), None);

        let no_content: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "OTHER"}]})).unwrap();
        assert_eq!(no_content.text(), None);

        let empty_audio: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"inlineData": {"data": ""}}]}}]
        }))
        .unwrap();
        assert_eq!(empty_audio.inline_audio(), None);
    }

    #[test]
    fn test_endpoint() {
        let config = ReaderConfig {
            api_base_url: "https://example.test/v1beta/".to_string(),
            ..ReaderConfig::default()
        };
        let client = GeminiClient::new(&config, "key".to_string()).unwrap();

        assert_eq!(
            client.endpoint("gemini-2.5-flash"),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
