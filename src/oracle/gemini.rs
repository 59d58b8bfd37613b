use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

use super::{Oracle, OracleError, OraclePurpose, OracleRequest};
use crate::config::OracleConfig;

/// Google Gemini `generateContent` client.
pub struct GeminiOracle {
    client: Client,
    config: OracleConfig,
}

impl GeminiOracle {
    pub fn new(config: OracleConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    fn model_and_timeout(&self, purpose: OraclePurpose) -> (&str, Duration) {
        match purpose {
            OraclePurpose::Text => (self.config.text_model.as_str(), self.config.text_timeout),
            OraclePurpose::Chat => (self.config.chat_model.as_str(), self.config.chat_timeout),
            OraclePurpose::Vision => (self.config.vision_model.as_str(), self.config.vision_timeout),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn generate(&self, request: OracleRequest) -> Result<String, OracleError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| OracleError::Unavailable("no API key configured".to_string()))?;

        let (model, timeout) = self.model_and_timeout(request.purpose);
        let body = GenerateContentRequest::from(&request);
        debug!("Calling Gemini model {} ({:?})", model, request.purpose);

        let response = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", api_key)])
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini request failed: {} - {}", status, error_text);
            return Err(OracleError::Status {
                code: status.as_u16(),
                body: error_text,
            });
        }

        let raw = response
            .text()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let payload: GenerateContentResponse = serde_json::from_str(&raw).map_err(|e| {
            warn!("Unparseable Gemini response: {}", e);
            OracleError::Parse(e.to_string())
        })?;

        payload.first_text().ok_or(OracleError::EmptyResponse)
    }
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> OracleError {
    if err.is_timeout() {
        warn!("Gemini request timed out after {:?}", timeout);
        OracleError::Timeout(timeout)
    } else {
        error!("Gemini transport error: {}", err);
        OracleError::Transport(err.to_string())
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    safety_settings: Option<Vec<SafetySetting>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

impl From<&OracleRequest> for GenerateContentRequest {
    fn from(request: &OracleRequest) -> Self {
        let last = request.turns.len().saturating_sub(1);
        let contents = request
            .turns
            .iter()
            .enumerate()
            .map(|(i, turn)| {
                let mut parts = vec![Part {
                    text: Some(turn.text.clone()),
                    inline_data: None,
                }];
                if i == last {
                    if let Some(image) = &request.image {
                        parts.push(Part {
                            text: None,
                            inline_data: Some(InlineData {
                                mime_type: image.mime_type.clone(),
                                data: image.data.clone(),
                            }),
                        });
                    }
                }
                Content {
                    parts,
                    role: Some(turn.role.as_str().to_string()),
                }
            })
            .collect();

        let (safety_settings, generation_config) = match request.purpose {
            OraclePurpose::Chat => (
                Some(
                    SAFETY_CATEGORIES
                        .iter()
                        .map(|category| SafetySetting {
                            category: *category,
                            threshold: "BLOCK_MEDIUM_AND_ABOVE",
                        })
                        .collect(),
                ),
                Some(GenerationConfig {
                    temperature: 0.7,
                    top_p: 0.8,
                    top_k: 40,
                    max_output_tokens: 1024,
                }),
            ),
            OraclePurpose::Text | OraclePurpose::Vision => (None, None),
        };

        Self {
            contents,
            safety_settings,
            generation_config,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .find_map(|part| part.text.filter(|t| !t.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{InlineImage, Turn};
    use serde_json::json;

    #[test]
    fn chat_request_carries_safety_and_generation_config() {
        let request = OracleRequest::chat(vec![Turn::user("hi"), Turn::model("hello"), Turn::user("how?")]);
        let body = serde_json::to_value(GenerateContentRequest::from(&request)).unwrap();

        assert_eq!(body["contents"].as_array().unwrap().len(), 3);
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
    }

    #[test]
    fn vision_request_attaches_image_to_last_turn() {
        let request = OracleRequest::vision(
            "describe",
            InlineImage {
                mime_type: "image/png".to_string(),
                data: "aGVsbG8=".to_string(),
            },
        );
        let body = serde_json::to_value(GenerateContentRequest::from(&request)).unwrap();

        assert_eq!(
            body["contents"][0]["parts"][1],
            json!({"inlineData": {"mimeType": "image/png", "data": "aGVsbG8="}})
        );
        assert!(body.get("safetySettings").is_none());
    }

    #[test]
    fn first_text_skips_empty_parts() {
        let payload: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": ""}, {"text": "answer"}], "role": "model"}}]
        }))
        .unwrap();
        assert_eq!(payload.first_text().as_deref(), Some("answer"));
    }

    #[test]
    fn no_candidates_means_no_text() {
        let payload: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(payload.first_text(), None);
    }
}
