//! Generative-AI oracle abstraction.
//!
//! Every caller treats the oracle as unreliable: the risk scorer falls back
//! to its heuristic, the chat adapter to a fixed apology and the food
//! analyser to a mock estimate. `OracleError` never leaves those callers.

pub mod gemini;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::OracleConfig;

pub use gemini::GeminiOracle;

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// No backend configured
    #[error("Oracle unavailable: {0}")]
    Unavailable(String),

    #[error("Oracle request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("Oracle returned status {code}: {body}")]
    Status { code: u16, body: String },

    /// Well-formed reply without any text part
    #[error("Oracle returned no candidates")]
    EmptyResponse,

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Which kind of call this is; selects model and timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OraclePurpose {
    /// Structured text generation (risk scoring)
    Text,
    /// Free-form conversation
    Chat,
    /// Image analysis
    Vision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: TurnRole::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: TurnRole::Model, text: text.into() }
    }
}

/// Base64 image payload attached to the final turn.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    pub purpose: OraclePurpose,
    pub turns: Vec<Turn>,
    pub image: Option<InlineImage>,
}

impl OracleRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            purpose: OraclePurpose::Text,
            turns: vec![Turn::user(prompt)],
            image: None,
        }
    }

    pub fn chat(turns: Vec<Turn>) -> Self {
        Self {
            purpose: OraclePurpose::Chat,
            turns,
            image: None,
        }
    }

    pub fn vision(prompt: impl Into<String>, image: InlineImage) -> Self {
        Self {
            purpose: OraclePurpose::Vision,
            turns: vec![Turn::user(prompt)],
            image: Some(image),
        }
    }
}

#[async_trait]
pub trait Oracle: Send + Sync {
    /// Return the text of the first candidate.
    async fn generate(&self, request: OracleRequest) -> Result<String, OracleError>;
}

/// Used when no API key is configured. Every call fails immediately so the
/// fallback paths take over.
#[derive(Debug, Default, Clone)]
pub struct DisabledOracle;

#[async_trait]
impl Oracle for DisabledOracle {
    async fn generate(&self, _request: OracleRequest) -> Result<String, OracleError> {
        Err(OracleError::Unavailable("no API key configured".to_string()))
    }
}

/// Build the oracle described by the configuration.
pub fn from_config(config: &OracleConfig) -> anyhow::Result<Arc<dyn Oracle>> {
    match &config.api_key {
        Some(_) => {
            info!("Using Gemini oracle at {}", config.base_url);
            Ok(Arc::new(GeminiOracle::new(config.clone())?))
        }
        None => {
            info!("GEMINI_API_KEY not set, oracle disabled; heuristic fallbacks will be used");
            Ok(Arc::new(DisabledOracle))
        }
    }
}

/// Strip Markdown code fences and keep the outermost JSON object, if any.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_from_fenced_reply() {
        let raw = "```json\n{\"risk_percentage\": 40}\n```";
        assert_eq!(extract_json_object(raw), Some("{\"risk_percentage\": 40}"));
    }

    #[test]
    fn no_object_when_braces_missing_or_reversed() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[tokio::test]
    async fn disabled_oracle_always_fails() {
        let err = DisabledOracle
            .generate(OracleRequest::text("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::Unavailable(_)));
    }
}
