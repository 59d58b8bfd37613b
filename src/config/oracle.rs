use anyhow::Result;
use std::env;
use std::time::Duration;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Generative-AI oracle settings. Without an API key the oracle is disabled
/// and every caller uses its fallback.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub chat_model: String,
    pub vision_model: String,
    pub text_timeout: Duration,
    pub chat_timeout: Duration,
    pub vision_timeout: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            text_model: "gemini-2.0-flash".to_string(),
            chat_model: "gemini-1.5-flash".to_string(),
            vision_model: "gemini-1.5-flash".to_string(),
            text_timeout: Duration::from_secs(10),
            chat_timeout: Duration::from_secs(20),
            vision_timeout: Duration::from_secs(30),
        }
    }
}

impl OracleConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| {
            env::var(key)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        Ok(Self {
            api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            base_url: env::var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            text_model: env::var("GEMINI_TEXT_MODEL").unwrap_or(defaults.text_model),
            chat_model: env::var("GEMINI_CHAT_MODEL").unwrap_or(defaults.chat_model),
            vision_model: env::var("GEMINI_VISION_MODEL").unwrap_or(defaults.vision_model),
            text_timeout: secs("GEMINI_TEXT_TIMEOUT", defaults.text_timeout),
            chat_timeout: secs("GEMINI_CHAT_TIMEOUT", defaults.chat_timeout),
            vision_timeout: secs("GEMINI_VISION_TIMEOUT", defaults.vision_timeout),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}
