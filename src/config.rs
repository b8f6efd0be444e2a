use std::env;
use std::fmt;

use crate::error::StartupError;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
const DEFAULT_MODEL_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_TOP_P: f64 = 0.9;
const DEFAULT_TOP_K: u32 = 40;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 512;
const RESPONSE_MIME_TYPE: &str = "text/plain";

/// Sampling parameters sent with every request of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            top_k: DEFAULT_TOP_K,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            response_mime_type: RESPONSE_MIME_TYPE.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub model_base_url: String,
    pub model_timeout_secs: u64,
    pub system_prompt: Option<String>,
    pub generation: GenerationConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("model_base_url", &self.model_base_url)
            .field("model_timeout_secs", &self.model_timeout_secs)
            .field("system_prompt", &self.system_prompt)
            .field("generation", &self.generation)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, StartupError> {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(
        mut get_var: impl FnMut(&str) -> Option<String>,
    ) -> Result<Self, StartupError> {
        let api_key = get_var(API_KEY_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(StartupError::MissingCredential { var: API_KEY_VAR })?;

        let generation = GenerationConfig {
            temperature: parse_bounded_f64(
                get_var("MODEL_TEMPERATURE").as_deref(),
                0.0..=2.0,
                DEFAULT_TEMPERATURE,
            ),
            top_p: parse_bounded_f64(get_var("MODEL_TOP_P").as_deref(), 0.0..=1.0, DEFAULT_TOP_P),
            top_k: parse_positive_u32(get_var("MODEL_TOP_K").as_deref(), DEFAULT_TOP_K),
            max_output_tokens: parse_positive_u32(
                get_var("MODEL_MAX_OUTPUT_TOKENS").as_deref(),
                DEFAULT_MAX_OUTPUT_TOKENS,
            ),
            response_mime_type: RESPONSE_MIME_TYPE.to_string(),
        };

        Ok(Self {
            api_key,
            model: non_blank(get_var("MODEL")).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            model_base_url: non_blank(get_var("MODEL_BASE_URL"))
                .unwrap_or_else(|| DEFAULT_MODEL_BASE_URL.to_string()),
            model_timeout_secs: parse_positive_u64(
                get_var("MODEL_TIMEOUT_SECS").as_deref(),
                DEFAULT_MODEL_TIMEOUT_SECS,
            ),
            system_prompt: non_blank(get_var("SYSTEM_PROMPT")),
            generation,
        })
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_positive_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_positive_u32(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_bounded_f64(
    raw: Option<&str>,
    range: std::ops::RangeInclusive<f64>,
    default: f64,
) -> f64 {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| range.contains(value))
        .unwrap_or(default)
}
