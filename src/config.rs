//! Runtime configuration
//!
//! Read from the environment (after `.env` is loaded by the binary).

use crate::error::AssistantError;
use crate::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_MODEL: &str = "ibm-granite/granite-3.2-2b-instruct";
pub const DEFAULT_TEMPERATURE: f32 = 0.6;
pub const DEFAULT_TOP_P: f32 = 0.95;
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 512;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_PORT: u16 = 8080;

/// Settings for the hosted text-generation endpoint.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// `None` means the assistant runs without generative features.
    pub api_token: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    /// When set, replaces every feature's own output budget.
    pub max_new_tokens: Option<u32>,
    pub timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            max_new_tokens: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub inference: InferenceConfig,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            inference: InferenceConfig::default(),
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = lookup("HF_API_TOKEN")
            .or_else(|| lookup("HUGGINGFACE_TOKEN"))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let base_url = lookup("INFERENCE_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let inference = InferenceConfig {
            api_token,
            base_url,
            model: lookup("INFERENCE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: parse_or(&lookup, "INFERENCE_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            top_p: parse_or(&lookup, "INFERENCE_TOP_P", DEFAULT_TOP_P)?,
            max_new_tokens: lookup("INFERENCE_MAX_NEW_TOKENS")
                .map(|raw| parse_value("INFERENCE_MAX_NEW_TOKENS", &raw))
                .transpose()?,
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "INFERENCE_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
        };

        let port = match lookup("PORT").or_else(|| lookup("API_PORT")) {
            Some(raw) => parse_value("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        Ok(Self { inference, port })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AssistantError::ConfigError(format!("{} has an invalid value: {}", key, raw)))
}
