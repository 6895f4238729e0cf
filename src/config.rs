use std::env;
use std::net::SocketAddr;
use thiserror::Error;

use crate::services::gemini::{GEMINI_BASE_URL, GEMINI_MODEL};
use crate::services::openrouter::OPENROUTER_BASE_URL;

const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-flash-1.5";
const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set in .env file")]
    Missing(&'static str),

    #[error("unknown INFERENCE_PROVIDER '{0}' (expected 'gemini' or 'openrouter')")]
    UnknownProvider(String),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenRouter,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Provider::Gemini => "gemini",
            Provider::OpenRouter => "openrouter",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone)]
pub struct Config {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub bind_addr: SocketAddr,
    pub max_image_bytes: usize,
    pub max_output_tokens: u32,
}

// Keep the API key out of debug logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("bind_addr", &self.bind_addr)
            .field("max_image_bytes", &self.max_image_bytes)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

impl Config {
    /// Read configuration from the process environment (after `dotenv`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let provider = match get("INFERENCE_PROVIDER")
            .map(|p| p.trim().to_lowercase())
            .as_deref()
        {
            None | Some("gemini") => Provider::Gemini,
            Some("openrouter") => Provider::OpenRouter,
            Some(other) => return Err(ConfigError::UnknownProvider(other.to_string())),
        };

        let (api_key, model, base_url) = match provider {
            Provider::Gemini => (
                get("GOOGLE_API_KEY").ok_or(ConfigError::Missing("GOOGLE_API_KEY"))?,
                get("GEMINI_MODEL").unwrap_or_else(|| GEMINI_MODEL.to_string()),
                get("GEMINI_BASE_URL").unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
            ),
            Provider::OpenRouter => (
                get("OPENROUTER_API_KEY").ok_or(ConfigError::Missing("OPENROUTER_API_KEY"))?,
                get("OPENROUTER_MODEL").unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
                get("OPENROUTER_BASE_URL").unwrap_or_else(|| OPENROUTER_BASE_URL.to_string()),
            ),
        };

        let bind_addr = parse_or("BIND_ADDR", get("BIND_ADDR"), || SocketAddr::from(([0, 0, 0, 0], 8080)))?;
        let max_image_bytes = parse_or("MAX_IMAGE_BYTES", get("MAX_IMAGE_BYTES"), || DEFAULT_MAX_IMAGE_BYTES)?;
        let max_output_tokens =
            parse_or("MAX_OUTPUT_TOKENS", get("MAX_OUTPUT_TOKENS"), || DEFAULT_MAX_OUTPUT_TOKENS)?;

        if max_image_bytes == 0 {
            return Err(ConfigError::Invalid {
                name: "MAX_IMAGE_BYTES",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            provider,
            api_key: api_key.trim().to_string(),
            model,
            base_url,
            bind_addr,
            max_image_bytes,
            max_output_tokens,
        })
    }
}

fn parse_or<T, D>(name: &'static str, raw: Option<String>, default: D) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    D: FnOnce() -> T,
{
    match raw {
        None => Ok(default()),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
