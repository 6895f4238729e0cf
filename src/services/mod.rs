pub mod ai_service; // InferenceClient trait + errors
pub mod gemini; // Google Gemini generateContent
pub mod openrouter; // OpenRouter (OpenAI compatible)

use std::sync::Arc;

use crate::config::{Config, Provider};

pub use ai_service::{InferenceClient, InferenceError};
pub use gemini::GeminiService;
pub use openrouter::OpenRouterService;

/// Build the client for the configured provider.
pub fn build_inference_client(config: &Config) -> Arc<dyn InferenceClient> {
    match config.provider {
        Provider::Gemini => Arc::new(GeminiService::new(
            config.api_key.clone(),
            config.model.clone(),
            config.base_url.clone(),
            config.max_output_tokens,
        )),
        Provider::OpenRouter => Arc::new(OpenRouterService::new(
            config.api_key.clone(),
            config.model.clone(),
            config.base_url.clone(),
            config.max_output_tokens,
        )),
    }
}
