use thiserror::Error;

use crate::models::CapturedImage;

/// Failures reaching or reading the hosted model. Never folded into an empty menu.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("could not reach the inference endpoint: {0}")]
    Transport(reqwest::Error),

    #[error("inference endpoint returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unexpected response envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error("model returned no text ({0})")]
    EmptyReply(String),
}

// Request URLs may carry credentials; keep them out of messages shown to users.
impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        InferenceError::Transport(err.without_url())
    }
}

impl InferenceError {
    /// Authentication or quota problems, as opposed to plain network trouble.
    pub fn is_auth_or_quota(&self) -> bool {
        matches!(self, InferenceError::Api { status, .. } if *status == 401 || *status == 403 || *status == 429)
    }
}

/// Trait for hosted multimodal models (Gemini, OpenRouter, etc.)
#[async_trait::async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send one prompt plus one image and return the model's raw text reply.
    async fn generate(&self, prompt: &str, image: &CapturedImage) -> Result<String, InferenceError>;

    /// Model identifier, shown next to the results.
    fn model(&self) -> &str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Canned replies for scanner and route tests.
    pub enum MockReply {
        Text(String),
        Status(u16, String),
    }

    pub struct MockInferenceClient {
        reply: MockReply,
        pub prompts: Mutex<Vec<String>>,
    }

    impl MockInferenceClient {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: MockReply::Text(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(status: u16, body: &str) -> Self {
            Self {
                reply: MockReply::Status(status, body.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl InferenceClient for MockInferenceClient {
        async fn generate(&self, prompt: &str, _image: &CapturedImage) -> Result<String, InferenceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                MockReply::Text(text) => Ok(text.clone()),
                MockReply::Status(status, body) => Err(InferenceError::Api {
                    status: *status,
                    body: body.clone(),
                }),
            }
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }
}
