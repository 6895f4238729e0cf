use base64::{engine::general_purpose, Engine};
use serde::{Deserialize, Serialize};

use super::ai_service::{InferenceClient, InferenceError};
use crate::models::CapturedImage;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai";

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        #[serde(rename = "type")]
        content_type: String,
        text: String,
    },
    ImageUrl {
        #[serde(rename = "type")]
        content_type: String,
        image_url: ImageData,
    },
}

#[derive(Debug, Serialize)]
struct ImageData {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenRouterService {
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenRouterService {
    pub fn new(api_key: String, model: String, base_url: String, max_tokens: u32) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_tokens,
            client: reqwest::Client::new(),
        }
    }

    fn build_request(&self, prompt: &str, image: &CapturedImage) -> ChatRequest {
        let base64_image = general_purpose::STANDARD.encode(&image.bytes);
        let data_url = format!("data:{};base64,{}", image.mime_type, base64_image);
        log::debug!("🖼️ Image data URL created: {}... (first 100 chars)", &data_url[..100.min(data_url.len())]);

        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        content_type: "text".to_string(),
                        text: prompt.to_string(),
                    },
                    ContentPart::ImageUrl {
                        content_type: "image_url".to_string(),
                        image_url: ImageData { url: data_url },
                    },
                ],
            }],
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait::async_trait]
impl InferenceClient for OpenRouterService {
    async fn generate(&self, prompt: &str, image: &CapturedImage) -> Result<String, InferenceError> {
        log::debug!("📊 Image size: {} bytes ({})", image.len(), image.mime_type);

        let request = self.build_request(prompt, image);

        log::info!("🤖 Sending request to OpenRouter with model: {}", self.model);

        let response = self
            .client
            .post(format!("{}/api/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("X-Title", "Menu Scanner")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        log::debug!("📥 OpenRouter response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await?;
            log::error!("❌ OpenRouter API error ({}): {}", status, error_text);
            return Err(InferenceError::Api {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let response_text = response.text().await?;
        log::debug!("📄 Raw OpenRouter response size: {} bytes", response_text.len());

        let chat_response: ChatResponse = serde_json::from_str(&response_text)?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| InferenceError::EmptyReply("no choices with content".to_string()))?;

        log::info!("💬 OpenRouter replied with {} chars", content.len());
        Ok(content)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn test_image() -> CapturedImage {
        CapturedImage {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
            mime_type: "image/jpeg".to_string(),
        }
    }

    #[test]
    fn test_request_shape() {
        let service = OpenRouterService::new(
            "test_key".to_string(),
            "test_model".to_string(),
            OPENROUTER_BASE_URL.to_string(),
            300,
        );

        let request = service.build_request("List the items", &test_image());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "test_model");
        assert_eq!(json["max_tokens"], 300);
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][0]["text"], "List the items");
        assert_eq!(json["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(
            json["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,/9j/4A=="
        );
    }

    #[tokio::test]
    async fn test_generate_returns_message_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1/chat/completions")
                    .header("Authorization", "Bearer test_key");
                then.status(200).json_body(serde_json::json!({
                    "choices": [
                        { "message": { "content": "{\"items\":[]}" } }
                    ]
                }));
            })
            .await;

        let service = OpenRouterService::new(
            "test_key".to_string(),
            "test_model".to_string(),
            server.base_url(),
            300,
        );
        let reply = service.generate("prompt", &test_image()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "{\"items\":[]}");
    }

    #[tokio::test]
    async fn test_generate_surfaces_api_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/chat/completions");
                then.status(401).body("invalid key");
            })
            .await;

        let service = OpenRouterService::new(
            "bad".to_string(),
            "test_model".to_string(),
            server.base_url(),
            300,
        );
        let err = service.generate("prompt", &test_image()).await.unwrap_err();

        match err {
            InferenceError::Api { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_without_choices_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/chat/completions");
                then.status(200).json_body(serde_json::json!({ "choices": [] }));
            })
            .await;

        let service = OpenRouterService::new(
            "test_key".to_string(),
            "test_model".to_string(),
            server.base_url(),
            300,
        );
        let err = service.generate("prompt", &test_image()).await.unwrap_err();

        assert!(matches!(err, InferenceError::EmptyReply(_)));
    }
}
