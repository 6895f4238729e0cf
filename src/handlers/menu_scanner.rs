use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{CapturedImage, MenuAnalysis, MenuResult, ParseStatus};
use crate::services::{InferenceClient, InferenceError};

pub const MENU_PROMPT: &str = "Analyze this menu image and extract all food/drink items with their prices.\n\
Return the data as a JSON string with this format:\n\
{\n\
    \"items\": [\n\
        {\"name\": \"item name\", \"price\": \"price\"}\n\
    ]\n\
}\n\
Copy each price exactly as printed, including any currency symbol.\n\
Only return the JSON string, no other text.";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Turn raw upload bytes into an image the model can read.
pub fn capture_from_upload(bytes: Vec<u8>, declared_type: Option<&str>) -> Result<CapturedImage, ScanError> {
    if bytes.is_empty() {
        return Err(ScanError::InvalidImage("no image was uploaded".to_string()));
    }

    let size = bytes.len();
    CapturedImage::from_upload(bytes, declared_type).ok_or_else(|| {
        ScanError::InvalidImage(format!(
            "unrecognised image format ({} bytes, declared {})",
            size,
            declared_type.unwrap_or("nothing")
        ))
    })
}

pub struct MenuScanner {
    client: Arc<dyn InferenceClient>,
}

impl MenuScanner {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// One scan: one inference call, one parse attempt.
    ///
    /// Transport and API failures are returned as errors. A reply that is not
    /// a menu document is not an error: it yields an empty result marked
    /// `ParseStatus::Fallback`.
    pub async fn analyze(&self, image: &CapturedImage) -> Result<MenuAnalysis, ScanError> {
        log::info!("📸 Analyzing menu image ({} bytes, {})", image.len(), image.mime_type);

        let reply = self.client.generate(MENU_PROMPT, image).await?;
        let (result, parse) = parse_menu_reply(&reply);

        match &parse {
            ParseStatus::Parsed => log::info!("✅ Extracted {} menu items", result.items.len()),
            ParseStatus::Fallback { reason } => log::warn!("⚠️ Falling back to empty menu: {}", reason),
        }

        Ok(MenuAnalysis {
            result,
            parse,
            model: self.client.model().to_string(),
            scanned_at: Utc::now(),
        })
    }
}

/// Interpret a model reply as a `MenuResult`, degrading to an empty result.
pub fn parse_menu_reply(reply: &str) -> (MenuResult, ParseStatus) {
    let json_str = strip_code_fences(reply);

    match serde_json::from_str::<MenuResult>(json_str) {
        Ok(result) => (result, ParseStatus::Parsed),
        Err(e) => {
            log::warn!(
                "Could not parse menu reply: {} (raw: {})",
                e,
                &reply[..floor_char_boundary(reply, 200)]
            );
            (
                MenuResult::default(),
                ParseStatus::Fallback {
                    reason: e.to_string(),
                },
            )
        }
    }
}

/// Models like to wrap JSON in ```json fences despite being told not to.
fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", ...) up to the first newline.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut idx = max;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
