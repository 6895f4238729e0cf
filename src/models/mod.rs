use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    #[serde(deserialize_with = "price_as_string")]
    pub price: String,  // as printed: "$3.00", "12 TL", "3,50 €"
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuResult {
    pub items: Vec<MenuItem>,
}

impl MenuResult {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Models sometimes answer `"price": 3.5` instead of a string; keep the number's text.
fn price_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawPrice::deserialize(deserializer)? {
        RawPrice::Text(s) => s,
        RawPrice::Number(n) => n.to_string(),
    })
}

/// An uploaded still image, kept in memory for the duration of one scan.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl CapturedImage {
    /// Build an image from raw upload bytes.
    ///
    /// The format is sniffed from magic bytes; `declared` (the multipart
    /// content type or a file extension guess) is only trusted when sniffing
    /// fails and it is an `image/*` type. Returns `None` for empty or
    /// unrecognised uploads.
    pub fn from_upload(bytes: Vec<u8>, declared: Option<&str>) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }

        let mime_type = match sniff_image_mime(&bytes) {
            Some(mime) => mime.to_string(),
            None => {
                let declared = declared?.trim().to_ascii_lowercase();
                if !declared.starts_with("image/") || declared.len() == "image/".len() {
                    return None;
                }
                declared
            }
        };

        Some(Self { bytes, mime_type })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        match &bytes[8..12] {
            b"heic" | b"heix" | b"hevc" | b"hevx" => Some("image/heic"),
            b"mif1" | b"msf1" | b"heim" | b"heis" => Some("image/heif"),
            _ => None,
        }
    } else {
        None
    }
}

/// Whether the model's reply could be read as a menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseStatus {
    Parsed,
    Fallback { reason: String },
}

impl ParseStatus {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseStatus::Parsed)
    }
}

/// Outcome of one scan. Created per button press and dropped once rendered.
#[derive(Debug, Clone)]
pub struct MenuAnalysis {
    pub result: MenuResult,
    pub parse: ParseStatus,
    pub model: String,
    pub scanned_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_result_deserialization() {
        let json = r#"{"items":[{"name":"Coffee","price":"$3.00"},{"name":"Tea","price":"$2.50"}]}"#;
        let result: MenuResult = serde_json::from_str(json).unwrap();

        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].name, "Coffee");
        assert_eq!(result.items[0].price, "$3.00");
        assert_eq!(result.items[1].name, "Tea");
    }

    #[test]
    fn test_numeric_price_kept_as_text() {
        let json = r#"{"items":[{"name":"Ayran","price":3.5},{"name":"Su","price":10}]}"#;
        let result: MenuResult = serde_json::from_str(json).unwrap();

        assert_eq!(result.items[0].price, "3.5");
        assert_eq!(result.items[1].price, "10");
    }

    #[test]
    fn test_missing_price_is_rejected() {
        let json = r#"{"items":[{"name":"Coffee"}]}"#;
        assert!(serde_json::from_str::<MenuResult>(json).is_err());
    }

    #[test]
    fn test_sniff_formats() {
        let jpeg = CapturedImage::from_upload(vec![0xFF, 0xD8, 0xFF, 0xE0, 0, 0], None).unwrap();
        assert_eq!(jpeg.mime_type, "image/jpeg");

        let png = CapturedImage::from_upload(b"\x89PNG\r\n\x1a\n0000".to_vec(), None).unwrap();
        assert_eq!(png.mime_type, "image/png");

        let webp = CapturedImage::from_upload(b"RIFF\0\0\0\0WEBPVP8 ".to_vec(), None).unwrap();
        assert_eq!(webp.mime_type, "image/webp");

        let heic = CapturedImage::from_upload(b"\0\0\0\x18ftypheic0000".to_vec(), None).unwrap();
        assert_eq!(heic.mime_type, "image/heic");
    }

    #[test]
    fn test_sniffed_type_wins_over_declared() {
        let image = CapturedImage::from_upload(
            b"\x89PNG\r\n\x1a\n0000".to_vec(),
            Some("image/jpeg"),
        )
        .unwrap();
        assert_eq!(image.mime_type, "image/png");
    }

    #[test]
    fn test_declared_type_fallback() {
        let image = CapturedImage::from_upload(b"unknown-bytes".to_vec(), Some("Image/BMP")).unwrap();
        assert_eq!(image.mime_type, "image/bmp");

        assert!(CapturedImage::from_upload(b"hello".to_vec(), Some("text/plain")).is_none());
        assert!(CapturedImage::from_upload(b"hello".to_vec(), Some("image/")).is_none());
        assert!(CapturedImage::from_upload(b"hello".to_vec(), None).is_none());
    }

    #[test]
    fn test_empty_upload_rejected() {
        assert!(CapturedImage::from_upload(Vec::new(), Some("image/jpeg")).is_none());
    }
}
