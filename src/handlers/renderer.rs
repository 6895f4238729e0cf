use anyhow::Result;

use crate::models::MenuResult;

pub const TABLE_HEADERS: [&str; 2] = ["Name", "Price"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Text,
}

impl ExportFormat {
    /// Parse a format name as used in URLs and on the command line.
    pub fn from_string(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "txt" | "text" => Some(ExportFormat::Text),
            _ => None,
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "menu_items.json",
            ExportFormat::Text => "menu_items.txt",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Text => "text/plain; charset=utf-8",
        }
    }
}

/// A downloadable artifact.
#[derive(Debug, Clone)]
pub struct Export {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl Export {
    pub fn file_name(&self) -> &'static str {
        self.format.file_name()
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Table view: fixed headers, one row per item in extraction order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuTable {
    pub headers: [&'static str; 2],
    pub rows: Vec<[String; 2]>,
}

pub struct ResultRenderer;

impl ResultRenderer {
    /// `name: price` per line. Empty for an empty menu.
    pub fn text_block(result: &MenuResult) -> String {
        result
            .items
            .iter()
            .map(|item| format!("{}: {}\n", item.name, item.price))
            .collect()
    }

    pub fn table(result: &MenuResult) -> MenuTable {
        MenuTable {
            headers: TABLE_HEADERS,
            rows: result
                .items
                .iter()
                .map(|item| [item.name.clone(), item.price.clone()])
                .collect(),
        }
    }

    pub fn export(result: &MenuResult, format: ExportFormat) -> Result<Export> {
        let bytes = match format {
            ExportFormat::Json => serde_json::to_string_pretty(result)?.into_bytes(),
            ExportFormat::Text => Self::text_block(result).into_bytes(),
        };
        Ok(Export { format, bytes })
    }
}
