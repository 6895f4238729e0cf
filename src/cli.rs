use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use crate::handlers::{capture_from_upload, Export, ExportFormat, MenuScanner, ResultRenderer};

#[derive(Parser, Debug)]
#[command(name = "menu-scanner")]
#[command(about = "Extract menu items and prices from a photo of a menu")]
#[command(version)]
pub struct Cli {
    /// Menu photo to scan once. Without it the web server is started.
    pub image: Option<PathBuf>,

    /// Output format for a one-shot scan
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also write the export to this file (or into this directory)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ExportFormat::Text,
            OutputFormat::Json => ExportFormat::Json,
        }
    }
}

/// Scan one image file and return the chosen export.
pub async fn scan_file(scanner: &MenuScanner, image_path: &Path, format: ExportFormat) -> Result<Export> {
    let bytes = tokio::fs::read(image_path)
        .await
        .with_context(|| format!("failed to read {}", image_path.display()))?;

    let image = capture_from_upload(bytes, guess_mime_from_extension(image_path))?;
    let analysis = scanner.analyze(&image).await?;

    if !analysis.parse.is_parsed() {
        log::warn!("⚠️ The model's reply could not be read as a menu; exporting an empty result");
    }

    ResultRenderer::export(&analysis.result, format)
}

/// Write an export to `out`, using the export's own file name if `out` is a directory.
pub async fn write_export(export: &Export, out: &Path) -> Result<PathBuf> {
    let target = if tokio::fs::metadata(out).await.map(|m| m.is_dir()).unwrap_or(false) {
        out.join(export.file_name())
    } else {
        out.to_path_buf()
    };

    tokio::fs::write(&target, &export.bytes)
        .await
        .with_context(|| format!("failed to write {}", target.display()))?;

    log::info!("💾 Wrote {} bytes to {}", export.bytes.len(), target.display());
    Ok(target)
}

fn guess_mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}
