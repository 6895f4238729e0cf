use anyhow::Result;
use base64::{engine::general_purpose, Engine};

use crate::handlers::{Export, ExportFormat, ResultRenderer};
use crate::models::{MenuAnalysis, ParseStatus};

pub const INDEX_HTML: &str = include_str!("../../static/index.html");
pub const STYLE_CSS: &str = include_str!("../../static/style.css");

/// Result page: text block, table and download links for one scan.
pub fn result_page(analysis: &MenuAnalysis) -> Result<String> {
    let result = &analysis.result;
    let mut body = String::new();

    body.push_str("<h2>Menu Items and Prices:</h2>\n");

    match &analysis.parse {
        ParseStatus::Fallback { .. } => body.push_str(
            "<p class=\"notice\">The model's reply could not be read as a menu, so no items are shown. \
             Try again with a sharper, well-lit photo.</p>\n",
        ),
        ParseStatus::Parsed if result.is_empty() => {
            body.push_str("<p class=\"notice\">No menu items were found in this photo.</p>\n")
        }
        ParseStatus::Parsed => {}
    }

    body.push_str(&format!(
        "<pre id=\"menu-text\">{}</pre>\n",
        escape_html(&ResultRenderer::text_block(result))
    ));

    let json = ResultRenderer::export(result, ExportFormat::Json)?;
    let text = ResultRenderer::export(result, ExportFormat::Text)?;
    body.push_str("<div class=\"downloads\">\n");
    body.push_str(&download_link(&json, "Download as JSON"));
    body.push_str(&download_link(&text, "Download as Text"));
    body.push_str("</div>\n");

    let table = ResultRenderer::table(result);
    if !table.rows.is_empty() {
        body.push_str("<h2>Menu Items Table</h2>\n<table>\n<thead><tr>");
        for header in table.headers {
            body.push_str(&format!("<th>{}</th>", header));
        }
        body.push_str("</tr></thead>\n<tbody>\n");
        for [name, price] in &table.rows {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>\n",
                escape_html(name),
                escape_html(price)
            ));
        }
        body.push_str("</tbody>\n</table>\n");
    }

    body.push_str(&format!(
        "<p class=\"muted\">Read by {} at {}</p>\n",
        escape_html(&analysis.model),
        analysis.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    Ok(layout("Menu Items", &body))
}

/// Visible failure page. Never used for "no items found".
pub fn error_page(title: &str, message: &str) -> String {
    let body = format!(
        "<h2>{}</h2>\n<p class=\"error\">{}</p>\n",
        escape_html(title),
        escape_html(message)
    );
    layout(title, &body)
}

fn download_link(export: &Export, label: &str) -> String {
    format!(
        "<a class=\"button\" download=\"{}\" href=\"data:{};base64,{}\">{}</a>\n",
        export.file_name(),
        export.mime_type(),
        general_purpose::STANDARD.encode(&export.bytes),
        label
    )
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{} - Smart Menu Scanner</title>\n<link rel=\"stylesheet\" href=\"/style.css\">\n</head>\n\
         <body>\n<main>\n<h1>Smart Menu Scanner</h1>\n{}<p><a href=\"/\">Scan another menu</a></p>\n</main>\n</body>\n</html>\n",
        escape_html(title),
        body
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
