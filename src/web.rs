// HTML pages (capture form, results, errors)
#[cfg(feature = "web-server")]
pub mod pages;

// Axum integration (optional - requires axum dependency)
#[cfg(feature = "web-server")]
pub mod server {
    use axum::{
        extract::{DefaultBodyLimit, Multipart, Path, State},
        http::{header, StatusCode},
        response::{Html, IntoResponse, Response},
        routing::{get, post},
        Json, Router,
    };
    use chrono::{DateTime, Utc};
    use serde::Serialize;
    use std::sync::Arc;
    use tower::ServiceBuilder;
    use tower_http::limit::RequestBodyLimitLayer;

    use super::pages;
    use crate::handlers::{capture_from_upload, ExportFormat, MenuScanner, ResultRenderer, ScanError};
    use crate::models::{MenuAnalysis, MenuItem, MenuResult};
    use crate::services::InferenceError;

    /// Room for multipart boundaries and part headers on top of the image itself.
    const MULTIPART_OVERHEAD: usize = 64 * 1024;

    pub struct AppState {
        pub scanner: MenuScanner,
    }

    pub fn create_router(scanner: MenuScanner, max_image_bytes: usize) -> Router {
        let state = Arc::new(AppState { scanner });

        Router::new()
            .route("/", get(root_handler))
            .route("/style.css", get(style_handler))
            .route("/analyze", post(analyze_page_handler))
            .route("/api/analyze", post(analyze_api_handler))
            .route("/api/export/:format", post(export_handler))
            .route("/health", get(health_check))
            .layer(
                ServiceBuilder::new()
                    .layer(DefaultBodyLimit::disable())
                    .layer(RequestBodyLimitLayer::new(max_image_bytes.saturating_add(MULTIPART_OVERHEAD))),
            )
            .with_state(state)
    }

    /// A failed scan, already classified for the user.
    #[derive(Debug)]
    struct Failure {
        status: StatusCode,
        kind: &'static str,
        title: &'static str,
        message: String,
    }

    impl From<ScanError> for Failure {
        fn from(err: ScanError) -> Self {
            match err {
                ScanError::InvalidImage(message) => Failure {
                    status: StatusCode::BAD_REQUEST,
                    kind: "invalid_image",
                    title: "That photo could not be used",
                    message,
                },
                ScanError::Inference(e) => {
                    let message = match &e {
                        InferenceError::Transport(_) => format!("The menu reader could not be reached: {}", e),
                        InferenceError::Api { .. } if e.is_auth_or_quota() => {
                            format!("The menu reader rejected the request (check the API key or quota): {}", e)
                        }
                        InferenceError::Api { .. } => format!("The menu reader failed: {}", e),
                        InferenceError::Envelope(_) | InferenceError::EmptyReply(_) => {
                            format!("The menu reader gave no usable answer: {}", e)
                        }
                    };
                    Failure {
                        status: StatusCode::BAD_GATEWAY,
                        kind: "inference",
                        title: "Menu reader unavailable",
                        message,
                    }
                }
            }
        }
    }

    impl From<axum::extract::multipart::MultipartError> for Failure {
        fn from(err: axum::extract::multipart::MultipartError) -> Self {
            Failure {
                status: err.status(),
                kind: "upload",
                title: "Upload failed",
                message: err.body_text(),
            }
        }
    }

    /// Pull the `image` field out of the form and run one scan.
    async fn scan_upload(state: &AppState, mut multipart: Multipart) -> Result<MenuAnalysis, Failure> {
        let mut upload = None;

        while let Some(field) = multipart.next_field().await? {
            if field.name() != Some("image") {
                continue;
            }
            let declared = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;
            log::debug!("📥 Received image upload: {} bytes ({:?})", bytes.len(), declared);
            upload = Some((bytes.to_vec(), declared));
            break;
        }

        let (bytes, declared) = upload.unwrap_or_default();
        let image = capture_from_upload(bytes, declared.as_deref())?;

        Ok(state.scanner.analyze(&image).await?)
    }

    async fn analyze_page_handler(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
        let analysis = match scan_upload(&state, multipart).await {
            Ok(analysis) => analysis,
            Err(failure) => {
                log::error!("❌ Scan failed ({}): {}", failure.kind, failure.message);
                return (failure.status, Html(pages::error_page(failure.title, &failure.message))).into_response();
            }
        };

        match pages::result_page(&analysis) {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                log::error!("❌ Failed to render result page: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(pages::error_page("Rendering failed", &e.to_string())),
                )
                    .into_response()
            }
        }
    }

    #[derive(Serialize)]
    struct AnalyzeResponse<'a> {
        items: &'a [MenuItem],
        text: String,
        parsed: bool,
        model: &'a str,
        scanned_at: DateTime<Utc>,
    }

    #[derive(Serialize)]
    struct ErrorResponse<'a> {
        error: &'a str,
        kind: &'a str,
    }

    async fn analyze_api_handler(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
        match scan_upload(&state, multipart).await {
            Ok(analysis) => Json(AnalyzeResponse {
                items: &analysis.result.items,
                text: ResultRenderer::text_block(&analysis.result),
                parsed: analysis.parse.is_parsed(),
                model: &analysis.model,
                scanned_at: analysis.scanned_at,
            })
            .into_response(),
            Err(failure) => {
                log::error!("❌ Scan failed ({}): {}", failure.kind, failure.message);
                (
                    failure.status,
                    Json(ErrorResponse {
                        error: &failure.message,
                        kind: failure.kind,
                    }),
                )
                    .into_response()
            }
        }
    }

    /// Re-export a result the client already holds as a downloadable file.
    async fn export_handler(
        Path(format): Path<String>,
        Json(result): Json<MenuResult>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let format = ExportFormat::from_string(&format).ok_or(StatusCode::NOT_FOUND)?;

        let export = ResultRenderer::export(&result, format).map_err(|e| {
            log::error!("Failed to export menu: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, export.mime_type().to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", export.file_name()),
                ),
            ],
            export.bytes,
        ))
    }

    async fn root_handler() -> Html<&'static str> {
        Html(pages::INDEX_HTML)
    }

    async fn style_handler() -> impl IntoResponse {
        ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], pages::STYLE_CSS)
    }

    async fn health_check() -> &'static str {
        "OK"
    }

}
