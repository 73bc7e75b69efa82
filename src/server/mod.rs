//! HTTP surface: `POST /preview` and `GET /health`.
//!
//! `/preview` always answers with `text/html`, failures included, so the
//! browser frontend can drop the body straight into an iframe.

use crate::config::RelayConfig;
use crate::core::pipeline::PreviewPipeline;
use crate::domain::model::GenerationRequest;
use crate::utils::error::{RelayError, Result};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<PreviewPipeline>,
    debug_errors: bool,
    health_probe: bool,
}

impl AppState {
    pub fn new(pipeline: PreviewPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            debug_errors: false,
            health_probe: false,
        }
    }

    pub fn with_debug_errors(mut self, debug_errors: bool) -> Self {
        self.debug_errors = debug_errors;
        self
    }

    pub fn with_health_probe(mut self, health_probe: bool) -> Self {
        self.health_probe = health_probe;
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct PreviewBody {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct HealthQuery {
    pub probe: Option<bool>,
}

pub fn build_router(state: AppState) -> Router {
    // 前端從不同 origin 呼叫
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/preview", post(preview))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: &RelayConfig, pipeline: PreviewPipeline) -> Result<()> {
    let state = AppState::new(pipeline)
        .with_debug_errors(config.server.debug_errors)
        .with_health_probe(config.server.health_probe);
    let router = build_router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        "🚀 Listening on http://{} (model: {}, translation: {})",
        addr,
        config.model.name,
        config.translation.enabled
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server exited");
    Ok(())
}

async fn preview(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PreviewBody>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::warn!("Rejected /preview body: {}", rejection.body_text());
            return PreviewFailure::new(
                RelayError::MalformedBody {
                    message: rejection.body_text(),
                },
                state.debug_errors,
            )
            .into_response();
        }
    };

    match state.pipeline.run(GenerationRequest::new(body.text)).await {
        Ok(result) => {
            let status = StatusCode::from_u16(result.status_code).unwrap_or(StatusCode::OK);
            (status, Html(result.html_document)).into_response()
        }
        Err(error) => PreviewFailure::new(error, state.debug_errors).into_response(),
    }
}

async fn health(State(state): State<AppState>, Query(query): Query<HealthQuery>) -> Response {
    let model = state.pipeline.model_name().to_string();
    let translation = state.pipeline.translation_enabled();
    let checked_at = chrono::Utc::now().to_rfc3339();

    if !query.probe.unwrap_or(state.health_probe) {
        return Json(serde_json::json!({
            "status": "ok",
            "model": model,
            "translation": translation,
            "checked_at": checked_at,
        }))
        .into_response();
    }

    match state.pipeline.probe_model().await {
        Ok(model) => Json(serde_json::json!({
            "status": "ok",
            "model": model,
            "translation": translation,
            "generation_service": "reachable",
            "checked_at": checked_at,
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!("⚠️ Health probe failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "error",
                    "model": model,
                    "translation": translation,
                    "generation_service": "unreachable",
                    "error": e.to_string(),
                    "checked_at": checked_at,
                })),
            )
                .into_response()
        }
    }
}

/// 所有 pipeline 錯誤只在這裡轉成 HTML 回應
pub struct PreviewFailure {
    error: RelayError,
    debug: bool,
}

impl PreviewFailure {
    pub fn new(error: RelayError, debug: bool) -> Self {
        Self { error, debug }
    }

    fn render(&self) -> String {
        let mut page = format!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Backend Error</title></head><body><h1>Backend Error</h1><p><strong>{}</strong>: {}</p>",
            self.error.category(),
            escape_html(&self.error.to_string())
        );

        if self.debug {
            let mut trace = format!("{:?}", self.error);
            let mut source = std::error::Error::source(&self.error);
            while let Some(cause) = source {
                trace.push_str("\n\nCaused by: ");
                trace.push_str(&cause.to_string());
                source = std::error::Error::source(cause);
            }
            page.push_str("<pre>");
            page.push_str(&escape_html(&trace));
            page.push_str("</pre>");
        }

        page.push_str("</body></html>");
        page
    }
}

impl IntoResponse for PreviewFailure {
    fn into_response(self) -> Response {
        tracing::error!(
            "❌ Preview failed: {} (category: {})",
            self.error,
            self.error.category()
        );
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Html(self.render())).into_response()
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_failure_page_hides_trace_without_debug() {
        let page = PreviewFailure::new(RelayError::upstream_status(503), false).render();
        assert!(page.contains("<h1>Backend Error</h1>"));
        assert!(page.contains("503"));
        assert!(!page.contains("<pre>"));
    }

    #[test]
    fn test_failure_page_includes_trace_with_debug() {
        let page = PreviewFailure::new(
            RelayError::Sanitization {
                message: "response missing expected document root".to_string(),
            },
            true,
        )
        .render();
        assert!(page.contains("<pre>"));
        assert!(page.contains("Sanitization {"));
    }
}
