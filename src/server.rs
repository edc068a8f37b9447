//! HTTP解析エンドポイント
//!
//! ステートレス: リクエストごとに共有の不変dispatcherから
//! 上流呼び出しを組み立てる

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

use crate::analyzer::{ChatProvider, Dispatcher};
use crate::error::ShelfInsightError;

/// `POST /analyze` のボディ
///
/// 欠けたフィールドはボディ拒否ではなくバリデーションエラーにしたいので
/// 全部Option
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ErrorBody {
    fn from_error(err: &ShelfInsightError) -> Self {
        let (details, raw) = match err {
            ShelfInsightError::Upstream { body, .. } => (Some(body.clone()), None),
            ShelfInsightError::Parse { raw, .. } => (None, Some(raw.clone())),
            ShelfInsightError::Transport(msg) => (Some(msg.clone()), None),
            ShelfInsightError::Timeout(_) => (Some(err.to_string()), None),
            _ => (None, None),
        };

        Self {
            error: err.to_string(),
            details,
            raw,
        }
    }
}

impl IntoResponse for ShelfInsightError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.is_local() {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        } else {
            error!(status = status.as_u16(), error = %self, "Analysis failed");
        }

        (status, Json(ErrorBody::from_error(&self))).into_response()
    }
}

pub fn router<P: ChatProvider + 'static>(dispatcher: Arc<Dispatcher<P>>) -> Router {
    let body_limit = dispatcher.config().max_body_bytes;

    Router::new()
        .route("/analyze", post(analyze::<P>))
        .route("/api/analyze", post(analyze::<P>))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(dispatcher)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[instrument(skip_all)]
async fn analyze<P: ChatProvider + 'static>(
    State(dispatcher): State<Arc<Dispatcher<P>>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Invalid request body");
            let body = ErrorBody {
                error: "Invalid request body".into(),
                details: Some(rejection.body_text()),
                raw: None,
            };
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    let images = request.images.unwrap_or_default();
    let mode = request.mode.unwrap_or_default();
    let timeout = dispatcher.config().timeout();

    let outcome = tokio::time::timeout(
        timeout,
        dispatcher.dispatch(&images, &mode, request.model.as_deref()),
    )
    .await
    .unwrap_or_else(|_| Err(ShelfInsightError::Timeout(timeout.as_secs())));

    match outcome {
        Ok(outcome) => Json(outcome.document).into_response(),
        Err(err) => err.into_response(),
    }
}

/// プロセス終了まで待ち受ける
pub async fn start_server<P: ChatProvider + 'static>(
    addr: SocketAddr,
    dispatcher: Arc<Dispatcher<P>>,
) -> anyhow::Result<()> {
    let app = router(dispatcher);

    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, "HTTP API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
