//! テスト・オフラインデモ用の固定応答プロバイダ

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::types::ChatCompletionRequest;
use super::ChatProvider;
use crate::error::{Result, ShelfInsightError};

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Upstream { status: u16, body: String },
}

/// 固定の応答を返し、呼び出しを記録するプロバイダ
pub struct MockProvider {
    reply: MockReply,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_request: Mutex<Option<ChatCompletionRequest>>,
    last_api_key: Mutex<Option<String>>,
}

impl MockProvider {
    pub fn with_response(reply: impl Into<String>) -> Self {
        Self::from_reply(MockReply::Text(reply.into()))
    }

    /// 毎回上流エラーで失敗させる
    pub fn with_upstream_error(status: u16, body: impl Into<String>) -> Self {
        Self::from_reply(MockReply::Upstream {
            status,
            body: body.into(),
        })
    }

    fn from_reply(reply: MockReply) -> Self {
        Self {
            reply,
            delay: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            last_api_key: Mutex::new(None),
        }
    }

    /// 応答前に `delay` 待つ（遅い上流の再現用）
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatCompletionRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }

    pub fn last_api_key(&self) -> Option<String> {
        self.last_api_key.lock().ok().and_then(|k| k.clone())
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, api_key: &str, request: &ChatCompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }
        if let Ok(mut key) = self.last_api_key.lock() {
            *key = Some(api_key.to_string());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Upstream { status, body } => Err(ShelfInsightError::Upstream {
                status: *status,
                reason: "Mock Failure".to_string(),
                body: body.clone(),
            }),
        }
    }
}
