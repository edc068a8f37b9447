//! 解析リクエストのディスパッチャ
//!
//! モードのプロンプトと画像を1つのマルチモーダルchatリクエストにまとめ、
//! `ChatProvider` 経由で送信して応答を正規化する
//!
//! 入力チェックはすべてプロバイダ呼び出し前に行う:
//! 1. 認証情報あり
//! 2. 画像が1枚以上
//! 3. 既知のモード

pub mod mock;
pub mod openrouter;
pub mod types;

use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use shelf_insight_common::{find_model, normalize, AnalysisMode, AnalysisResult};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::{Result, ShelfInsightError};
pub use mock::MockProvider;
pub use openrouter::OpenRouterClient;
use types::{ChatCompletionRequest, ChatMessage, ContentPart, ImageUrl, ResponseFormat};

/// chat-completionバックエンド
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &str;

    /// リクエストを1件送り、assistantの応答テキストを返す
    async fn complete(&self, api_key: &str, request: &ChatCompletionRequest) -> Result<String>;
}

/// 正規化済み応答と、それを生成したモード・モデル
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub mode: AnalysisMode,
    pub model: String,
    /// モデルのJSONドキュメント（無加工）
    pub document: Value,
}

impl AnalysisOutcome {
    /// ドキュメントの寛容な型付きビュー
    pub fn result(&self) -> Result<AnalysisResult> {
        Ok(AnalysisResult::from_value(self.mode, &self.document)?)
    }
}

pub struct Dispatcher<P> {
    config: Config,
    provider: P,
}

impl<P: ChatProvider> Dispatcher<P> {
    pub fn new(config: Config, provider: P) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// 指定モデル。未指定・空白なら設定のデフォルト
    pub fn resolve_model<'a>(&'a self, model: Option<&'a str>) -> &'a str {
        model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(self.config.model.as_str())
    }

    /// 解析を1往復実行する
    ///
    /// # Arguments
    /// * `images` - base64画像データURI（選択順）
    /// * `mode` - "shelf" または "ingredients"
    /// * `model` - モデルID（検証せずそのまま渡す）
    #[instrument(skip_all, fields(mode = %mode, images = images.len(), provider = self.provider.name()))]
    pub async fn dispatch(
        &self,
        images: &[String],
        mode: &str,
        model: Option<&str>,
    ) -> Result<AnalysisOutcome> {
        let api_key = self.config.api_key()?;

        if images.is_empty() {
            return Err(ShelfInsightError::Validation("No images provided".into()));
        }

        let mode: AnalysisMode = mode
            .parse()
            .map_err(|_| ShelfInsightError::Validation("Invalid mode".into()))?;

        let model = self.resolve_model(model).to_string();
        if find_model(&model).is_none() {
            debug!(model = %model, "Model not in catalog, forwarding unchanged");
        }
        let request = build_chat_request(images, mode, &model);

        info!(model = %model, "Dispatching analysis");
        let started = Instant::now();
        let reply = self.provider.complete(api_key, &request).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let document = normalize(&reply).map_err(|e| {
            warn!(elapsed_ms, reply_len = reply.len(), "Model reply is not valid JSON");
            ShelfInsightError::from(e)
        })?;

        info!(elapsed_ms, "Analysis complete");
        Ok(AnalysisOutcome {
            mode,
            model,
            document,
        })
    }
}

/// モード用のchatリクエストを組み立てる
///
/// ユーザーメッセージはモードのユーザープロンプトの後に
/// 入力順で画像パーツを1枚ずつ並べたもの
pub fn build_chat_request(images: &[String], mode: AnalysisMode, model: &str) -> ChatCompletionRequest {
    let template = mode.template();

    let mut parts = Vec::with_capacity(images.len() + 1);
    parts.push(ContentPart::Text {
        text: template.user.to_string(),
    });
    parts.extend(images.iter().map(|url| ContentPart::ImageUrl {
        image_url: ImageUrl { url: url.clone() },
    }));

    ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::system(template.system), ChatMessage::user_parts(parts)],
        response_format: ResponseFormat::json_object(),
    }
}

#[cfg(test)]
mod tests {
    use super::types::{MessageContent, Role};
    use super::*;
    use serde_json::json;
    use shelf_insight_common::DEFAULT_MODEL;

    const SHELF_REPLY: &str = r#"{"products":[{"name":"Cola","brand":"Acme","category":"Drinks","price":"$1","details":"can","box_2d":[200,100,400,300]}],"market_analysis":"budget"}"#;

    fn config_with_key() -> Config {
        Config {
            api_key: Some("sk-or-test".into()),
            ..Config::default()
        }
    }

    fn images(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("data:image/jpeg;base64,IMG{}", i))
            .collect()
    }

    fn dispatcher(reply: &str) -> Dispatcher<MockProvider> {
        Dispatcher::new(config_with_key(), MockProvider::with_response(reply))
    }

    // =============================================
    // バリデーション（上流呼び出しなし）
    // =============================================

    #[tokio::test]
    async fn test_missing_credential() {
        let d = Dispatcher::new(Config::default(), MockProvider::with_response(SHELF_REPLY));
        let err = d.dispatch(&images(1), "shelf", None).await.unwrap_err();
        assert!(matches!(err, ShelfInsightError::Configuration(_)));
        assert_eq!(d.provider().call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_images() {
        let d = dispatcher(SHELF_REPLY);
        let err = d.dispatch(&[], "shelf", None).await.unwrap_err();
        match err {
            ShelfInsightError::Validation(msg) => assert_eq!(msg, "No images provided"),
            other => panic!("Expected Validation error, got {:?}", other),
        }
        assert_eq!(d.provider().call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_mode() {
        let d = dispatcher(SHELF_REPLY);
        let err = d.dispatch(&images(1), "barcode", None).await.unwrap_err();
        match err {
            ShelfInsightError::Validation(msg) => assert_eq!(msg, "Invalid mode"),
            other => panic!("Expected Validation error, got {:?}", other),
        }
        assert_eq!(d.provider().call_count(), 0);
        assert!(d.provider().last_request().is_none());
    }

    // =============================================
    // リクエスト構築
    // =============================================

    #[tokio::test]
    async fn test_request_preserves_image_order() {
        let d = dispatcher(SHELF_REPLY);
        d.dispatch(&images(3), "shelf", None).await.unwrap();

        let request = d.provider().last_request().unwrap();
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1].role, Role::User);

        let parts = match &request.messages[1].content {
            MessageContent::Parts(parts) => parts,
            other => panic!("Expected parts, got {:?}", other),
        };
        assert_eq!(parts.len(), 4);
        assert!(matches!(&parts[0], ContentPart::Text { text } if text.contains("shelf images")));
        for (i, part) in parts[1..].iter().enumerate() {
            match part {
                ContentPart::ImageUrl { image_url } => {
                    assert_eq!(image_url.url, format!("data:image/jpeg;base64,IMG{}", i))
                }
                other => panic!("Expected image part, got {:?}", other),
            }
        }
        assert_eq!(request.response_format, ResponseFormat::json_object());
    }

    #[tokio::test]
    async fn test_default_model_substituted() {
        let d = dispatcher(SHELF_REPLY);
        let outcome = d.dispatch(&images(1), "shelf", None).await.unwrap();
        assert_eq!(outcome.model, DEFAULT_MODEL);

        let outcome = d.dispatch(&images(1), "shelf", Some("  ")).await.unwrap();
        assert_eq!(outcome.model, DEFAULT_MODEL);
        assert_eq!(d.provider().last_request().unwrap().model, DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_model_passed_through_unvalidated() {
        let d = dispatcher(SHELF_REPLY);
        d.dispatch(&images(1), "shelf", Some("acme/unknown-model")).await.unwrap();
        assert_eq!(d.provider().last_request().unwrap().model, "acme/unknown-model");

        d.dispatch(&images(1), "shelf", Some(" openai/gpt-4o ")).await.unwrap();
        assert_eq!(d.provider().last_request().unwrap().model, " openai/gpt-4o ");
    }

    #[tokio::test]
    async fn test_credential_handed_to_provider() {
        let d = dispatcher(SHELF_REPLY);
        d.dispatch(&images(1), "shelf", None).await.unwrap();
        assert_eq!(d.provider().last_api_key().as_deref(), Some("sk-or-test"));
        assert_eq!(d.provider().call_count(), 1);
    }

    #[test]
    fn test_build_chat_request_uses_mode_template() {
        let request = build_chat_request(&images(1), AnalysisMode::Ingredients, "m");
        match &request.messages[0].content {
            MessageContent::Text(system) => assert!(system.contains("product_name")),
            other => panic!("Expected text, got {:?}", other),
        }
    }

    // =============================================
    // 応答処理
    // =============================================

    #[tokio::test]
    async fn test_shelf_reply() {
        let d = dispatcher(SHELF_REPLY);
        let outcome = d.dispatch(&images(1), "shelf", None).await.unwrap();
        assert_eq!(outcome.mode, AnalysisMode::Shelf);

        let result = outcome.result().unwrap();
        let shelf = result.as_shelf().unwrap();
        assert_eq!(shelf.products[0].name, "Cola");
        assert_eq!(shelf.market_analysis, "budget");
    }

    #[tokio::test]
    async fn test_fenced_ingredients_reply() {
        let reply = "```json\n{\"product_name\":\"Granola\",\"ingredients\":[],\"extra\":1}\n```";
        let d = dispatcher(reply);
        let outcome = d.dispatch(&images(2), "ingredients", None).await.unwrap();

        // 余分なフィールドもドキュメントに残る
        assert_eq!(
            outcome.document,
            json!({"product_name": "Granola", "ingredients": [], "extra": 1})
        );
        let result = outcome.result().unwrap();
        assert_eq!(result.as_ingredients().unwrap().product_name, "Granola");
    }

    #[tokio::test]
    async fn test_unparseable_reply_keeps_raw() {
        let d = dispatcher("not json at all");
        let err = d.dispatch(&images(1), "shelf", None).await.unwrap_err();
        match err {
            ShelfInsightError::Parse { raw, .. } => assert_eq!(raw, "not json at all"),
            other => panic!("Expected Parse error, got {:?}", other),
        }
        assert_eq!(d.provider().call_count(), 1);
    }

    #[tokio::test]
    async fn test_upstream_error_passes_through() {
        let d = Dispatcher::new(
            config_with_key(),
            MockProvider::with_upstream_error(429, "{\"error\":\"rate limited\"}"),
        );
        let err = d.dispatch(&images(1), "shelf", None).await.unwrap_err();
        match err {
            ShelfInsightError::Upstream { status, body, .. } => {
                assert_eq!(status, 429);
                assert!(body.contains("rate limited"));
            }
            other => panic!("Expected Upstream error, got {:?}", other),
        }
    }
}
