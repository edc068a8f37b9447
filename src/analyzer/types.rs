//! Chat-completionの送受信型（OpenAI / OpenRouter形式）

use serde::{Deserialize, Serialize};

/// 送信リクエストボディ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// テキスト（システムプロンプト）またはマルチモーダルパーツ（ユーザーメッセージ）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    /// base64データURI
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            kind: "json_object".to_string(),
        }
    }
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }
}

/// 受信レスポンスボディ（読むフィールドのみ）
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: Option<ReplyMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// 最初のchoiceのテキスト
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let request = ChatCompletionRequest {
            model: "qwen/qwen-vl-max".into(),
            messages: vec![
                ChatMessage::system("be precise"),
                ChatMessage::user_parts(vec![
                    ContentPart::Text { text: "look".into() },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: "data:image/jpeg;base64,AAAA".into() },
                    },
                ]),
            ],
            response_format: ResponseFormat::json_object(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "qwen/qwen-vl-max",
                "messages": [
                    {"role": "system", "content": "be precise"},
                    {"role": "user", "content": [
                        {"type": "text", "text": "look"},
                        {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,AAAA"}}
                    ]}
                ],
                "response_format": {"type": "json_object"}
            })
        );
    }

    #[test]
    fn test_first_content() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "gen-1",
            "choices": [{"message": {"role": "assistant", "content": "{\"a\":1}"}}]
        }))
        .unwrap();
        assert_eq!(response.first_content(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_first_content_missing() {
        let response: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": []})).unwrap();
        assert_eq!(response.first_content(), None);

        let response: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": null}}]})).unwrap();
        assert_eq!(response.first_content(), None);
    }
}
