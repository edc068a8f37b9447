//! モデル応答の正規化
//!
//! モデルの応答テキストをJSONドキュメントにする。応答は素のJSONを
//! *頼んでいる*だけなので、戦略のチェーンを順に試し
//! 最初に有効なJSONを得たものを採用する:
//! 1. Direct: そのままパース
//! 2. StripFences: ```json / ``` を除去してパース
//! 3. TrailingCommas: さらに `}` / `]` 直前のカンマを除去してパース
//!
//! 全戦略が失敗したら応答をそのまま `Error::Parse` に入れて返す。
//! デフォルトデータで置き換えることはない

use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;

lazy_static! {
    /// 開始の ```json（改行込み）または終了の ```（直前の改行込み）
    static ref CODE_FENCE: Regex = Regex::new(r"(?i)```json\r?\n?|\r?\n?```").unwrap();
}

/// パースチェーンの許容ルール1つ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    Direct,
    StripFences,
    TrailingCommas,
}

/// `normalize` が順に試す戦略
pub const PARSE_CHAIN: &[ParseStrategy] = &[
    ParseStrategy::Direct,
    ParseStrategy::StripFences,
    ParseStrategy::TrailingCommas,
];

impl ParseStrategy {
    pub fn name(self) -> &'static str {
        match self {
            ParseStrategy::Direct => "direct",
            ParseStrategy::StripFences => "strip-fences",
            ParseStrategy::TrailingCommas => "trailing-commas",
        }
    }

    /// この戦略がJSONパーサーに渡すテキスト
    pub fn prepare(self, raw: &str) -> Cow<'_, str> {
        match self {
            ParseStrategy::Direct => Cow::Borrowed(raw),
            ParseStrategy::StripFences => strip_code_fences(raw),
            ParseStrategy::TrailingCommas => {
                Cow::Owned(remove_trailing_commas(&strip_code_fences(raw)))
            }
        }
    }

    pub fn apply(self, raw: &str) -> std::result::Result<Value, serde_json::Error> {
        serde_json::from_str(self.prepare(raw).trim())
    }
}

/// デフォルトのチェーンで応答を正規化
///
/// # Examples
/// ```
/// use shelf_insight_common::normalize;
///
/// let value = normalize("```json\n{\"a\":1}\n```").unwrap();
/// assert_eq!(value["a"], 1);
/// ```
pub fn normalize(raw: &str) -> Result<Value> {
    normalize_with(raw, PARSE_CHAIN).map(|(value, _)| value)
}

/// 指定したチェーンで応答を正規化
///
/// # Returns
/// * `Ok((Value, ParseStrategy))` - ドキュメントと成功した戦略
/// * `Err(Error::Parse)` - 全戦略が失敗。`raw` に応答そのもの
pub fn normalize_with(raw: &str, chain: &[ParseStrategy]) -> Result<(Value, ParseStrategy)> {
    let mut last_error = None;

    for &strategy in chain {
        match strategy.apply(raw) {
            Ok(value) => return Ok((value, strategy)),
            Err(e) => last_error = Some(format!("{} ({})", e, strategy.name())),
        }
    }

    Err(Error::Parse {
        message: last_error.unwrap_or_else(|| "no parse strategy configured".to_string()),
        raw: raw.to_string(),
    })
}

/// テキスト中のmarkdownコードフェンスを除去
pub fn strip_code_fences(text: &str) -> Cow<'_, str> {
    CODE_FENCE.replace_all(text, "")
}

/// `}` / `]` 直前のカンマを除去（文字列内は無視）
pub fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // =============================================
    // normalize
    // =============================================

    #[test]
    fn test_normalize_clean_json_matches_plain_parse() {
        let inputs = [
            r#"{"products": [], "market_analysis": "none"}"#,
            r#"{"a": 1, "b": [true, null, "x"]}"#,
            "[1, 2, 3]",
            "\"just a string\"",
        ];
        for input in inputs {
            let expected: Value = serde_json::from_str(input).unwrap();
            assert_eq!(normalize(input).unwrap(), expected, "input: {}", input);
        }
    }

    #[test]
    fn test_normalize_fenced_json() {
        let value = normalize("```json\n{\"a\":1}\n```").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_normalize_fenced_json_uppercase_and_crlf() {
        let value = normalize("```JSON\r\n{\"a\":1}\r\n```").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_normalize_bare_fence_without_language() {
        let value = normalize("```\n{\"a\":1}\n```").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_normalize_trailing_commas() {
        let raw = "```json\n{\"products\": [{\"name\": \"A, B\",},],}\n```";
        let (value, strategy) = normalize_with(raw, PARSE_CHAIN).unwrap();
        assert_eq!(strategy, ParseStrategy::TrailingCommas);
        assert_eq!(value, json!({"products": [{"name": "A, B"}]}));
    }

    #[test]
    fn test_normalize_reports_strategy() {
        let (_, strategy) = normalize_with("{\"a\":1}", PARSE_CHAIN).unwrap();
        assert_eq!(strategy, ParseStrategy::Direct);

        let (_, strategy) = normalize_with("```json\n{\"a\":1}\n```", PARSE_CHAIN).unwrap();
        assert_eq!(strategy, ParseStrategy::StripFences);
    }

    #[test]
    fn test_normalize_garbage_keeps_raw() {
        let raw = "not json at all";
        match normalize(raw) {
            Err(Error::Parse { raw: kept, message }) => {
                assert_eq!(kept, raw);
                assert!(message.contains("trailing-commas"));
            }
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_empty_reply() {
        assert!(matches!(normalize(""), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_chain_without_fence_strategy_fails_on_fences() {
        let raw = "```json\n{\"a\":1}\n```";
        let result = normalize_with(raw, &[ParseStrategy::Direct]);
        assert!(matches!(result, Err(Error::Parse { .. })));
    }

    #[test]
    fn test_empty_chain() {
        match normalize_with("{}", &[]) {
            Err(Error::Parse { message, .. }) => assert!(message.contains("no parse strategy")),
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    // =============================================
    // ヘルパー
    // =============================================

    #[test]
    fn test_strip_code_fences_with_surrounding_text() {
        let stripped = strip_code_fences("```json\n{\"a\": 1}\n```");
        assert_eq!(stripped, "{\"a\": 1}");
    }

    #[test]
    fn test_remove_trailing_commas_ignores_strings() {
        assert_eq!(remove_trailing_commas(r#"{"a": "x,}",}"#), r#"{"a": "x,}"}"#);
        assert_eq!(remove_trailing_commas(r#"{"a": "q\",]",}"#), r#"{"a": "q\",]"}"#);
        assert_eq!(remove_trailing_commas("[1, 2,\n  ]"), "[1, 2\n  ]");
        assert_eq!(remove_trailing_commas("[1, 2]"), "[1, 2]");
    }
}
