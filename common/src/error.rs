//! エラー型

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    /// モデル応答をJSONにできなかった。`raw` は応答そのもの
    #[error("Parse error: {message}")]
    Parse { message: String, raw: String },

    #[error("Session error: {0}")]
    Session(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error = Error::Json(json_error);
        assert!(format!("{}", error).contains("JSON error"));
    }

    #[test]
    fn test_error_display_invalid_mode() {
        let error = Error::InvalidMode("barcode".to_string());
        assert_eq!(format!("{}", error), "Invalid mode: barcode");
    }

    #[test]
    fn test_parse_error_keeps_raw_out_of_display() {
        let error = Error::Parse {
            message: "expected value".to_string(),
            raw: "not json at all".to_string(),
        };
        assert_eq!(format!("{}", error), "Parse error: expected value");
        if let Error::Parse { raw, .. } = error {
            assert_eq!(raw, "not json at all");
        }
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }

    #[test]
    fn test_error_debug() {
        let error = Error::Session("busy".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("Session"));
        assert!(debug.contains("busy"));
    }
}
