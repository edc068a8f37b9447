use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShelfInsightError {
    /// 上流の認証情報なし（未送信）
    #[error("Configuration Error: {0}")]
    Configuration(String),

    /// 呼び出し側の入力不正（未送信）
    #[error("{0}")]
    Validation(String),

    /// プロバイダが非成功ステータスを返した
    #[error("OpenRouter API Error: {reason}")]
    Upstream {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("Upstream request failed: {0}")]
    Transport(String),

    #[error("Analysis timed out after {0} seconds")]
    Timeout(u64),

    /// フェンス除去後もJSONでない応答。`raw` は応答そのもの
    #[error("Failed to parse model response as JSON")]
    Parse { message: String, raw: String },

    #[error("Image load error: {0}")]
    ImageLoad(String),

    #[error("Excel generation error: {0}")]
    ExcelGeneration(String),

    #[error("No images found: {0}")]
    NoImagesFound(String),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(shelf_insight_common::Error),
}

impl From<shelf_insight_common::Error> for ShelfInsightError {
    fn from(err: shelf_insight_common::Error) -> Self {
        use shelf_insight_common::Error as CommonError;
        match err {
            CommonError::Parse { message, raw } => ShelfInsightError::Parse { message, raw },
            CommonError::InvalidMode(_) => ShelfInsightError::Validation("Invalid mode".into()),
            other => ShelfInsightError::Common(other),
        }
    }
}

impl ShelfInsightError {
    /// このエラーで返すHTTPステータス
    pub fn status_code(&self) -> u16 {
        match self {
            ShelfInsightError::Validation(_) => 400,
            ShelfInsightError::Upstream { status, .. } => *status,
            _ => 500,
        }
    }

    /// 上流呼び出し前に発生したエラーか
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ShelfInsightError::Configuration(_) | ShelfInsightError::Validation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ShelfInsightError>;
