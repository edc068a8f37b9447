//! 解析セッションの状態
//!
//! `Idle -> Analyzing -> Success | Failed`、`reset` で `Idle` に戻る
//! 中間状態はない。結果かエラーのどちらか一方を一度に記録する

use crate::error::{Error, Result};
use crate::types::{AnalysisMode, AnalysisResult};

/// セッション状態
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Analyzing,
    Success(AnalysisResult),
    Failed(String),
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Analyzing => "analyzing",
            SessionState::Success(_) => "success",
            SessionState::Failed(_) => "failed",
        }
    }
}

/// 1ユーザーの解析セッション
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    state: SessionState,
    mode: AnalysisMode,
    images: Vec<String>,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            mode: AnalysisMode::Shelf,
            images: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// 現在の解析で保持している画像（データURI、選択順）
    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn is_busy(&self) -> bool {
        self.state == SessionState::Analyzing
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.state {
            SessionState::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SessionState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// 解析を開始
    ///
    /// `Idle` と `Failed`（再試行）から可能。完了済みの結果は
    /// 先にresetが必要。実行中の再送信は不可
    pub fn begin(&mut self, mode: AnalysisMode, images: Vec<String>) -> Result<()> {
        match self.state {
            SessionState::Idle | SessionState::Failed(_) => {
                self.mode = mode;
                self.images = images;
                self.state = SessionState::Analyzing;
                Ok(())
            }
            SessionState::Analyzing => Err(Error::Session("an analysis is already running".into())),
            SessionState::Success(_) => Err(Error::Session(
                "reset the session before analyzing new images".into(),
            )),
        }
    }

    pub fn succeed(&mut self, result: AnalysisResult) -> Result<()> {
        self.expect_analyzing()?;
        self.state = SessionState::Success(result);
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        self.expect_analyzing()?;
        self.state = SessionState::Failed(message.into());
        Ok(())
    }

    /// 保持画像と結果を捨てて `Idle` に戻る
    pub fn reset(&mut self) -> Result<()> {
        if self.is_busy() {
            return Err(Error::Session("cannot reset while analyzing".into()));
        }
        self.images.clear();
        self.state = SessionState::Idle;
        Ok(())
    }

    fn expect_analyzing(&self) -> Result<()> {
        if self.is_busy() {
            Ok(())
        } else {
            Err(Error::Session(format!(
                "no analysis running (state: {})",
                self.state.as_str()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShelfAnalysisResult;

    fn shelf_result() -> AnalysisResult {
        AnalysisResult::Shelf(ShelfAnalysisResult::default())
    }

    fn images() -> Vec<String> {
        vec!["data:image/jpeg;base64,AAAA".to_string()]
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = AnalysisSession::new();
        assert_eq!(session.state(), &SessionState::Idle);
        assert!(session.images().is_empty());
        assert!(session.result().is_none());
    }

    #[test]
    fn test_success_path() {
        let mut session = AnalysisSession::new();
        session.begin(AnalysisMode::Shelf, images()).unwrap();
        assert!(session.is_busy());
        assert_eq!(session.images().len(), 1);

        session.succeed(shelf_result()).unwrap();
        assert_eq!(session.result(), Some(&shelf_result()));
        assert!(session.error().is_none());
    }

    #[test]
    fn test_failure_then_retry() {
        let mut session = AnalysisSession::new();
        session.begin(AnalysisMode::Ingredients, images()).unwrap();
        session.fail("upstream down").unwrap();
        assert_eq!(session.error(), Some("upstream down"));
        assert!(session.result().is_none());

        session.begin(AnalysisMode::Shelf, images()).unwrap();
        assert_eq!(session.mode(), AnalysisMode::Shelf);
        assert!(session.error().is_none());
    }

    #[test]
    fn test_resubmission_while_busy_is_rejected() {
        let mut session = AnalysisSession::new();
        session.begin(AnalysisMode::Shelf, images()).unwrap();
        let err = session.begin(AnalysisMode::Shelf, images()).unwrap_err();
        assert!(matches!(err, Error::Session(_)));
        assert!(session.reset().is_err());
    }

    #[test]
    fn test_success_requires_reset_before_next_run() {
        let mut session = AnalysisSession::new();
        session.begin(AnalysisMode::Shelf, images()).unwrap();
        session.succeed(shelf_result()).unwrap();
        assert!(session.begin(AnalysisMode::Shelf, images()).is_err());

        session.reset().unwrap();
        assert_eq!(session.state(), &SessionState::Idle);
        assert!(session.images().is_empty());
        assert!(session.result().is_none());
        session.begin(AnalysisMode::Shelf, images()).unwrap();
    }

    #[test]
    fn test_settle_without_running_analysis() {
        let mut session = AnalysisSession::new();
        assert!(session.succeed(shelf_result()).is_err());
        assert!(session.fail("nope").is_err());
    }
}
