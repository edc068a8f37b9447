//! 既知のビジョンモデルID
//!
//! 表示用のみ。モデルIDは検証せず上流に渡す

/// 選択可能なモデル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
}

/// リクエストでモデル未指定のときに使う
pub const DEFAULT_MODEL: &str = "qwen/qwen-2.5-vl-72b-instruct";

pub const MODELS: &[ModelInfo] = &[
    ModelInfo { id: DEFAULT_MODEL, name: "Qwen 2.5 VL 72B (Recommended)" },
    ModelInfo { id: "qwen/qwen-vl-max", name: "Qwen VL Max" },
    ModelInfo { id: "qwen/qwen-vl-plus", name: "Qwen VL Plus" },
    ModelInfo { id: "google/gemini-2.0-flash-exp:free", name: "Gemini 2.0 Flash (Fastest)" },
    ModelInfo { id: "google/gemini-1.5-flash", name: "Gemini 1.5 Flash" },
    ModelInfo { id: "google/gemini-1.5-pro", name: "Gemini 1.5 Pro" },
    ModelInfo { id: "openai/gpt-4o", name: "GPT-4o (Most Capable)" },
    ModelInfo { id: "openai/gpt-4o-mini", name: "GPT-4o Mini" },
];

pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_is_listed_first() {
        assert_eq!(MODELS[0].id, DEFAULT_MODEL);
        assert!(find_model(DEFAULT_MODEL).is_some());
    }

    #[test]
    fn test_unknown_model() {
        assert!(find_model("acme/vision-9000").is_none());
    }
}
