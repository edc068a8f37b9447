//! Shelf Insight 共通ライブラリ
//!
//! HTTPサーバーとCLIで共有する型とロジック

pub mod types;
pub mod error;
pub mod prompts;
pub mod models;
pub mod parser;
pub mod overlay;
pub mod session;
pub mod export;

pub use types::{
    display_or, AnalysisMode, AnalysisResult, BoundingBox, Ingredient, IngredientAnalysisResult,
    Product, ShelfAnalysisResult,
};
pub use error::{Error, Result};
pub use prompts::{template_for, PromptTemplate};
pub use models::{find_model, ModelInfo, DEFAULT_MODEL, MODELS};
pub use parser::{normalize, normalize_with, ParseStrategy, PARSE_CHAIN};
pub use overlay::{overlay_rects, OverlayRect, PixelRect, ProductOverlay};
pub use session::{AnalysisSession, SessionState};
