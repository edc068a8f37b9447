//! shelf-insight
//!
//! ホスト型ビジョン言語モデルによる商品棚・原材料表示の解析
//! HTTPサーバーとCLIの両方から使える

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod render;
pub mod report;
pub mod scanner;
pub mod server;
