//! CLIラッパーと共有するエクスポートコア

#[cfg(feature = "excel")]
pub mod excel_core;
