use crate::error::{Result, ShelfInsightError};
use shelf_insight_common::export::excel_core::generate_excel_buffer;
use shelf_insight_common::{AnalysisMode, AnalysisResult};
use std::path::{Path, PathBuf};

/// モードごとのデフォルトファイル名
pub fn default_title(mode: AnalysisMode) -> &'static str {
    match mode {
        AnalysisMode::Shelf => "shelf_analysis",
        AnalysisMode::Ingredients => "ingredient_analysis",
    }
}

fn output_path_for_format(output: &Path, title: &str, extension: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", title, extension))
    } else {
        output.to_path_buf()
    }
}

/// 結果をxlsxとして書き出す
///
/// `output` はファイルでもフォルダでもよい。フォルダならモードの
/// デフォルト名で保存し、書き出したパスを返す
pub fn export_excel(result: &AnalysisResult, output: &Path) -> Result<PathBuf> {
    let path = output_path_for_format(output, default_title(result.mode()), "xlsx");

    let buffer = generate_excel_buffer(result).map_err(ShelfInsightError::ExcelGeneration)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, buffer)?;

    Ok(path)
}
