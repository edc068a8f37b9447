pub mod encode;

use crate::error::{Result, ShelfInsightError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub use encode::{decode_data_uri, encode_image, encode_images, target_dimensions, to_data_uri};

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| is_image_extension(&ext.to_string_lossy()))
        .unwrap_or(false)
}

fn image_info(path: &Path) -> ImageInfo {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    ImageInfo {
        path: path.to_path_buf(),
        file_name,
    }
}

/// `folder` 直下の画像（ファイル名順）
pub fn scan_folder(folder: &Path) -> Result<Vec<ImageInfo>> {
    if !folder.exists() {
        return Err(ShelfInsightError::NoImagesFound(folder.display().to_string()));
    }

    let mut images: Vec<ImageInfo> = WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && is_image_path(e.path()))
        .map(|e| image_info(e.path()))
        .collect();

    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(images)
}

/// CLI引数を画像リストに解決
///
/// ファイルは指定順のまま（拡張子不問）、フォルダは中の画像を
/// 名前順に展開
pub fn collect_images(paths: &[PathBuf]) -> Result<Vec<ImageInfo>> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_dir() {
            images.extend(scan_folder(path)?);
        } else if path.is_file() {
            images.push(image_info(path));
        } else {
            return Err(ShelfInsightError::NoImagesFound(path.display().to_string()));
        }
    }

    Ok(images)
}
