//! 画像の縮小とデータURIエンコード
//!
//! 長辺が `max_dimension` に収まるよう縮小してJPEGで再エンコードし、
//! `data:image/jpeg;base64,...` にする。複数ファイルは並列処理し、
//! 出力は入力順を保つ

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use rayon::prelude::*;
use std::path::Path;

use super::ImageInfo;
use crate::error::{Result, ShelfInsightError};

/// 長辺を `max_dimension` に収めたときの `width` x `height` 画像の出力サイズ
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let scale = |short: u32, long: u32| -> u32 {
        ((short as f64 * max_dimension as f64) / long as f64).round().max(1.0) as u32
    };

    if width > height {
        if width > max_dimension {
            return (max_dimension, scale(height, width));
        }
    } else if height > max_dimension {
        return (scale(width, height), max_dimension);
    }

    (width, height)
}

fn downscale(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = target_dimensions(image.width(), image.height(), max_dimension);
    if (width, height) == (image.width(), image.height()) {
        image
    } else {
        image.resize_exact(width, height, FilterType::Triangle)
    }
}

/// デコード済み画像をエンコード
pub fn encode_dynamic_image(image: DynamicImage, max_dimension: u32, quality: u8) -> Result<String> {
    let rgb = downscale(image, max_dimension).to_rgb8();

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|e| ShelfInsightError::ImageLoad(format!("JPEG encode failed: {}", e)))?;

    Ok(to_data_uri("image/jpeg", &buffer))
}

/// 画像ファイル1枚を読み込み、縮小してエンコード
pub fn encode_image(path: &Path, max_dimension: u32, quality: u8) -> Result<String> {
    let image = image::open(path)
        .map_err(|e| ShelfInsightError::ImageLoad(format!("{}: {}", path.display(), e)))?;
    encode_dynamic_image(image, max_dimension, quality)
}

/// 入力順を保ったまま並列エンコード
pub fn encode_images(images: &[ImageInfo], max_dimension: u32, quality: u8) -> Result<Vec<String>> {
    images
        .par_iter()
        .map(|info| encode_image(&info.path, max_dimension, quality))
        .collect()
}

pub fn to_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// base64データURIをMIMEタイプとデコード済みバイト列に分ける
///
/// # Arguments
/// * `data_uri` - "data:image/jpeg;base64,/9j/4AAQ..." 形式
///
/// # Returns
/// base64データURIでなければ `None`
pub fn decode_data_uri(data_uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = data_uri.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime_type = meta.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some((mime_type.to_string(), bytes))
}
