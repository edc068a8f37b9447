//! バウンディングボックス描画
//!
//! shelf結果の位置が分かる商品をすべて画像に描く。ホバーオーバーレイの
//! ファイル版で、同じパーセント座標を画像のピクセルサイズに
//! スケールして使う

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use shelf_insight_common::{overlay_rects, Product};
use std::path::Path;
use tracing::debug;

use crate::error::{Result, ShelfInsightError};
use crate::scanner::decode_data_uri;

pub const BOX_COLOR: Rgb<u8> = Rgb([239, 68, 68]);
pub const BOX_THICKNESS: u32 = 2;

/// 商品枠を描画し、描いた数を返す
pub fn annotate_image(image: &mut RgbImage, products: &[Product]) -> usize {
    let (width, height) = image.dimensions();
    let mut drawn = 0;

    for overlay in overlay_rects(products) {
        let px = overlay.rect.to_pixels(width, height);

        for inset in 0..BOX_THICKNESS {
            let w = px.width.saturating_sub(inset * 2);
            let h = px.height.saturating_sub(inset * 2);
            if w == 0 || h == 0 {
                break;
            }
            let rect = Rect::at((px.x + inset) as i32, (px.y + inset) as i32).of_size(w, h);
            draw_hollow_rect_mut(image, rect, BOX_COLOR);
        }

        if px.width > 0 && px.height > 0 {
            debug!(index = overlay.index, label = %overlay.label(), "Box drawn");
            drawn += 1;
        }
    }

    drawn
}

/// ファイルパスまたはbase64データURIから画像を開く
pub fn load_image(source: &str) -> Result<DynamicImage> {
    if source.starts_with("data:") {
        let (_, bytes) = decode_data_uri(source)
            .ok_or_else(|| ShelfInsightError::ImageLoad("malformed data URI".into()))?;
        image::load_from_memory(&bytes)
            .map_err(|e| ShelfInsightError::ImageLoad(e.to_string()))
    } else {
        image::open(source).map_err(|e| ShelfInsightError::ImageLoad(format!("{}: {}", source, e)))
    }
}

/// `source` に枠を描いて `output` に書き出す
///
/// 出力形式は出力ファイルの拡張子で決まる
pub fn annotate_file(source: &str, products: &[Product], output: &Path) -> Result<usize> {
    let mut image = load_image(source)?.to_rgb8();
    let drawn = annotate_image(&mut image, products);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    image
        .save(output)
        .map_err(|e| ShelfInsightError::ImageLoad(format!("{}: {}", output.display(), e)))?;

    Ok(drawn)
}
