//! バウンディングボックスのオーバーレイ座標
//!
//! モデルは画像のピクセルサイズに関係なく `[ymin, xmin, ymax, xmax]` を
//! 0-1000スケールで返す。10で割るとパーセントになり、
//! 表示サイズに依存せずオーバーレイを配置できる
//!
//! 座標が使えない商品は個別にスキップする。
//! 1つの不正な枠が他の枠の描画を妨げることはない

use crate::types::{display_or, BoundingBox, Product};
use serde::Serialize;

/// 正規化座標の上限
pub const COORDINATE_SCALE: f64 = 1000.0;

/// 画像サイズに対するパーセントのオーバーレイ矩形
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlayRect {
    pub top: f64,
    pub left: f64,
    pub height: f64,
    pub width: f64,
}

/// ピクセル単位のオーバーレイ矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl OverlayRect {
    /// 正規化座標をパーセントに変換
    ///
    /// 座標が欠けている、または反転している場合は `None`
    /// 0-1000外の座標は先にクランプする
    pub fn from_box(b: &BoundingBox) -> Option<Self> {
        let ymin = clamp(b.ymin?);
        let xmin = clamp(b.xmin?);
        let ymax = clamp(b.ymax?);
        let xmax = clamp(b.xmax?);

        if ymax < ymin || xmax < xmin {
            return None;
        }

        Some(Self {
            top: ymin / 10.0,
            left: xmin / 10.0,
            height: (ymax - ymin) / 10.0,
            width: (xmax - xmin) / 10.0,
        })
    }

    /// 絶対配置オーバーレイ要素用のCSS
    pub fn css(&self) -> String {
        format!(
            "top: {}%; left: {}%; width: {}%; height: {}%;",
            self.top, self.left, self.width, self.height
        )
    }

    /// `image_width` x `image_height` ピクセルの画像にスケール
    ///
    /// 結果は必ず画像内に収まる
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> PixelRect {
        let scale = |percent: f64, extent: u32| -> u32 {
            ((percent / 100.0) * extent as f64).round().clamp(0.0, extent as f64) as u32
        };

        let x = scale(self.left, image_width);
        let y = scale(self.top, image_height);
        let right = scale(self.left + self.width, image_width);
        let bottom = scale(self.top + self.height, image_height);

        PixelRect {
            x,
            y,
            width: right.saturating_sub(x),
            height: bottom.saturating_sub(y),
        }
    }
}

fn clamp(coord: f64) -> f64 {
    coord.clamp(0.0, COORDINATE_SCALE)
}

/// 商品とそのオーバーレイの組
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductOverlay<'a> {
    /// 元の商品リストでの位置
    pub index: usize,
    pub product: &'a Product,
    pub rect: OverlayRect,
}

impl ProductOverlay<'_> {
    /// ホバーラベル: "商品名 - 価格"
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.product.name,
            display_or(self.product.price.as_deref(), "N/A")
        )
    }
}

/// 座標が使える商品のオーバーレイ（リスト順）
pub fn overlay_rects(products: &[Product]) -> Vec<ProductOverlay<'_>> {
    products
        .iter()
        .enumerate()
        .filter_map(|(index, product)| {
            OverlayRect::from_box(&product.box_2d).map(|rect| ProductOverlay {
                index,
                product,
                rect,
            })
        })
        .collect()
}
