//! ターミナル向けのプレーンテキストレポート

use shelf_insight_common::{
    display_or, find_model, overlay_rects, AnalysisResult, IngredientAnalysisResult, Product,
    ShelfAnalysisResult,
};
use std::fmt::Write;

const PLACEHOLDER: &str = "-";

pub fn render_report(result: &AnalysisResult) -> String {
    match result {
        AnalysisResult::Shelf(shelf) => render_shelf(shelf),
        AnalysisResult::Ingredients(data) => render_ingredients(data),
    }
}

fn render_shelf(shelf: &ShelfAnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Detected Products ({})", shelf.products.len());

    let rows: Vec<[&str; 4]> = shelf
        .products
        .iter()
        .map(|p| {
            [
                display_or(Some(&p.name), PLACEHOLDER),
                display_or(Some(&p.brand), PLACEHOLDER),
                display_or(Some(&p.category), PLACEHOLDER),
                display_or(p.price.as_deref(), PLACEHOLDER),
            ]
        })
        .collect();
    write_table(&mut out, ["Product", "Brand", "Category", "Price"], &rows);

    for (i, product) in shelf.products.iter().enumerate() {
        if !product.details.trim().is_empty() {
            let _ = writeln!(out, "  {}. {}: {}", i + 1, product.name, product.details);
        }
    }

    let _ = writeln!(out, "\nMarket Analysis");
    let _ = writeln!(out, "{}", display_or(Some(&shelf.market_analysis), PLACEHOLDER));
    out
}

fn render_ingredients(data: &IngredientAnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", display_or(Some(&data.product_name), PLACEHOLDER));

    let rows: Vec<[&str; 3]> = data
        .ingredients
        .iter()
        .map(|i| {
            [
                display_or(Some(&i.name), PLACEHOLDER),
                display_or(Some(&i.content), PLACEHOLDER),
                display_or(i.origin.as_deref(), PLACEHOLDER),
            ]
        })
        .collect();
    write_table(&mut out, ["Ingredient", "Content", "Origin"], &rows);

    let _ = writeln!(out, "\nOrigin: {}", display_or(Some(&data.origin_place), PLACEHOLDER));
    let _ = writeln!(out, "\nNutrition Facts");
    let _ = writeln!(out, "{}", display_or(Some(&data.nutrition_facts), PLACEHOLDER));
    out
}

/// カタログにあれば表示名付き、なければIDをそのまま返す
pub fn model_label(id: &str) -> String {
    match find_model(id) {
        Some(model) => format!("{} ({})", model.name, model.id),
        None => format!("{} (not in catalog, sent as-is)", id),
    }
}

/// 座標を持つ商品ごとに「番号. ラベル  CSS」の一行
pub fn box_listing(products: &[Product]) -> String {
    let mut out = String::new();
    for overlay in overlay_rects(products) {
        let _ = writeln!(out, "  {}. {}  {}", overlay.index + 1, overlay.label(), overlay.rect.css());
    }
    out
}

fn write_table<const N: usize>(out: &mut String, headers: [&str; N], rows: &[[&str; N]]) {
    let mut widths = headers.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |out: &mut String, cells: &[&str; N]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
    };

    line(out, &headers);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in rows {
        line(out, row);
    }
}
