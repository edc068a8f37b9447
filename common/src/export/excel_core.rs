//! Excel生成
//!
//! 結果ごとに1シート:
//! - shelf: "Shelf Analysis"（Product Name, Brand, Category, Price, Details）
//! - ingredients: "Ingredient Analysis"（Ingredient, Content, Origin）

use crate::types::AnalysisResult;
use rust_xlsxwriter::*;

/// 列幅（文字数単位）
const COLUMN_WIDTH: f64 = 24.0;
/// 自由記述列（details）の幅
const WIDE_COLUMN_WIDTH: f64 = 48.0;

/// 書き出すテーブル: ヘッダー + セル文字列の行
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub name: &'static str,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

/// 結果からテーブルを作る
pub fn sheet_table(result: &AnalysisResult) -> SheetTable {
    match result {
        AnalysisResult::Shelf(shelf) => SheetTable {
            name: "Shelf Analysis",
            headers: &["Product Name", "Brand", "Category", "Price", "Details"],
            rows: shelf
                .products
                .iter()
                .map(|p| {
                    vec![
                        p.name.clone(),
                        p.brand.clone(),
                        p.category.clone(),
                        p.price.clone().unwrap_or_default(),
                        p.details.clone(),
                    ]
                })
                .collect(),
        },
        AnalysisResult::Ingredients(data) => SheetTable {
            name: "Ingredient Analysis",
            headers: &["Ingredient", "Content", "Origin"],
            rows: data
                .ingredients
                .iter()
                .map(|i| {
                    vec![
                        i.name.clone(),
                        i.content.clone(),
                        i.origin.clone().unwrap_or_default(),
                    ]
                })
                .collect(),
        },
    }
}

/// ワークブックをバッファに生成
pub fn generate_excel_buffer(result: &AnalysisResult) -> Result<Vec<u8>, String> {
    let table = sheet_table(result);
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));

    let value_format = Format::new()
        .set_align(FormatAlign::Top)
        .set_text_wrap()
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(table.name)
        .map_err(|e| format!("sheet name error: {}", e))?;

    for (col, header) in table.headers.iter().enumerate() {
        let col = col as u16;
        let width = if *header == "Details" { WIDE_COLUMN_WIDTH } else { COLUMN_WIDTH };
        worksheet
            .set_column_width(col, width)
            .map_err(|e| format!("column width error: {}", e))?;
        worksheet
            .write_string_with_format(0, col, *header, &header_format)
            .map_err(|e| format!("header write error: {}", e))?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = row_idx as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            worksheet
                .write_string_with_format(row_num, col as u16, value, &value_format)
                .map_err(|e| format!("cell write error: {}", e))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| format!("workbook save error: {}", e))
}
