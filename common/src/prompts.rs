//! プロンプトテンプレート
//!
//! 解析モードごとに固定のsystem/userプロンプト1組:
//! - SHELF_TEMPLATE: バウンディングボックス付き商品検出 + 市場分析
//! - INGREDIENTS_TEMPLATE: 原材料表示と栄養成分の要約
//!
//! モード追加は `AnalysisMode` のvariantと `template_for` のarmを
//! 1つずつ足すだけ。dispatcherは変更不要

use crate::types::AnalysisMode;

/// 1モード分のsystem + userプロンプト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub system: &'static str,
    pub user: &'static str,
}

pub const SHELF_TEMPLATE: PromptTemplate = PromptTemplate {
    system: r#"You are an expert retail shelf analyzer. Analyze the shelf images provided.
You must detect all products on the shelf.

Return a VALID JSON object with the following structure:
{
  "products": [
    {
      "name": "Product Name",
      "brand": "Brand Name",
      "category": "Category",
      "price": "Price (if visible, else null)",
      "details": "Other details (flavor, size, etc.)",
      "box_2d": [ymin, xmin, ymax, xmax]
    }
  ],
  "market_analysis": "A comprehensive analysis of the shelf. What is the store selling? Is it premium or budget? What is the average price range? Provide market insights."
}

IMPORTANT: The 'box_2d' coordinates should be [ymin, xmin, ymax, xmax] normalized to 1000x1000.
Ensure the JSON is valid and parseable. Do not include markdown formatting like ```json."#,
    user: "Analyze these shelf images. Detect all products and provide market analysis.",
};

pub const INGREDIENTS_TEMPLATE: PromptTemplate = PromptTemplate {
    system: r#"You are an expert product ingredient analyzer. Analyze the product back/ingredient images.

Return a VALID JSON object with the following structure:
{
  "product_name": "Product Name",
  "ingredients": [
    {
      "name": "Ingredient Name",
      "content": "Content amount/percentage",
      "origin": "Origin (if available)"
    }
  ],
  "origin_place": "Country/Place of Origin",
  "nutrition_facts": "Summary of nutrition facts"
}

Ensure the JSON is valid and parseable. Do not include markdown formatting like ```json."#,
    user: "Analyze the ingredients and product details from these images.",
};

/// モードのテンプレート
pub fn template_for(mode: AnalysisMode) -> &'static PromptTemplate {
    match mode {
        AnalysisMode::Shelf => &SHELF_TEMPLATE,
        AnalysisMode::Ingredients => &INGREDIENTS_TEMPLATE,
    }
}

impl AnalysisMode {
    pub fn template(self) -> &'static PromptTemplate {
        template_for(self)
    }
}
