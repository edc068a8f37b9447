//! 解析結果の型
//!
//! HTTPサーバーとCLIで共有:
//! - AnalysisMode: リクエストが使うプロンプトテンプレート
//! - ShelfAnalysisResult / Product: shelfモードの出力
//! - IngredientAnalysisResult / Ingredient: ingredientsモードの出力
//! - AnalysisResult: 上記どちらか（リクエストのモードで決まる）
//!
//! モデルにはこの形を頼んでいるだけで強制はできないので、
//! 全フィールドを寛容にデシリアライズする。欠けたフィールドはデフォルト、
//! 型違いのスカラーは文字列化、不正な `box_2d` は座標なしになる

use crate::error::{Error, Result};
use serde::de::{DeserializeOwned, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// 解析モード（プロンプトテンプレートを選ぶ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    Shelf,
    Ingredients,
}

impl AnalysisMode {
    pub const ALL: [AnalysisMode; 2] = [AnalysisMode::Shelf, AnalysisMode::Ingredients];

    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisMode::Shelf => "shelf",
            AnalysisMode::Ingredients => "ingredients",
        }
    }

    /// レポート・エクスポートの見出し
    pub fn label(self) -> &'static str {
        match self {
            AnalysisMode::Shelf => "Shelf Analysis",
            AnalysisMode::Ingredients => "Ingredient Analysis",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AnalysisMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| Error::InvalidMode(s.to_string()))
    }
}

/// 0-1000スケールの `[ymin, xmin, ymax, xmax]`
///
/// モデルがときどき省略するので各座標はOption
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub ymin: Option<f64>,
    pub xmin: Option<f64>,
    pub ymax: Option<f64>,
    pub xmax: Option<f64>,
}

impl BoundingBox {
    pub fn new(ymin: f64, xmin: f64, ymax: f64, xmax: f64) -> Self {
        Self {
            ymin: Some(ymin),
            xmin: Some(xmin),
            ymax: Some(ymax),
            xmax: Some(xmax),
        }
    }

    pub fn as_array(&self) -> [Option<f64>; 4] {
        [self.ymin, self.xmin, self.ymax, self.xmax]
    }

    /// 任意のJSON値から読む。配列以外は空の枠
    pub fn from_value(value: &Value) -> Self {
        let coord = |index: usize| value.get(index).and_then(coordinate);
        Self {
            ymin: coord(0),
            xmin: coord(1),
            ymax: coord(2),
            xmax: coord(3),
        }
    }
}

fn coordinate(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

impl Serialize for BoundingBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(4))?;
        for coord in self.as_array() {
            match coord {
                // 整数値は整数のまま出す（モデルの出力に合わせる）
                Some(c) if c.fract() == 0.0 && c.abs() < i64::MAX as f64 => {
                    seq.serialize_element(&(c as i64))?
                }
                other => seq.serialize_element(&other)?,
            }
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for BoundingBox {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(BoundingBox::from_value(&value))
    }
}

/// 棚で検出された商品
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,

    #[serde(deserialize_with = "lenient_string")]
    pub brand: String,

    #[serde(deserialize_with = "lenient_string")]
    pub category: String,

    #[serde(deserialize_with = "lenient_opt_string")]
    pub price: Option<String>,

    #[serde(deserialize_with = "lenient_string")]
    pub details: String,

    pub box_2d: BoundingBox,
}

/// shelfモードの結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfAnalysisResult {
    #[serde(deserialize_with = "lenient_vec")]
    pub products: Vec<Product>,

    #[serde(deserialize_with = "lenient_string")]
    pub market_analysis: String,
}

/// 原材料表示の1行
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ingredient {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,

    #[serde(deserialize_with = "lenient_string")]
    pub content: String,

    #[serde(deserialize_with = "lenient_opt_string")]
    pub origin: Option<String>,
}

/// ingredientsモードの結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngredientAnalysisResult {
    #[serde(deserialize_with = "lenient_string")]
    pub product_name: String,

    #[serde(deserialize_with = "lenient_vec")]
    pub ingredients: Vec<Ingredient>,

    #[serde(deserialize_with = "lenient_string")]
    pub origin_place: String,

    #[serde(deserialize_with = "lenient_string")]
    pub nutrition_facts: String,
}

/// 解析1往復の結果
///
/// ボディに判別子はないので、呼び出し側がリクエストのモードを渡す
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Shelf(ShelfAnalysisResult),
    Ingredients(IngredientAnalysisResult),
}

impl AnalysisResult {
    /// 正規化済み応答の型付きビュー
    ///
    /// オブジェクト以外のドキュメントだけエラー。欠けた・型違いのフィールドは
    /// 空欄になる
    pub fn from_value(mode: AnalysisMode, value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::Parse {
                message: format!("expected a JSON object for {} results", mode),
                raw: value.to_string(),
            });
        }

        let result = match mode {
            AnalysisMode::Shelf => AnalysisResult::Shelf(ShelfAnalysisResult::deserialize(value)?),
            AnalysisMode::Ingredients => {
                AnalysisResult::Ingredients(IngredientAnalysisResult::deserialize(value)?)
            }
        };
        Ok(result)
    }

    pub fn mode(&self) -> AnalysisMode {
        match self {
            AnalysisResult::Shelf(_) => AnalysisMode::Shelf,
            AnalysisResult::Ingredients(_) => AnalysisMode::Ingredients,
        }
    }

    pub fn as_shelf(&self) -> Option<&ShelfAnalysisResult> {
        match self {
            AnalysisResult::Shelf(shelf) => Some(shelf),
            AnalysisResult::Ingredients(_) => None,
        }
    }

    pub fn as_ingredients(&self) -> Option<&IngredientAnalysisResult> {
        match self {
            AnalysisResult::Ingredients(ingredients) => Some(ingredients),
            AnalysisResult::Shelf(_) => None,
        }
    }
}

/// 表示用の値。なし・空白なら `placeholder`
pub fn display_or<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => placeholder,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value).unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value).filter(|s| !s.trim().is_empty()))
}

/// 配列以外は空、オブジェクトでない要素は捨てる
fn lenient_vec<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}
