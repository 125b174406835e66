use std::collections::HashMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type RecipeId = i64;
pub type ProductId = i64;
pub type RecipeIngredientId = i64;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeType {
    /// Sellable dish; the only kind that participates in depletion.
    #[default]
    MenuItem,
    /// Intermediate preparation used as an ingredient.
    PreppedItem,
}

impl RecipeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MenuItem => "menu_item",
            Self::PreppedItem => "prepped_item",
        }
    }
}

impl std::fmt::Display for RecipeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecipeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "menu_item" => Ok(Self::MenuItem),
            "prepped_item" => Ok(Self::PreppedItem),
            other => Err(format!(
                "unknown recipe type \"{other}\" (expected \"menu_item\" or \"prepped_item\")"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    /// The list endpoint is already filtered by type, so a missing field
    /// reads as a menu item.
    #[serde(default)]
    pub recipe_type: RecipeType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Oz,
    Pcs,
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Oz => write!(f, "oz"),
            Self::Pcs => write!(f, "pcs"),
        }
    }
}

impl std::str::FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oz" => Ok(Self::Oz),
            "pcs" => Ok(Self::Pcs),
            other => Err(format!("unknown unit \"{other}\" (expected \"oz\" or \"pcs\")")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub unit: Option<Unit>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default, deserialize_with = "opt_decimal", skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<f64>,
    #[serde(default, deserialize_with = "opt_decimal", skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<f64>,
}

/// What a recipe ingredient points at. The names are the backend's
/// polymorphic type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IngredientKind {
    Product,
    /// A prepped-item recipe.
    Recipe,
}

impl std::fmt::Display for IngredientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Product => write!(f, "product"),
            Self::Recipe => write!(f, "recipe"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientSummary {
    pub name: String,
    #[serde(default)]
    pub unit: Option<Unit>,
}

/// One ingredient line of a recipe as the recipes endpoint returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: RecipeIngredientId,
    #[serde(deserialize_with = "decimal")]
    pub quantity: f64,
    #[serde(default)]
    pub ingredient_type: Option<IngredientKind>,
    #[serde(default)]
    pub ingredient_id: Option<i64>,
    #[serde(default)]
    pub ingredient: Option<IngredientSummary>,
}

impl RecipeIngredient {
    pub fn display_name(&self) -> &str {
        self.ingredient
            .as_ref()
            .map(|i| i.name.as_str())
            .unwrap_or("unnamed ingredient")
    }
}

/// A recipe together with its ingredient lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    #[serde(default)]
    pub recipe_ingredients: Vec<RecipeIngredient>,
}

/// Rails serializes decimal columns as strings; accept either form.
#[derive(Deserialize)]
#[serde(untagged)]
enum Decimal {
    Number(f64),
    Text(String),
}

impl Decimal {
    fn value<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            Decimal::Number(n) => Ok(n),
            Decimal::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid decimal \"{s}\""))),
        }
    }
}

fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Decimal::deserialize(deserializer)?.value()
}

fn opt_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<Decimal>::deserialize(deserializer)? {
        Some(d) => d.value().map(Some),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// CSV input
// ---------------------------------------------------------------------------

/// One parsed CSV line: header → cell, in file column order.
///
/// Headers are kept exactly as received. When a header repeats, the first
/// occurrence wins on lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRow {
    cells: Vec<(String, String)>,
}

impl CsvRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.cells.push((header.into(), value.into()));
    }

    /// Exact (case-sensitive) header lookup.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_ignore_case(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h.eq_ignore_ascii_case(header))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CsvRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = CsvRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Normalized item name → total units sold.
///
/// Keys iterate in first-seen order, which is the order the unmatched list
/// is reported in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesAggregate {
    entries: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl SalesAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` to the running total for `key` (starting from 0).
    pub fn add(&mut self, key: String, quantity: f64) {
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 += quantity,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, quantity));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.index.get(key).map(|&pos| self.entries[pos].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, q)| (k.as_str(), *q))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_units(&self) -> f64 {
        self.entries.iter().map(|(_, q)| q).sum()
    }
}

impl FromIterator<(String, f64)> for SalesAggregate {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut sales = SalesAggregate::new();
        for (k, q) in iter {
            sales.add(k, q);
        }
        sales
    }
}

impl Serialize for SalesAggregate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, q) in &self.entries {
            map.serialize_entry(k, q)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedDepletion {
    pub recipe: Recipe,
    pub quantity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchOutcome {
    /// Catalog order.
    pub matched: Vec<MatchedDepletion>,
    /// Aggregate order; normalized names with no recipe.
    pub unmatched: Vec<String>,
    /// Normalized keys that more than one recipe matched. Every such recipe
    /// is still in `matched` with the same quantity.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collisions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub source_hash: String,
    pub rows_parsed: usize,
    pub rows_skipped: usize,
    pub distinct_items: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub units_matched: f64,
    pub units_unmatched: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub sales: SalesAggregate,
    #[serde(flatten)]
    pub outcome: MatchOutcome,
}
