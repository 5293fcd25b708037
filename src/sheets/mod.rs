//! Spreadsheet adapter.
//!
//! Maps the spreadsheet layout (Portuguese headers, several historical
//! spellings) onto the canonical product schema before anything reaches
//! the engine, and writes results back out as xlsx.

pub mod export;
pub mod import;

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::types::{ImportError, Product};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

pub const COL_NAME: &str = "Produto";
pub const COL_COST: &str = "Custo";
pub const COL_PRICE: &str = "Preco";
pub const COL_FEE: &str = "Taxa_pct";
pub const COL_OTHER: &str = "OutrosCustos";

/// Canonical column order, as written in the import template.
pub const CANONICAL_COLUMNS: [&str; 5] = [COL_NAME, COL_COST, COL_PRICE, COL_FEE, COL_OTHER];

/// Columns an import must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = [COL_NAME, COL_COST, COL_PRICE];

/// Alternate header spellings seen in older sheets and the manual-entry form.
const ALIASES: &[(&str, &str)] = &[
    ("Custo (R$)", COL_COST),
    ("Preço", COL_PRICE),
    ("Preço (R$)", COL_PRICE),
    ("Preco (R$)", COL_PRICE),
    ("Taxa (%)", COL_FEE),
    ("Outros Custos (R$)", COL_OTHER),
    ("Outros custos (R$)", COL_OTHER),
];

/// Resolve a header to its canonical column name, if it is one we know.
pub fn canonical_column(header: &str) -> Option<&'static str> {
    let header = header.trim();
    CANONICAL_COLUMNS
        .iter()
        .copied()
        .find(|c| *c == header)
        .or_else(|| {
            ALIASES
                .iter()
                .find(|(alias, _)| *alias == header)
                .map(|(_, canonical)| *canonical)
        })
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// A cell as read from any supported source.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// Numeric value of the cell; anything unparseable becomes 0.
    pub fn as_number(&self) -> f64 {
        match self {
            CellValue::Number(n) if n.is_finite() => *n,
            CellValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Empty => String::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Formats
// ---------------------------------------------------------------------------

/// Upload formats accepted by the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    /// xlsx, xls or ods, detected from the bytes.
    Workbook,
    Csv,
}

impl FromStr for SheetFormat {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xlsx" | "xls" | "ods" | "workbook" => Ok(SheetFormat::Workbook),
            "csv" => Ok(SheetFormat::Csv),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for SheetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetFormat::Workbook => write!(f, "workbook"),
            SheetFormat::Csv => write!(f, "csv"),
        }
    }
}

// ---------------------------------------------------------------------------
// Table → products
// ---------------------------------------------------------------------------

/// Turn a header row plus data rows into products.
///
/// Fails only when a required column is missing, naming every missing one.
/// Numeric cells that don't parse become 0; optional columns default to 0;
/// rows without a product name are skipped.
pub fn parse_table(headers: &[String], rows: &[Vec<CellValue>]) -> Result<Vec<Product>, ImportError> {
    let position = |column: &str| headers.iter().position(|h| canonical_column(h) == Some(column));

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| position(**c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingColumns(missing));
    }

    let name_idx = position(COL_NAME);
    let cost_idx = position(COL_COST);
    let price_idx = position(COL_PRICE);
    let fee_idx = position(COL_FEE);
    let other_idx = position(COL_OTHER);

    let mut products = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;

    for row in rows {
        let name = cell_at(row, name_idx);
        if name.is_blank() {
            if row.iter().any(|c| !c.is_blank()) {
                skipped += 1;
            }
            continue;
        }
        products.push(Product {
            name: name.as_text(),
            cost: cell_at(row, cost_idx).as_number(),
            price: cell_at(row, price_idx).as_number(),
            fee_percent: cell_at(row, fee_idx).as_number(),
            other_costs: cell_at(row, other_idx).as_number(),
        });
    }

    if skipped > 0 {
        warn!(skipped, "Rows without a product name were ignored");
    }

    Ok(products)
}

fn cell_at(row: &[CellValue], idx: Option<usize>) -> CellValue {
    idx.and_then(|i| row.get(i)).cloned().unwrap_or(CellValue::Empty)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
