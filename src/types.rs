//! Shared types for Lucra+.
//!
//! The product table, pricing parameters and the derived metrics table.
//! Everything downstream (engine, sheets, api) depends on these so they
//! are kept free of any I/O concerns.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// A product as entered by hand or imported from a spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    /// Unit cost (R$).
    #[serde(default)]
    pub cost: f64,
    /// Unit selling price (R$).
    #[serde(default)]
    pub price: f64,
    /// Marketplace / card fee as a percentage of price.
    #[serde(default)]
    pub fee_percent: f64,
    /// Packaging, shipping and other per-unit costs (R$).
    #[serde(default)]
    pub other_costs: f64,
}

impl Product {
    pub fn new(name: impl Into<String>, cost: f64, price: f64, fee_percent: f64, other_costs: f64) -> Self {
        Self {
            name: name.into(),
            cost,
            price,
            fee_percent,
            other_costs,
        }
    }

    /// Copy with every non-finite amount replaced by 0.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.clone(),
            cost: finite_or_zero(self.cost),
            price: finite_or_zero(self.price),
            fee_percent: finite_or_zero(self.fee_percent),
            other_costs: finite_or_zero(self.other_costs),
        }
    }

    /// Manual-entry checks: a name is required and amounts can't be negative.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::EmptyName);
        }
        let fields = [
            ("cost", self.cost),
            ("price", self.price),
            ("fee_percent", self.fee_percent),
            ("other_costs", self.other_costs),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ProductError::InvalidAmount { field, value });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (custo R$ {:.2} | preço R$ {:.2} | taxa {:.1}% | outros R$ {:.2})",
            self.name, self.cost, self.price, self.fee_percent, self.other_costs,
        )
    }
}

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Pricing parameters
// ---------------------------------------------------------------------------

/// Parameters for a single engine run. Not validated by the engine;
/// range clamping belongs to the caller (see `config::PricingConfig`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingParams {
    pub target_margin_percent: f64,
    /// Total monthly fixed costs (rent, software, salary...).
    pub fixed_costs: f64,
    pub include_fixed_costs: bool,
}

impl Default for PricingParams {
    fn default() -> Self {
        Self {
            target_margin_percent: 30.0,
            fixed_costs: 0.0,
            include_fixed_costs: false,
        }
    }
}

impl PricingParams {
    /// Same parameters with the fixed-cost columns switched on or off.
    pub fn with_fixed_costs(self, include_fixed_costs: bool) -> Self {
        Self {
            include_fixed_costs,
            ..self
        }
    }
}

// ---------------------------------------------------------------------------
// Derived metrics
// ---------------------------------------------------------------------------

/// One row of the derived table. `None` means "no finite value exists"
/// and is kept distinct from zero all the way to the export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductMetrics {
    pub name: String,
    pub cost: f64,
    pub price: f64,
    pub fee_percent: f64,
    pub other_costs: f64,
    pub fee_amount: f64,
    pub net_profit: f64,
    pub current_margin_percent: f64,
    pub ideal_price: Option<f64>,
    pub ideal_price_diff_percent: Option<f64>,
    pub breakeven_units: Option<f64>,
    /// Present only when fixed costs were allocated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed: Option<FixedCostMetrics>,
}

/// Fixed-cost variant of the metrics for one product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FixedCostMetrics {
    pub allocated_fixed: f64,
    pub net_profit_with_fixed: f64,
    pub net_margin_percent: f64,
    pub ideal_price_with_fixed: Option<f64>,
    pub ideal_price_with_fixed_diff_percent: Option<f64>,
}

/// Portfolio-level figures shown above the per-product table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub product_count: usize,
    pub average_margin_percent: f64,
    pub negative_profit_count: usize,
    pub total_net_profit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_net_profit_with_fixed: Option<f64>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Rejections of a manually entered product.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProductError {
    #[error("Product name is required")]
    EmptyName,

    #[error("Invalid {field}: {value} (must be a non-negative number)")]
    InvalidAmount { field: &'static str, value: f64 },
}

/// Structural failures while reading an imported table.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("The spreadsheet has no header row")]
    EmptySheet,

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read workbook: {0}")]
    Workbook(String),

    #[error("Failed to read CSV: {0}")]
    Csv(String),
}

/// Failures while writing a results or template workbook.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No products to export")]
    NoProducts,

    #[error("Failed to write workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
