//! xlsx export of the derived table, plus the blank import template.

use chrono::{DateTime, TimeZone};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};
use tracing::info;

use super::CANONICAL_COLUMNS;
use crate::engine;
use crate::types::{ExportError, PricingParams, Product, ProductMetrics};

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const SHEET_WITHOUT_FIXED: &str = "Sem Custos Fixos";
pub const SHEET_WITH_FIXED: &str = "Com Custos Fixos";
pub const TEMPLATE_SHEET: &str = "Modelo Lucra+";
pub const TEMPLATE_FILE_NAME: &str = "Modelo_Lucra_Plus.xlsx";

const RESULT_HEADERS: [&str; 11] = [
    "Produto",
    "Custo",
    "Preco",
    "Taxa_pct",
    "OutrosCustos",
    "Taxa_R$",
    "Lucro_Líquido (R$)",
    "Margem (%)",
    "Preço Ideal (R$)",
    "Diferença Preço Ideal (%)",
    "Ponto de Equilíbrio (unid)",
];

const FIXED_HEADERS: [&str; 5] = [
    "Custo Fixo Alocado (R$)",
    "Lucro c/ Custos Fixos (R$)",
    "Margem Líquida (%)",
    "Preço Ideal c/ Custos Fixos (R$)",
    "Diferença Preço Ideal c/ Fixos (%)",
];

/// Example rows shipped in the import template.
const TEMPLATE_ROWS: [(&str, f64, f64, f64, f64); 3] = [
    ("Camiseta Azul", 25.0, 50.0, 2.5, 0.0),
    ("Caneca Logo", 18.0, 35.0, 3.0, 0.0),
    ("Bolo Pequeno", 12.0, 30.0, 5.0, 1.5),
];

/// Build the results workbook.
///
/// The "without fixed costs" sheet is always written. With
/// `with_comparison` a second sheet carries the fixed-cost allocation so
/// both views can be compared side by side. Undefined values are left as
/// blank cells.
pub fn export_results(
    products: &[Product],
    params: &PricingParams,
    with_comparison: bool,
) -> Result<Vec<u8>, ExportError> {
    if products.is_empty() {
        return Err(ExportError::NoProducts);
    }

    let header = header_format();
    let mut workbook = Workbook::new();

    let without_fixed = engine::compute(products, &params.with_fixed_costs(false));
    write_results_sheet(workbook.add_worksheet(), SHEET_WITHOUT_FIXED, &without_fixed, &header)?;

    if with_comparison {
        let with_fixed = engine::compute(products, &params.with_fixed_costs(true));
        write_results_sheet(workbook.add_worksheet(), SHEET_WITH_FIXED, &with_fixed, &header)?;
    }

    let bytes = workbook.save_to_buffer()?;
    info!(
        products = products.len(),
        sheets = if with_comparison { 2 } else { 1 },
        size = bytes.len(),
        "Results workbook built"
    );
    Ok(bytes)
}

/// The downloadable import template: canonical headers and three sample products.
pub fn template_workbook() -> Result<Vec<u8>, ExportError> {
    let header = header_format();
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(TEMPLATE_SHEET)?;

    write_header_row(sheet, &CANONICAL_COLUMNS, &header)?;
    for (i, (name, cost, price, fee, other)) in TEMPLATE_ROWS.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, *name)?;
        sheet.write_number(row, 1, *cost)?;
        sheet.write_number(row, 2, *price)?;
        sheet.write_number(row, 3, *fee)?;
        sheet.write_number(row, 4, *other)?;
    }
    sheet.autofit();

    Ok(workbook.save_to_buffer()?)
}

/// `Lucra_Resultados_20250101_093000.xlsx`
pub fn export_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("Lucra_Resultados_{}.xlsx", at.format("%Y%m%d_%H%M%S"))
}

fn write_results_sheet(
    sheet: &mut Worksheet,
    name: &str,
    rows: &[ProductMetrics],
    header: &Format,
) -> Result<(), XlsxError> {
    sheet.set_name(name)?;

    let with_fixed = rows.iter().any(|r| r.fixed.is_some());
    let mut headers = RESULT_HEADERS.to_vec();
    if with_fixed {
        headers.extend(FIXED_HEADERS);
    }
    write_header_row(sheet, &headers, header)?;

    for (i, metrics) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, metrics.name.as_str())?;
        for (offset, value) in row_values(metrics).into_iter().enumerate() {
            if let Some(value) = value {
                sheet.write_number(row, (offset + 1) as u16, value)?;
            }
        }
    }

    sheet.autofit();
    Ok(())
}

/// Numeric columns after `Produto`, in header order.
fn row_values(m: &ProductMetrics) -> Vec<Option<f64>> {
    let mut values = vec![
        Some(m.cost),
        Some(m.price),
        Some(m.fee_percent),
        Some(m.other_costs),
        Some(m.fee_amount),
        Some(m.net_profit),
        Some(m.current_margin_percent),
        m.ideal_price,
        m.ideal_price_diff_percent,
        m.breakeven_units,
    ];
    if let Some(f) = &m.fixed {
        values.extend([
            Some(f.allocated_fixed),
            Some(f.net_profit_with_fixed),
            Some(f.net_margin_percent),
            f.ideal_price_with_fixed,
            f.ideal_price_with_fixed_diff_percent,
        ]);
    }
    values
}

fn write_header_row(sheet: &mut Worksheet, headers: &[&str], format: &Format) -> Result<(), XlsxError> {
    for (col, title) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, format)?;
    }
    Ok(())
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x4F81BD))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
