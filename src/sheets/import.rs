//! Spreadsheet import (xlsx / xls / ods via calamine, CSV via csv).
//!
//! Only the first worksheet is read. The first row is the header row.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::{debug, info};

use super::{parse_table, CellValue, SheetFormat};
use crate::types::{ImportError, Product};

/// Read products from uploaded bytes in the given format.
pub fn read_table(bytes: &[u8], format: SheetFormat) -> Result<Vec<Product>, ImportError> {
    let products = match format {
        SheetFormat::Workbook => read_workbook(bytes)?,
        SheetFormat::Csv => read_csv(bytes)?,
    };
    info!(%format, size = bytes.len(), rows = products.len(), "Spreadsheet parsed");
    Ok(products)
}

/// Read the first sheet of an xlsx/xls/ods workbook.
pub fn read_workbook(bytes: &[u8]) -> Result<Vec<Product>, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::Workbook(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::EmptySheet)?
        .map_err(|e| ImportError::Workbook(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or(ImportError::EmptySheet)?
        .iter()
        .map(|c| to_cell(c).as_text())
        .collect();

    let data: Vec<Vec<CellValue>> = rows.map(|r| r.iter().map(to_cell).collect()).collect();
    debug!(columns = ?headers, rows = data.len(), "Workbook sheet read");

    parse_table(&headers, &data)
}

/// Read a CSV export. Comma or semicolon separated; a UTF-8 BOM is ignored.
pub fn read_csv(bytes: &[u8]) -> Result<Vec<Product>, ImportError> {
    let delimiter = sniff_delimiter(bytes);
    // Semicolon-separated files come from pt-BR locales, where ',' is the decimal mark.
    let decimal_comma = delimiter == b';';
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ImportError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ImportError::EmptySheet);
    }

    let mut data = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ImportError::Csv(e.to_string()))?;
        let row = record.iter().map(|field| csv_cell(field, decimal_comma)).collect();
        data.push(row);
    }
    debug!(columns = ?headers, rows = data.len(), delimiter = %(delimiter as char), "CSV read");

    parse_table(&headers, &data)
}

fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

/// A CSV field as a cell. With `decimal_comma`, amounts such as `12,50` or
/// `1.234,56` become numbers; anything else stays text.
fn csv_cell(field: &str, decimal_comma: bool) -> CellValue {
    if decimal_comma && field.contains(',') {
        let normalized = field.trim().replace('.', "").replace(',', ".");
        if let Ok(n) = normalized.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
        }
    }
    CellValue::from(field)
}

fn to_cell(data: &Data) -> CellValue {
    match data {
        Data::Float(v) => CellValue::Number(*v),
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::DateTime(v) => CellValue::Number(v.as_f64()),
        Data::String(v) | Data::DateTimeIso(v) | Data::DurationIso(v) => CellValue::from(v.as_str()),
        Data::Bool(v) => CellValue::Text(v.to_string()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
