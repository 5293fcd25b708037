//! End-to-end flows without HTTP: template → import → compute → export.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

use lucra::engine::{compute, summarize};
use lucra::session::ProductRepository;
use lucra::sheets::export::{export_results, template_workbook, SHEET_WITHOUT_FIXED, SHEET_WITH_FIXED};
use lucra::sheets::import::read_table;
use lucra::sheets::SheetFormat;
use lucra::types::{ImportError, PricingParams, Product};

#[test]
fn test_template_import_compute_export() {
    let mut repo = ProductRepository::new();
    repo.add(Product::new("Shirt", 25.0, 50.0, 2.5, 0.0)).unwrap();

    let template = template_workbook().unwrap();
    let imported = read_table(&template, SheetFormat::Workbook).unwrap();
    assert_eq!(repo.append(imported), 3);
    assert_eq!(repo.len(), 4);

    let params = PricingParams {
        target_margin_percent: 30.0,
        fixed_costs: 1000.0,
        include_fixed_costs: true,
    };
    let rows = compute(&repo.snapshot(), &params);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].name, "Shirt");
    assert_eq!(rows[0].ideal_price, Some(37.04));

    let allocated: f64 = rows.iter().map(|r| r.fixed.unwrap().allocated_fixed).sum();
    assert!((allocated - 1000.0).abs() < 0.05);

    let summary = summarize(&rows);
    assert_eq!(summary.product_count, 4);
    assert!(summary.total_net_profit_with_fixed.unwrap() < summary.total_net_profit);

    let bytes = export_results(&repo.snapshot(), &params, true).unwrap();
    let mut wb = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
    assert_eq!(wb.sheet_names(), vec![SHEET_WITHOUT_FIXED.to_string(), SHEET_WITH_FIXED.to_string()]);
    let base = wb.worksheet_range(SHEET_WITHOUT_FIXED).unwrap();
    assert_eq!(base.get((1, 0)), Some(&Data::String("Shirt".into())));
    assert_eq!(base.get((4, 0)), Some(&Data::String("Bolo Pequeno".into())));
}

#[test]
fn test_failed_import_leaves_repository_unchanged() {
    let mut repo = ProductRepository::new();
    repo.add(Product::new("Caneca Logo", 18.0, 35.0, 3.0, 0.0)).unwrap();
    let before = repo.snapshot();

    let csv = "Produto,Preco,Taxa_pct\nBolo,30,5\n";
    match read_table(csv.as_bytes(), SheetFormat::Csv) {
        Err(ImportError::MissingColumns(cols)) => {
            assert_eq!(cols, vec!["Custo".to_string()]);
            assert!(ImportError::MissingColumns(cols).to_string().contains("Custo"));
        }
        Ok(products) => {
            repo.append(products);
            panic!("import should have been rejected");
        }
        Err(other) => panic!("unexpected error: {other}"),
    }

    assert_eq!(repo.snapshot(), before);
}

#[test]
fn test_zero_price_rows_through_the_pipeline() {
    let csv = "Produto,Custo,Preco\nBrinde,10,0\nAmostra,5,\n";
    let products = read_table(csv.as_bytes(), SheetFormat::Csv).unwrap();
    let params = PricingParams {
        fixed_costs: 90.0,
        include_fixed_costs: true,
        ..PricingParams::default()
    };
    let rows = compute(&products, &params);
    for row in &rows {
        assert_eq!(row.current_margin_percent, 0.0);
        assert_eq!(row.ideal_price_diff_percent, None);
        assert_eq!(row.breakeven_units, None);
        // No revenue anywhere: even split.
        assert_eq!(row.fixed.unwrap().allocated_fixed, 45.0);
    }
}
