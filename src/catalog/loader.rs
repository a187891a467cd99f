//! Fixed-header CSV catalog loader
//!
//! ## Column contract (case-insensitive, order-independent)
//!
//! | Column         | Example              | Notes                          |
//! |----------------|----------------------|--------------------------------|
//! | `sku`          | `978-0-13-110362-7`  | Rows with a blank sku skipped  |
//! | `title`        | `The C Language`     |                                |
//! | `expected_qty` | `3` or `3.0`         | Integral count                 |
//! | `box_id`       | `B1`                 |                                |
//!
//! Extra columns are ignored. Guessing column meaning from arbitrary headers
//! is not done here; upstream tooling must produce this shape.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::errors::{CatalogError, CatalogResult};
use super::record::CatalogRecord;
use crate::quantity::parse_quantity;

/// Columns every catalog file must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = ["sku", "title", "expected_qty", "box_id"];

/// Load catalog records from a CSV file.
pub fn load_csv(path: &Path) -> CatalogResult<Vec<CatalogRecord>> {
    let file = File::open(path).map_err(|e| CatalogError::UnreadableFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let records = parse_csv_reader(file, path)?;
    if records.is_empty() {
        return Err(CatalogError::EmptySheet(path.to_path_buf()));
    }
    Ok(records)
}

/// Parse catalog records from any reader. `origin` is only used in errors.
///
/// Returns an empty vector when the sheet has a valid header and no rows;
/// [`load_csv`] turns that into [`CatalogError::EmptySheet`].
pub fn parse_csv_reader<R: Read>(reader: R, origin: &Path) -> CatalogResult<Vec<CatalogRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let unreadable = |e: csv::Error| CatalogError::UnreadableFile {
        path: origin.to_path_buf(),
        reason: e.to_string(),
    };

    let headers = rdr.headers().map_err(unreadable)?.clone();
    if headers.is_empty() {
        return Err(CatalogError::EmptySheet(origin.to_path_buf()));
    }

    let col_idx: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_ascii_lowercase(), i))
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !col_idx.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CatalogError::MissingRequiredColumns(missing));
    }

    let idx = |name: &str| col_idx[name];
    let (sku_i, title_i, qty_i, box_i) = (
        idx("sku"),
        idx("title"),
        idx("expected_qty"),
        idx("box_id"),
    );

    let mut out = Vec::new();
    for (n, row) in rdr.records().enumerate() {
        let row = row.map_err(unreadable)?;
        // 1-based data row number; header is row 0
        let row_num = n + 1;

        let sku = row.get(sku_i).unwrap_or("");
        if sku.is_empty() {
            continue;
        }

        let raw_qty = row.get(qty_i).unwrap_or("");
        let expected_qty = parse_quantity(raw_qty).ok_or_else(|| CatalogError::InvalidQuantity {
            row: row_num,
            raw: raw_qty.to_string(),
        })?;

        out.push(CatalogRecord::new(
            sku,
            row.get(title_i).unwrap_or(""),
            expected_qty,
            row.get(box_i).unwrap_or(""),
        ));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn parse(src: &str) -> CatalogResult<Vec<CatalogRecord>> {
        parse_csv_reader(src.as_bytes(), Path::new("<test>"))
    }

    #[test]
    fn test_parses_required_columns_in_any_order() {
        let records = parse(
            "Box_ID,SKU,Title,Expected_Qty,Shelf\n\
             B1,978-0-13-110362-7,The C Language,2,top\n\
             B2,111,Other,1.0,low\n",
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sku, "978-0-13-110362-7");
        assert_eq!(records[0].box_id, "B1");
        assert_eq!(records[0].expected_qty, 2);
        assert_eq!(records[1].expected_qty, 1);
    }

    #[test]
    fn test_missing_columns_reported_together() {
        let err = parse("sku,title\n1,a\n").unwrap_err();
        match err {
            CatalogError::MissingRequiredColumns(cols) => {
                assert_eq!(cols, vec!["expected_qty".to_string(), "box_id".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_blank_sku_rows_skipped() {
        let records = parse("sku,title,expected_qty,box_id\n,blank,1,B1\n42,x,1,B1\n").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sku, "42");
    }

    #[test]
    fn test_invalid_quantity_names_row() {
        let err = parse("sku,title,expected_qty,box_id\n1,a,1,B1\n2,b,lots,B1\n").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidQuantity { row: 2, .. }));
    }

    #[test]
    fn test_load_csv_header_only_is_empty_sheet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "sku,title,expected_qty,box_id").unwrap();

        let err = load_csv(&path).unwrap_err();
        assert!(matches!(err, CatalogError::EmptySheet(_)));
    }

    #[test]
    fn test_load_csv_missing_file_unreadable() {
        let dir = TempDir::new().unwrap();
        let err = load_csv(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, CatalogError::UnreadableFile { .. }));
    }
}
