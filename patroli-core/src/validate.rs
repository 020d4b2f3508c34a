//! Row validation and record construction for spreadsheet imports.
//!
//! Imports are all-or-nothing: every check runs over the whole input and a
//! failure reports every offending row, not just the first one. Row numbers
//! in errors are 1-based spreadsheet rows (data starts at row 2, below the
//! header).

use std::collections::HashMap;

use thiserror::Error;

use crate::model::ProductRecord;

/// Accepted inspection verdicts. Empty cells are allowed and mean the
/// inspector has not reached the row.
pub const INSPECTION_VALUES: &[&str] = &["Sesuai", "Tidak Sesuai"];

/// Canonical names of the columns every import must carry.
const REQUIRED_COLUMNS: &[&str] = &[
    "kategori_lv1",
    "kategori_lv2",
    "kategori_lv3",
    "nama_produk",
    "url_produk",
    "hasil_pemeriksaan",
    "reviewer",
    "pemeriksa",
];

const INSPECTION_ALIASES: &[&str] = &["hasil_pemeriksaan", "hasil_pemeriksa", "hasil pemeriksa"];
const IMAGE_ALIASES: &[&str] = &["url_image", "image_url", "url_gambar"];

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Spreadsheet contains no data rows")]
    EmptyInput,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error(
        "Invalid Hasil Pemeriksaan value (must be Sesuai or Tidak Sesuai) in rows: {}",
        format_rows(.0)
    )]
    InvalidInspectionResult(Vec<usize>),

    #[error("Missing Pemeriksa value in rows: {}", format_rows(.0))]
    MissingInspector(Vec<usize>),
}

fn format_rows(rows: &[usize]) -> String {
    rows.iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fold a raw header into its canonical column name. Headers are trimmed and
/// lower-cased; known aliases collapse onto one name.
pub(crate) fn canonical_column(header: &str) -> String {
    let key = header.trim().to_lowercase();
    if INSPECTION_ALIASES.contains(&key.as_str()) {
        return "hasil_pemeriksaan".to_string();
    }
    if IMAGE_ALIASES.contains(&key.as_str()) {
        return "url_image".to_string();
    }
    key
}

/// Validate header-keyed rows and build the record collection.
///
/// Ids are assigned 1..=n in input order. The caller replaces any existing
/// collection with the result; nothing is admitted on error.
pub fn ingest(rows: &[HashMap<String, String>]) -> Result<Vec<ProductRecord>, ValidationError> {
    if rows.is_empty() {
        return Err(ValidationError::EmptyInput);
    }

    let canonical: Vec<HashMap<String, String>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|(k, v)| (canonical_column(k), v.trim().to_string()))
                .collect()
        })
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !canonical[0].contains_key(**col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingColumns(missing));
    }

    let mut bad_inspection = Vec::new();
    let mut missing_inspector = Vec::new();
    for (i, row) in canonical.iter().enumerate() {
        let spreadsheet_row = i + 2;

        let inspection = row
            .get("hasil_pemeriksaan")
            .map(String::as_str)
            .unwrap_or("");
        if !inspection.is_empty() && !INSPECTION_VALUES.contains(&inspection) {
            bad_inspection.push(spreadsheet_row);
        }

        let inspector = row.get("pemeriksa").map(String::as_str).unwrap_or("");
        if inspector.is_empty() {
            missing_inspector.push(spreadsheet_row);
        }
    }
    if !bad_inspection.is_empty() {
        return Err(ValidationError::InvalidInspectionResult(bad_inspection));
    }
    if !missing_inspector.is_empty() {
        return Err(ValidationError::MissingInspector(missing_inspector));
    }

    let records = canonical
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let get = |col: &str| row.get(col).cloned().unwrap_or_default();
            ProductRecord {
                id: (i + 1) as u64,
                kategori_lv1: get("kategori_lv1"),
                kategori_lv2: get("kategori_lv2"),
                kategori_lv3: get("kategori_lv3"),
                nama_produk: get("nama_produk"),
                url_produk: get("url_produk"),
                url_image: get("url_image"),
                hasil_pemeriksaan: get("hasil_pemeriksaan"),
                reviewer: get("reviewer"),
                pemeriksa: get("pemeriksa"),
                hasil_review: None,
                reviewed: false,
            }
        })
        .collect();

    Ok(records)
}
