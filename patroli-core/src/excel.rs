//! Excel read/write for uploads and the downloadable report.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::{Format, Workbook};
use thiserror::Error;

use crate::model::ProductRecord;

/// Column order of the exported report, in display form.
pub const REPORT_HEADERS: &[&str] = &[
    "Kategori Lv 1",
    "Kategori Lv 2",
    "Kategori Lv 3",
    "Nama Produk",
    "Hasil Pemeriksaan",
    "Review Validator",
    "Pemeriksa",
];

const REPORT_SHEET_NAME: &str = "Hasil Patroli";

#[derive(Error, Debug)]
pub enum ExcelError {
    #[error("Failed to read workbook: {0}")]
    Read(#[from] calamine::Error),

    #[error("Workbook has no sheets")]
    NoSheet,

    #[error("Failed to build report: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("Unsupported file type: {0} (only .xlsx and .xls are accepted)")]
    UnsupportedExtension(String),
}

/// Reject filenames the workbook reader cannot handle.
pub fn ensure_supported_extension(filename: &str) -> Result<(), ExcelError> {
    let lower = filename.to_lowercase();
    if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
        Ok(())
    } else {
        Err(ExcelError::UnsupportedExtension(filename.to_string()))
    }
}

/// Read the first worksheet into header-keyed rows.
///
/// The first row is taken as headers. Fully blank rows are dropped; missing
/// cells come back as empty strings so downstream validation sees a uniform
/// shape.
pub fn read_rows(bytes: &[u8]) -> Result<Vec<HashMap<String, String>>, ExcelError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)?;

    let range = workbook.worksheet_range_at(0).ok_or(ExcelError::NoSheet)??;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|c| cell_to_string(c).trim().to_string())
        .collect();

    let mut out = Vec::new();
    for row in rows {
        let mut map = HashMap::new();
        let mut has_value = false;
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = row.get(i).map(cell_to_string).unwrap_or_default();
            if !value.trim().is_empty() {
                has_value = true;
            }
            map.insert(header.clone(), value);
        }
        if has_value {
            out.push(map);
        }
    }
    Ok(out)
}

/// Serialize the record collection into the report workbook.
pub fn write_report(records: &[ProductRecord]) -> Result<Vec<u8>, ExcelError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(REPORT_SHEET_NAME)?;

    // Column widths sized for category/name text.
    const WIDTHS: &[f64] = &[15.0, 15.0, 20.0, 40.0, 18.0, 15.0, 15.0];
    for (col, width) in WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }

    let header_format = Format::new().set_bold();
    for (col, header) in REPORT_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        let review = record.hasil_review.map(|o| o.as_str()).unwrap_or("");
        let cells = [
            record.kategori_lv1.as_str(),
            record.kategori_lv2.as_str(),
            record.kategori_lv3.as_str(),
            record.nama_produk.as_str(),
            record.hasil_pemeriksaan.as_str(),
            review,
            record.pemeriksa.as_str(),
        ];
        for (col, value) in cells.iter().enumerate() {
            worksheet.write_string(row, col as u16, *value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            // Spreadsheets store plain numbers as floats; render whole
            // numbers without the trailing ".0" so ids and codes survive.
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReviewOutcome;

    fn record(id: u64, name: &str, review: Option<ReviewOutcome>) -> ProductRecord {
        ProductRecord {
            id,
            kategori_lv1: "Perkantoran".to_string(),
            kategori_lv2: "ATK".to_string(),
            kategori_lv3: "Pulpen".to_string(),
            nama_produk: name.to_string(),
            url_produk: format!("https://example.com/p/{}", id),
            url_image: String::new(),
            hasil_pemeriksaan: "Sesuai".to_string(),
            reviewer: "Rina".to_string(),
            pemeriksa: "Budi".to_string(),
            hasil_review: review,
            reviewed: review.is_some(),
        }
    }

    #[test]
    fn test_extension_check() {
        assert!(ensure_supported_extension("data.xlsx").is_ok());
        assert!(ensure_supported_extension("DATA.XLS").is_ok());
        assert!(matches!(
            ensure_supported_extension("data.csv"),
            Err(ExcelError::UnsupportedExtension(_))
        ));
        assert!(ensure_supported_extension("xlsx").is_err());
    }

    #[test]
    fn test_report_round_trip_preserves_review() {
        let records = vec![
            record(1, "Pulpen Gel", Some(ReviewOutcome::Benar)),
            record(2, "Spidol", None),
            record(3, "Kertas A4", Some(ReviewOutcome::Salah)),
        ];

        let bytes = write_report(&records).unwrap();
        let rows = read_rows(&bytes).unwrap();

        assert_eq!(rows.len(), 3);
        let by_name = |name: &str| {
            rows.iter()
                .find(|r| r.get("Nama Produk").map(String::as_str) == Some(name))
                .unwrap()
        };
        assert_eq!(by_name("Pulpen Gel")["Review Validator"], "Benar");
        assert_eq!(by_name("Spidol")["Review Validator"], "");
        assert_eq!(by_name("Kertas A4")["Review Validator"], "Salah");
        assert_eq!(by_name("Pulpen Gel")["Hasil Pemeriksaan"], "Sesuai");
    }

    #[test]
    fn test_report_headers_and_empty_cells() {
        let bytes = write_report(&[record(1, "Pulpen", None)]).unwrap();
        let rows = read_rows(&bytes).unwrap();

        let row = &rows[0];
        for header in REPORT_HEADERS {
            assert!(row.contains_key(*header), "missing header {}", header);
        }
    }

    #[test]
    fn test_blank_rows_are_dropped() {
        // A report for zero records still has a header row and no data rows.
        let bytes = write_report(&[]).unwrap();
        let rows = read_rows(&bytes).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_rejects_garbage_bytes() {
        assert!(read_rows(b"definitely not a workbook").is_err());
    }
}
