//! Google Sheets v4 REST bridge.
//!
//! Reads worksheets into header-keyed snapshots and writes review verdicts
//! back into a dedicated column. Writes are planned against a fresh
//! snapshot and matched by product URL, so a sheet that was re-sorted or
//! had rows inserted since the import still gets every verdict in the
//! right place.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::model::ProductRecord;
use crate::validate::canonical_column;

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Worksheet every operation targets.
pub const SHEET_NAME: &str = "Sheet1";

/// Header of the column that receives review verdicts.
pub const REVIEW_COLUMN_HEADER: &str = "Review Validator";

static SPREADSHEET_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/d/([a-zA-Z0-9_-]+)").expect("Invalid spreadsheet URL regex"));

#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("Sheets API token is not configured (set SHEETS_API_TOKEN)")]
    NotConfigured,

    #[error("Sheets request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Sheets API returned error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected Sheets response: {0}")]
    Parse(String),

    #[error("Spreadsheet has no '{0}' column")]
    MissingColumn(String),
}

/// One worksheet read: trimmed headers plus data rows padded to the
/// header width.
#[derive(Debug, Clone, Default)]
pub struct SheetSnapshot {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetSnapshot {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find a column by its canonical name, folding header aliases.
    pub fn column_index(&self, canonical: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|header| canonical_column(header) == canonical)
    }

    /// Header-keyed row maps, for feeding into import validation. Rows with
    /// no content at all are dropped.
    pub fn to_rows(&self) -> Vec<HashMap<String, String>> {
        self.rows
            .iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|row| {
                self.headers
                    .iter()
                    .enumerate()
                    .filter(|(_, header)| !header.is_empty())
                    .map(|(i, header)| {
                        (
                            header.clone(),
                            row.get(i).cloned().unwrap_or_default(),
                        )
                    })
                    .collect()
            })
            .collect()
    }
}

/// Counts from a review write-back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSummary {
    pub updated: usize,
    pub skipped: usize,
}

#[derive(Debug)]
struct CellWrite {
    range: String,
    value: String,
}

#[derive(Debug)]
struct ReviewUpdatePlan {
    writes: Vec<CellWrite>,
    summary: UpdateSummary,
}

/// Client for the Sheets REST API.
pub struct SheetsClient {
    http: reqwest::Client,
    token: Option<String>,
}

impl SheetsClient {
    /// Build from the SHEETS_API_TOKEN environment variable. A missing
    /// token is not fatal here; spreadsheet operations report it per call.
    pub fn from_env() -> Result<Self, reqwest::Error> {
        let token = std::env::var("SHEETS_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        if token.is_none() {
            tracing::warn!("SHEETS_API_TOKEN is not set; spreadsheet endpoints will be unavailable");
        }

        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self { http, token })
    }

    fn token(&self) -> Result<&str, SheetsError> {
        self.token.as_deref().ok_or(SheetsError::NotConfigured)
    }

    /// Read the worksheet into a snapshot. Missing trailing cells are
    /// padded so every row is as wide as the header row.
    pub async fn read_snapshot(&self, spreadsheet_id: &str) -> Result<SheetSnapshot, SheetsError> {
        let token = self.token()?;
        let url = format!("{}/{}/values/{}!A:Z", API_BASE, spreadsheet_id, SHEET_NAME);

        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let response = Self::ensure_success(response).await?;

        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| SheetsError::Parse(e.to_string()))?;

        let mut values = body.values.into_iter();
        let Some(header_row) = values.next() else {
            return Ok(SheetSnapshot::default());
        };

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell_text(cell).trim().to_string())
            .collect();
        let rows: Vec<Vec<String>> = values
            .map(|row| {
                (0..headers.len())
                    .map(|i| row.get(i).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();

        tracing::debug!(spreadsheet_id, rows = rows.len(), "Read spreadsheet snapshot");
        Ok(SheetSnapshot { headers, rows })
    }

    /// Write one cell, RAW input.
    pub async fn update_cell(
        &self,
        spreadsheet_id: &str,
        range: &str,
        value: &str,
    ) -> Result<(), SheetsError> {
        let token = self.token()?;
        let url = format!(
            "{}/{}/values/{}?valueInputOption=RAW",
            API_BASE, spreadsheet_id, range
        );
        let body = json!({ "values": [[value]] });

        let response = self
            .http
            .put(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    /// Push every reviewed verdict into the review column.
    ///
    /// Reads a fresh snapshot, locates (or appends) the review column,
    /// matches records to rows by exact product URL, and lands the whole
    /// plan in one batchUpdate call. Records with no matching row are
    /// counted as skipped.
    pub async fn update_review_column(
        &self,
        spreadsheet_id: &str,
        records: &[ProductRecord],
    ) -> Result<UpdateSummary, SheetsError> {
        let snapshot = self.read_snapshot(spreadsheet_id).await?;
        let plan = plan_review_updates(&snapshot, records)?;

        if !plan.writes.is_empty() {
            self.batch_update(spreadsheet_id, &plan.writes).await?;
        }

        tracing::info!(
            spreadsheet_id,
            updated = plan.summary.updated,
            skipped = plan.summary.skipped,
            "Updated review column"
        );
        Ok(plan.summary)
    }

    async fn batch_update(
        &self,
        spreadsheet_id: &str,
        writes: &[CellWrite],
    ) -> Result<(), SheetsError> {
        let token = self.token()?;
        let url = format!("{}/{}/values:batchUpdate", API_BASE, spreadsheet_id);
        let data: Vec<_> = writes
            .iter()
            .map(|write| json!({ "range": write.range, "values": [[write.value]] }))
            .collect();
        let body = json!({ "valueInputOption": "RAW", "data": data });

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SheetsError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(parsed) => parsed.error.message,
            Err(_) => body,
        };
        Err(SheetsError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Decide which cells a review write-back touches.
fn plan_review_updates(
    snapshot: &SheetSnapshot,
    records: &[ProductRecord],
) -> Result<ReviewUpdatePlan, SheetsError> {
    let url_col = snapshot
        .column_index("url_produk")
        .ok_or_else(|| SheetsError::MissingColumn("url_produk".to_string()))?;

    let (review_col, create_header) = match snapshot
        .headers
        .iter()
        .position(|header| header.trim() == REVIEW_COLUMN_HEADER)
    {
        Some(i) => (i, false),
        None => (snapshot.headers.len(), true),
    };
    let letter = column_letter(review_col + 1);

    let mut writes = Vec::new();
    if create_header {
        writes.push(CellWrite {
            range: format!("{}!{}1", SHEET_NAME, letter),
            value: REVIEW_COLUMN_HEADER.to_string(),
        });
    }

    let mut updated = 0;
    let mut skipped = 0;
    for record in records {
        let Some(outcome) = record.hasil_review else {
            continue;
        };

        let row = snapshot
            .rows
            .iter()
            .position(|row| row.get(url_col).map(String::as_str) == Some(record.url_produk.as_str()));
        match row {
            Some(i) => {
                // Data rows sit below the header, so row i lands at i + 2.
                writes.push(CellWrite {
                    range: format!("{}!{}{}", SHEET_NAME, letter, i + 2),
                    value: outcome.as_str().to_string(),
                });
                updated += 1;
            }
            None => {
                tracing::warn!(
                    url = %record.url_produk,
                    "No matching spreadsheet row for reviewed product, skipping"
                );
                skipped += 1;
            }
        }
    }

    Ok(ReviewUpdatePlan {
        writes,
        summary: UpdateSummary { updated, skipped },
    })
}

/// 1-based column index to its A1 letter form (1 -> A, 27 -> AA, 703 -> AAA).
pub fn column_letter(mut index: usize) -> String {
    let mut letters = String::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.insert(0, (b'A' + rem as u8) as char);
        index = (index - rem - 1) / 26;
    }
    letters
}

/// Accept either a bare spreadsheet id or a full Sheets URL.
pub fn extract_spreadsheet_id(input: &str) -> String {
    let trimmed = input.trim();
    if let Some(captures) = SPREADSHEET_URL_REGEX.captures(trimmed) {
        if let Some(id) = captures.get(1) {
            return id.as_str().to_string();
        }
    }
    trimmed.to_string()
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Error body shape the Sheets API returns.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Cells usually arrive as strings, but unformatted reads can carry
/// numbers or booleans.
fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReviewOutcome;

    fn snapshot(headers: &[&str], rows: &[&[&str]]) -> SheetSnapshot {
        SheetSnapshot {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn reviewed_record(url: &str, outcome: ReviewOutcome) -> ProductRecord {
        ProductRecord {
            id: 1,
            kategori_lv1: "Perkantoran".to_string(),
            kategori_lv2: "ATK".to_string(),
            kategori_lv3: "Pulpen".to_string(),
            nama_produk: "Pulpen Gel".to_string(),
            url_produk: url.to_string(),
            url_image: String::new(),
            hasil_pemeriksaan: "Sesuai".to_string(),
            reviewer: "Rina".to_string(),
            pemeriksa: "Budi".to_string(),
            hasil_review: Some(outcome),
            reviewed: true,
        }
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(2), "B");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(28), "AB");
        assert_eq!(column_letter(52), "AZ");
        assert_eq!(column_letter(53), "BA");
        assert_eq!(column_letter(702), "ZZ");
        assert_eq!(column_letter(703), "AAA");
    }

    #[test]
    fn test_extract_spreadsheet_id_from_url() {
        assert_eq!(
            extract_spreadsheet_id(
                "https://docs.google.com/spreadsheets/d/1AbC-dEf_123/edit#gid=0"
            ),
            "1AbC-dEf_123"
        );
        assert_eq!(
            extract_spreadsheet_id(
                "https://docs.google.com/spreadsheets/d/1AbC-dEf_123/edit?usp=sharing"
            ),
            "1AbC-dEf_123"
        );
    }

    #[test]
    fn test_extract_spreadsheet_id_passthrough() {
        assert_eq!(extract_spreadsheet_id("1AbC-dEf_123"), "1AbC-dEf_123");
        assert_eq!(extract_spreadsheet_id("  1AbC-dEf_123  "), "1AbC-dEf_123");
    }

    #[test]
    fn test_column_index_folds_aliases() {
        let snap = snapshot(&["Nama_Produk", "URL_Produk", "URL_Gambar"], &[]);
        assert_eq!(snap.column_index("nama_produk"), Some(0));
        assert_eq!(snap.column_index("url_produk"), Some(1));
        assert_eq!(snap.column_index("url_image"), Some(2));
        assert_eq!(snap.column_index("pemeriksa"), None);
    }

    #[test]
    fn test_to_rows_skips_blank_rows_and_pads() {
        let snap = snapshot(
            &["nama_produk", "url_produk"],
            &[
                &["Pulpen", "https://example.com/p/1"],
                &["", "  "],
                &["Spidol"],
            ],
        );

        let rows = snap.to_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["nama_produk"], "Pulpen");
        assert_eq!(rows[1]["nama_produk"], "Spidol");
        assert_eq!(rows[1]["url_produk"], "");
    }

    #[test]
    fn test_plan_uses_existing_review_column() {
        let snap = snapshot(
            &["nama_produk", "url_produk", "Review Validator"],
            &[
                &["Pulpen", "https://example.com/p/1", ""],
                &["Spidol", "https://example.com/p/2", ""],
            ],
        );
        let records = vec![reviewed_record("https://example.com/p/2", ReviewOutcome::Benar)];

        let plan = plan_review_updates(&snap, &records).unwrap();
        assert_eq!(plan.summary, UpdateSummary { updated: 1, skipped: 0 });
        assert_eq!(plan.writes.len(), 1);
        assert_eq!(plan.writes[0].range, "Sheet1!C3");
        assert_eq!(plan.writes[0].value, "Benar");
    }

    #[test]
    fn test_plan_appends_missing_review_column() {
        let snap = snapshot(
            &["nama_produk", "url_produk"],
            &[&["Pulpen", "https://example.com/p/1"]],
        );
        let records = vec![reviewed_record("https://example.com/p/1", ReviewOutcome::Salah)];

        let plan = plan_review_updates(&snap, &records).unwrap();
        assert_eq!(plan.writes.len(), 2);
        assert_eq!(plan.writes[0].range, "Sheet1!C1");
        assert_eq!(plan.writes[0].value, "Review Validator");
        assert_eq!(plan.writes[1].range, "Sheet1!C2");
        assert_eq!(plan.writes[1].value, "Salah");
    }

    #[test]
    fn test_plan_skips_unmatched_urls() {
        let snap = snapshot(
            &["nama_produk", "url_produk", "Review Validator"],
            &[&["Pulpen", "https://example.com/p/1", ""]],
        );
        let records = vec![
            reviewed_record("https://example.com/p/1", ReviewOutcome::Benar),
            reviewed_record("https://example.com/gone", ReviewOutcome::Salah),
        ];

        let plan = plan_review_updates(&snap, &records).unwrap();
        assert_eq!(plan.summary, UpdateSummary { updated: 1, skipped: 1 });
        assert_eq!(plan.writes.len(), 1);
    }

    #[test]
    fn test_plan_ignores_unreviewed_records() {
        let snap = snapshot(
            &["nama_produk", "url_produk", "Review Validator"],
            &[&["Pulpen", "https://example.com/p/1", ""]],
        );
        let mut record = reviewed_record("https://example.com/p/1", ReviewOutcome::Benar);
        record.hasil_review = None;
        record.reviewed = false;

        let plan = plan_review_updates(&snap, &[record]).unwrap();
        assert_eq!(plan.summary, UpdateSummary { updated: 0, skipped: 0 });
        assert!(plan.writes.is_empty());
    }

    #[test]
    fn test_plan_requires_url_column() {
        let snap = snapshot(&["nama_produk"], &[&["Pulpen"]]);
        let records = vec![reviewed_record("https://example.com/p/1", ReviewOutcome::Benar)];

        let err = plan_review_updates(&snap, &records).unwrap_err();
        assert!(matches!(err, SheetsError::MissingColumn(col) if col == "url_produk"));
    }
}
