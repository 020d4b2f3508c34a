//! Batch image scraping over a spreadsheet.
//!
//! Finds rows with a product URL but no image, scrapes each with bounded
//! parallelism, and writes winners back one cell at a time so a single bad
//! row never takes down the run. Progress flows over a channel; the HTTP
//! layer relays the events as SSE frames.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::scrape::ImageScraper;
use crate::sheets::{column_letter, SheetSnapshot, SheetsClient, SHEET_NAME};

/// Concurrent scrape workers per batch run.
pub const BATCH_CONCURRENCY: usize = 3;

/// Progress events emitted during a batch run.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BatchEvent {
    Start {
        total: usize,
        message: String,
    },
    Progress {
        processed: usize,
        total: usize,
        result: BatchItemResult,
        message: String,
    },
    Complete {
        processed: usize,
        total: usize,
        results: Vec<BatchItemResult>,
        message: String,
    },
    Error {
        message: String,
    },
}

/// Outcome of one spreadsheet row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchItemResult {
    /// 1-based spreadsheet row the result belongs to.
    pub row: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
struct RowTarget {
    /// 1-based spreadsheet row.
    row: usize,
    url: String,
}

/// Scrape every qualifying row of the spreadsheet and write image URLs back.
///
/// Emits `start`, per-item `progress`, and a final `complete` event on
/// `events`. A cancelled run stops handing out work, skips the `complete`
/// event, and returns whatever was processed. Send failures on the events
/// channel are ignored; the receiver hanging up is how cancellation begins.
pub async fn run_batch(
    sheets: Arc<SheetsClient>,
    scraper: Arc<ImageScraper>,
    spreadsheet_id: &str,
    events: mpsc::Sender<BatchEvent>,
    cancel: CancellationToken,
) -> Vec<BatchItemResult> {
    let snapshot = match sheets.read_snapshot(spreadsheet_id).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!(spreadsheet_id, error = %e, "Batch failed to read spreadsheet");
            let _ = events
                .send(BatchEvent::Error {
                    message: format!("Failed to read spreadsheet: {}", e),
                })
                .await;
            return Vec::new();
        }
    };

    let (url_col, image_col) = match required_columns(&snapshot) {
        Ok(cols) => cols,
        Err(message) => {
            tracing::error!(spreadsheet_id, message = %message, "Batch cannot run");
            let _ = events.send(BatchEvent::Error { message }).await;
            return Vec::new();
        }
    };

    let targets = qualifying_rows(&snapshot, url_col, image_col);
    let total = targets.len();
    tracing::info!(spreadsheet_id, total, "Starting batch scrape");
    let _ = events
        .send(BatchEvent::Start {
            total,
            message: format!("Found {} unprocessed rows.", total),
        })
        .await;

    if total == 0 {
        let _ = events
            .send(BatchEvent::Complete {
                processed: 0,
                total: 0,
                results: Vec::new(),
                message: "Batch scraping completed!".to_string(),
            })
            .await;
        return Vec::new();
    }

    let semaphore = Arc::new(Semaphore::new(BATCH_CONCURRENCY));
    let mut tasks = JoinSet::new();
    let image_range_col = column_letter(image_col + 1);

    for target in targets {
        let semaphore = semaphore.clone();
        let sheets = sheets.clone();
        let scraper = scraper.clone();
        let cancel = cancel.clone();
        let spreadsheet_id = spreadsheet_id.to_string();
        let image_range_col = image_range_col.clone();

        tasks.spawn(async move {
            let _permit = tokio::select! {
                _ = cancel.cancelled() => return None,
                permit = semaphore.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return None,
                },
            };
            if cancel.is_cancelled() {
                return None;
            }
            Some(process_row(&sheets, &scraper, &spreadsheet_id, &image_range_col, target).await)
        });
    }

    let mut processed = 0;
    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let result = match joined {
            Ok(Some(result)) => result,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(error = %e, "Batch worker task failed");
                continue;
            }
        };

        processed += 1;
        let _ = events
            .send(BatchEvent::Progress {
                processed,
                total,
                result: result.clone(),
                message: format!("Processed {}/{}", processed, total),
            })
            .await;
        results.push(result);
    }

    if cancel.is_cancelled() {
        tracing::info!(spreadsheet_id, processed, total, "Batch cancelled");
        return results;
    }

    tracing::info!(spreadsheet_id, processed, total, "Batch complete");
    let _ = events
        .send(BatchEvent::Complete {
            processed,
            total,
            results: results.clone(),
            message: "Batch scraping completed!".to_string(),
        })
        .await;
    results
}

async fn process_row(
    sheets: &SheetsClient,
    scraper: &ImageScraper,
    spreadsheet_id: &str,
    image_range_col: &str,
    target: RowTarget,
) -> BatchItemResult {
    let outcome = scraper.scrape(&target.url).await;
    let Some(image_url) = outcome.best() else {
        return BatchItemResult {
            row: target.row,
            success: false,
            url: None,
            error: Some("No image found".to_string()),
        };
    };

    let range = format!("{}!{}{}", SHEET_NAME, image_range_col, target.row);
    match sheets.update_cell(spreadsheet_id, &range, image_url).await {
        Ok(()) => BatchItemResult {
            row: target.row,
            success: true,
            url: Some(image_url.to_string()),
            error: None,
        },
        Err(e) => {
            tracing::warn!(row = target.row, error = %e, "Failed to write image cell");
            BatchItemResult {
                row: target.row,
                success: false,
                url: None,
                error: Some(e.to_string()),
            }
        }
    }
}

fn required_columns(snapshot: &SheetSnapshot) -> Result<(usize, usize), String> {
    let url_col = snapshot
        .column_index("url_produk")
        .ok_or("Spreadsheet has no 'url_produk' column")?;
    let image_col = snapshot
        .column_index("url_image")
        .ok_or("Spreadsheet has no image column")?;
    Ok((url_col, image_col))
}

/// A row qualifies when its product URL is non-blank and its image cell
/// is blank.
fn qualifying_rows(snapshot: &SheetSnapshot, url_col: usize, image_col: usize) -> Vec<RowTarget> {
    snapshot
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let url = row.get(url_col).map(String::as_str).unwrap_or("").trim();
            let image = row.get(image_col).map(String::as_str).unwrap_or("").trim();
            if url.is_empty() || !image.is_empty() {
                return None;
            }
            Some(RowTarget {
                // Data rows sit below the header row.
                row: i + 2,
                url: url.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(headers: &[&str], rows: &[&[&str]]) -> SheetSnapshot {
        SheetSnapshot {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_qualifying_rows() {
        let snap = snapshot(
            &["nama_produk", "url_produk", "url_image"],
            &[
                &["Pulpen", "https://example.com/p/1", ""],
                &["Spidol", "https://example.com/p/2", "https://cdn.example.com/2.jpg"],
                &["Penghapus", "", ""],
                &["Penggaris", "https://example.com/p/4", "   "],
            ],
        );

        let targets = qualifying_rows(&snap, 1, 2);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].row, 2);
        assert_eq!(targets[0].url, "https://example.com/p/1");
        assert_eq!(targets[1].row, 5);
        assert_eq!(targets[1].url, "https://example.com/p/4");
    }

    #[test]
    fn test_required_columns_fold_image_aliases() {
        let snap = snapshot(&["URL_Produk", "URL_Gambar"], &[]);
        assert_eq!(required_columns(&snap), Ok((0, 1)));

        let missing = snapshot(&["URL_Produk"], &[]);
        assert!(required_columns(&missing).is_err());
    }

    #[test]
    fn test_event_wire_format() {
        let start = serde_json::to_value(BatchEvent::Start {
            total: 2,
            message: "Found 2 unprocessed rows.".to_string(),
        })
        .unwrap();
        assert_eq!(start["type"], "start");
        assert_eq!(start["total"], 2);

        let progress = serde_json::to_value(BatchEvent::Progress {
            processed: 1,
            total: 2,
            result: BatchItemResult {
                row: 2,
                success: true,
                url: Some("https://cdn.example.com/a.jpg".to_string()),
                error: None,
            },
            message: "Processed 1/2".to_string(),
        })
        .unwrap();
        assert_eq!(progress["type"], "progress");
        assert_eq!(progress["result"]["row"], 2);
        assert_eq!(progress["result"]["success"], true);
        assert!(progress["result"].get("error").is_none());
    }

    #[test]
    fn test_failed_item_serializes_error_only() {
        let result = serde_json::to_value(BatchItemResult {
            row: 3,
            success: false,
            url: None,
            error: Some("No image found".to_string()),
        })
        .unwrap();
        assert_eq!(result["error"], "No image found");
        assert!(result.get("url").is_none());
    }
}
