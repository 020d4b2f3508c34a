pub mod batch;
pub mod excel;
pub mod http;
pub mod llm;
pub mod model;
pub mod scrape;
pub mod sheets;
pub mod store;
pub mod validate;

pub use batch::{run_batch, BatchEvent, BatchItemResult, BATCH_CONCURRENCY};
pub use excel::{ensure_supported_extension, read_rows, write_report, ExcelError};
pub use http::{FetchError, HttpClient, MockClient, WebClient, WebClientBuilder};
pub use model::{ProductRecord, ReviewOutcome, Stats};
pub use scrape::{ImageScraper, ScrapeOutcome, Tier};
pub use sheets::{
    extract_spreadsheet_id, SheetSnapshot, SheetsClient, SheetsError, UpdateSummary,
};
pub use store::{
    PageInfo, PaginationInfo, ProductQuery, ProductStore, ProductView, StoreError,
};
pub use validate::{ingest, ValidationError};
