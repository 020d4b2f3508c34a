//! Two-tier product image scraping.
//!
//! The static tier fetches raw HTML and mines it for image references; the
//! rendered tier drives a headless browser for pages that only build their
//! galleries client-side. Scraping never fails outward: every error path
//! degrades to an empty candidate list.

mod extract;
mod render;

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::http::HttpClient;

/// Which tier produced a scrape result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Static,
    Rendered,
}

/// Candidate image URLs in priority order, plus the tier that produced
/// them. Empty candidates mean both tiers came up dry.
#[derive(Debug, Clone, Default)]
pub struct ScrapeOutcome {
    pub images: Vec<String>,
    pub tier: Option<Tier>,
}

impl ScrapeOutcome {
    /// The strongest candidate, when there is one.
    pub fn best(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Two-tier product image scraper.
pub struct ImageScraper {
    http: Arc<dyn HttpClient>,
    render_enabled: bool,
}

impl ImageScraper {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            render_enabled: true,
        }
    }

    /// Toggle the browser tier. Tests and Chrome-less environments turn
    /// it off.
    pub fn render_enabled(mut self, enabled: bool) -> Self {
        self.render_enabled = enabled;
        self
    }

    /// Scrape `url` for product image candidates.
    ///
    /// Never returns an error: fetch failures, render failures, and pages
    /// without imagery all converge on an empty outcome.
    pub async fn scrape(&self, url: &str) -> ScrapeOutcome {
        match self.http.fetch_html(url).await {
            Ok(html) => {
                let images = extract::extract_image_candidates(&html, url);
                if !images.is_empty() {
                    tracing::info!(url, count = images.len(), "Static tier found image candidates");
                    return ScrapeOutcome {
                        images,
                        tier: Some(Tier::Static),
                    };
                }
                tracing::debug!(url, "Static tier found nothing, trying rendered tier");
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "Static fetch failed, trying rendered tier");
            }
        }

        if !self.render_enabled {
            return ScrapeOutcome::default();
        }

        match render::scrape_rendered(url).await {
            Ok(images) if !images.is_empty() => {
                tracing::info!(url, count = images.len(), "Rendered tier found image candidates");
                ScrapeOutcome {
                    images,
                    tier: Some(Tier::Rendered),
                }
            }
            Ok(_) => {
                tracing::info!(url, "No image candidates in either tier");
                ScrapeOutcome::default()
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "Rendered tier failed");
                ScrapeOutcome::default()
            }
        }
    }
}
