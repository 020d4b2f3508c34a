//! Rendered-tier image collection via headless Chrome.
//!
//! Fallback for storefronts that assemble their product galleries
//! client-side, where the raw HTML carries no usable image references.
//! Each scrape launches an isolated browser; dropping it reaps the Chrome
//! process on every path out of the collection function.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions};
use thiserror::Error;

use crate::http::USER_AGENT;

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

// Short settle after DOM construction so late inline scripts can swap
// gallery placeholders in. A full network-idle wait stalls on pages that
// lazy-load or long-poll.
const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// In-page collector. Mirrors the static-tier priority order: social
/// metadata, then gallery selectors, then the largest rendered image.
/// Returns a JSON-encoded array of absolute URLs.
const COLLECT_IMAGES_JS: &str = r#"
(() => {
    const LOGO_KEYWORDS = ["logo", "icon", "sprite", "placeholder", "avatar"];
    const looksLikeLogo = (text) => {
        const lower = (text || "").toLowerCase();
        return LOGO_KEYWORDS.some((keyword) => lower.includes(keyword));
    };
    const resolve = (raw) => {
        if (!raw) return null;
        try {
            const url = new URL(raw, document.baseURI);
            if (url.protocol !== "http:" && url.protocol !== "https:") return null;
            return url.href;
        } catch (err) {
            return null;
        }
    };
    const fromElement = (img) => {
        const raw = img.currentSrc || img.src
            || img.getAttribute("data-src") || img.getAttribute("data-lazy-src");
        const url = resolve(raw);
        if (!url) return null;
        if (looksLikeLogo(url) || looksLikeLogo(img.getAttribute("alt"))
            || looksLikeLogo(img.getAttribute("class"))) return null;
        return url;
    };

    const metaSelectors = [
        'meta[property="og:image"]',
        'meta[name="twitter:image"]',
        'meta[property="twitter:image"]',
    ];
    for (const selector of metaSelectors) {
        const meta = document.querySelector(selector);
        if (meta) {
            const url = resolve(meta.getAttribute("content"));
            if (url) return JSON.stringify([url]);
        }
    }

    const gallerySelectors = [
        ".product-image img",
        ".product-gallery img",
        ".product-photo img",
        ".product-media img",
        ".product-detail img",
        "[class*='product'] img",
        ".gallery img",
        "picture img",
    ];
    for (const selector of gallerySelectors) {
        const urls = [];
        for (const img of document.querySelectorAll(selector)) {
            const url = fromElement(img);
            if (url && !urls.includes(url)) urls.push(url);
        }
        if (urls.length > 0) return JSON.stringify(urls);
    }

    const sized = [];
    for (const img of document.querySelectorAll("img")) {
        const url = fromElement(img);
        if (!url) continue;
        const width = img.naturalWidth || img.width;
        const height = img.naturalHeight || img.height;
        if (width < 50 || height < 50) continue;
        if (!sized.some((entry) => entry.url === url)) {
            sized.push({ url: url, area: width * height });
        }
    }
    sized.sort((a, b) => b.area - a.area);
    return JSON.stringify(sized.map((entry) => entry.url));
})()
"#;

/// Error type for rendered-tier collection.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Failed to load page: {0}")]
    Navigation(String),

    #[error("Failed to collect images from page: {0}")]
    Collection(String),

    #[error("Render task did not complete")]
    Join,
}

/// Render `url` in a throwaway browser and collect image candidates.
pub(crate) async fn scrape_rendered(url: &str) -> Result<Vec<String>, RenderError> {
    let url = url.to_string();
    // headless_chrome is synchronous; keep it off the async workers.
    tokio::task::spawn_blocking(move || collect_rendered(&url))
        .await
        .map_err(|_| RenderError::Join)?
}

fn collect_rendered(url: &str) -> Result<Vec<String>, RenderError> {
    let chrome_path = find_chrome();
    if let Some(ref path) = chrome_path {
        tracing::debug!(path = %path.display(), "Using Chrome");
    }

    let mut builder = LaunchOptions::default_builder();
    builder
        .args(vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--ignore-certificate-errors"),
            OsStr::new("--disable-remote-fonts"),
            OsStr::new("--mute-audio"),
            OsStr::new("--disable-blink-features=AutomationControlled"),
        ])
        .path(chrome_path);

    let options = builder
        .build()
        .map_err(|e| RenderError::Launch(e.to_string()))?;
    let browser = Browser::new(options).map_err(|e| RenderError::Launch(e.to_string()))?;

    let tab = browser
        .new_tab()
        .map_err(|e| RenderError::Launch(e.to_string()))?;
    tab.set_default_timeout(NAVIGATION_TIMEOUT);
    tab.set_user_agent(USER_AGENT, None, None)
        .map_err(|e| RenderError::Navigation(e.to_string()))?;

    tab.navigate_to(url)
        .map_err(|e| RenderError::Navigation(e.to_string()))?;
    tab.wait_until_navigated()
        .map_err(|e| RenderError::Navigation(e.to_string()))?;
    std::thread::sleep(SETTLE_DELAY);

    let result = tab
        .evaluate(COLLECT_IMAGES_JS, false)
        .map_err(|e| RenderError::Collection(e.to_string()))?;

    let Some(value) = result.value else {
        return Ok(Vec::new());
    };
    let Some(payload) = value.as_str() else {
        return Ok(Vec::new());
    };
    let urls: Vec<String> =
        serde_json::from_str(payload).map_err(|e| RenderError::Collection(e.to_string()))?;

    tracing::debug!(url, count = urls.len(), "Rendered tier collected images");
    Ok(urls)
}

/// Find a Chrome/Chromium executable, checking the Playwright cache first.
fn find_chrome() -> Option<PathBuf> {
    if let Ok(chrome_path) = std::env::var("CHROME") {
        let path = PathBuf::from(&chrome_path);
        if path.exists() {
            tracing::debug!(path = %path.display(), "Using Chrome from CHROME env var");
            return Some(path);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let playwright_cache = PathBuf::from(&home).join(".cache/ms-playwright");
        if let Ok(entries) = std::fs::read_dir(&playwright_cache) {
            let mut chrome_dirs: Vec<_> = entries
                .filter_map(|e| e.ok())
                .filter(|e| e.file_name().to_string_lossy().starts_with("chromium-"))
                .collect();
            // Newest version first.
            chrome_dirs.sort_by_key(|d| std::cmp::Reverse(d.file_name()));

            for dir in chrome_dirs {
                for subpath in &["chrome-linux64/chrome", "chrome-linux/chrome"] {
                    let chrome_path = dir.path().join(subpath);
                    if chrome_path.exists() {
                        tracing::debug!(path = %chrome_path.display(), "Found Chrome in Playwright cache");
                        return Some(chrome_path);
                    }
                }
            }
        }
    }

    // Let headless_chrome try its default detection.
    None
}
