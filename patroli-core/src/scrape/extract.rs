//! Static-tier image extraction from product page HTML.
//!
//! Strategies run in priority order: explicit social metadata first
//! (og:image, twitter:image), then JSON-LD product data, then gallery
//! selectors, and finally any non-logo image on the page. The first
//! strategy that yields a usable candidate wins.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

static JSONLD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("Invalid JSON-LD regex")
});

static OG_IMAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<meta[^>]*property\s*=\s*["']og:image["'][^>]*content\s*=\s*["']([^"']+)["']"#,
    )
    .expect("Invalid og:image regex")
});

// Same tag with the attributes in the opposite order.
static OG_IMAGE_REGEX_ALT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<meta[^>]*content\s*=\s*["']([^"']+)["'][^>]*property\s*=\s*["']og:image["']"#,
    )
    .expect("Invalid og:image alt regex")
});

static TWITTER_IMAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<meta[^>]*(?:name|property)\s*=\s*["']twitter:image(?::src)?["'][^>]*content\s*=\s*["']([^"']+)["']"#,
    )
    .expect("Invalid twitter:image regex")
});

static TWITTER_IMAGE_REGEX_ALT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<meta[^>]*content\s*=\s*["']([^"']+)["'][^>]*(?:name|property)\s*=\s*["']twitter:image(?::src)?["']"#,
    )
    .expect("Invalid twitter:image alt regex")
});

/// Substrings that mark a candidate as site chrome rather than product imagery.
const LOGO_KEYWORDS: &[&str] = &["logo", "icon", "sprite", "placeholder", "avatar"];

/// Product gallery containers, most specific first.
const GALLERY_SELECTORS: &[&str] = &[
    ".product-image img",
    ".product-gallery img",
    ".product-photo img",
    ".product-media img",
    ".product-detail img",
    "[class*='product'] img",
    ".gallery img",
    "picture img",
];

/// Extract product image candidates from raw HTML.
///
/// Relative URLs are resolved against `page_url`; candidates that are not
/// http(s), or that look like logos in the selector-based strategies, are
/// dropped. Returns an empty vector when nothing usable is found.
pub fn extract_image_candidates(html: &str, page_url: &str) -> Vec<String> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    let base = Url::parse(page_url).ok();

    if let Some(url) = extract_og_image(html, base.as_ref()) {
        return vec![url];
    }

    if let Some(url) = extract_twitter_image(html, base.as_ref()) {
        return vec![url];
    }

    let jsonld = extract_jsonld_images(html, base.as_ref());
    if !jsonld.is_empty() {
        return jsonld;
    }

    let document = Html::parse_document(html);

    let gallery = extract_gallery_images(&document, base.as_ref());
    if !gallery.is_empty() {
        return gallery;
    }

    extract_first_image(&document, base.as_ref())
        .map(|url| vec![url])
        .unwrap_or_default()
}

/// Extract the og:image content, trying both attribute orders.
fn extract_og_image(html: &str, base: Option<&Url>) -> Option<String> {
    for regex in [&*OG_IMAGE_REGEX, &*OG_IMAGE_REGEX_ALT] {
        let raw = regex
            .captures(html)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str());
        if let Some(url) = raw.and_then(|raw| clean_candidate(raw, base)) {
            return Some(url);
        }
    }
    None
}

fn extract_twitter_image(html: &str, base: Option<&Url>) -> Option<String> {
    for regex in [&*TWITTER_IMAGE_REGEX, &*TWITTER_IMAGE_REGEX_ALT] {
        let raw = regex
            .captures(html)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str());
        if let Some(url) = raw.and_then(|raw| clean_candidate(raw, base)) {
            return Some(url);
        }
    }
    None
}

/// Extract image URLs from the first JSON-LD block that carries any.
fn extract_jsonld_images(html: &str, base: Option<&Url>) -> Vec<String> {
    for captures in JSONLD_REGEX.captures_iter(html) {
        let Some(content) = captures.get(1) else {
            continue;
        };
        let sanitized = sanitize_json(content.as_str());
        let Ok(json) = serde_json::from_str::<Value>(&sanitized) else {
            tracing::debug!("Skipping unparseable JSON-LD block");
            continue;
        };
        let urls: Vec<String> = find_images_in_json(&json)
            .iter()
            .filter_map(|raw| clean_candidate(raw, base))
            .collect();
        if !urls.is_empty() {
            return dedupe(urls);
        }
    }
    Vec::new()
}

/// Escape bare control characters inside JSON string literals.
///
/// Real-world JSON-LD frequently contains literal newlines in description
/// fields, which strict parsers reject.
fn sanitize_json(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut in_string = false;
    let mut prev_was_backslash = false;

    for c in json.chars() {
        if in_string {
            match c {
                '"' if !prev_was_backslash => {
                    in_string = false;
                    result.push(c);
                }
                '\n' => result.push_str("\\n"),
                '\r' => result.push_str("\\r"),
                '\t' => result.push_str("\\t"),
                _ => result.push(c),
            }
            prev_was_backslash = c == '\\' && !prev_was_backslash;
        } else {
            if c == '"' {
                in_string = true;
            }
            result.push(c);
            prev_was_backslash = false;
        }
    }

    result
}

/// Recursively search a JSON-LD document for an `image` field.
///
/// Handles `@graph` containers and arrays of objects; the first object
/// carrying a non-empty image wins.
fn find_images_in_json(json: &Value) -> Vec<String> {
    match json {
        Value::Object(map) => {
            if let Some(image) = map.get("image") {
                let urls = collect_image_urls(image);
                if !urls.is_empty() {
                    return urls;
                }
            }
            if let Some(graph) = map.get("@graph") {
                let urls = find_images_in_json(graph);
                if !urls.is_empty() {
                    return urls;
                }
            }
            for value in map.values() {
                if value.is_object() || value.is_array() {
                    let urls = find_images_in_json(value);
                    if !urls.is_empty() {
                        return urls;
                    }
                }
            }
            Vec::new()
        }
        Value::Array(items) => {
            for item in items {
                let urls = find_images_in_json(item);
                if !urls.is_empty() {
                    return urls;
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Flatten the JSON-LD `image` shapes: a string, an ImageObject with a
/// `url` field, or an array of either.
fn collect_image_urls(image: &Value) -> Vec<String> {
    match image {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(obj) => obj.get("url").and_then(|u| u.as_str()).map(String::from),
                _ => None,
            })
            .collect(),
        Value::Object(obj) => obj
            .get("url")
            .and_then(|u| u.as_str())
            .map(|s| vec![s.to_string()])
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Collect images from the first gallery selector that yields any.
fn extract_gallery_images(document: &Html, base: Option<&Url>) -> Vec<String> {
    for selector_text in GALLERY_SELECTORS {
        let Ok(selector) = Selector::parse(selector_text) else {
            continue;
        };
        let mut urls = Vec::new();
        for element in document.select(&selector) {
            let Some(raw) = image_source(&element) else {
                continue;
            };
            if looks_like_logo(&element, raw) {
                continue;
            }
            if let Some(url) = clean_candidate(raw, base) {
                urls.push(url);
            }
        }
        let urls = dedupe(urls);
        if !urls.is_empty() {
            return urls;
        }
    }
    Vec::new()
}

/// Last resort: the first non-logo image anywhere on the page.
fn extract_first_image(document: &Html, base: Option<&Url>) -> Option<String> {
    let selector = Selector::parse("img").ok()?;
    for element in document.select(&selector) {
        let Some(raw) = image_source(&element) else {
            continue;
        };
        if looks_like_logo(&element, raw) {
            continue;
        }
        if let Some(url) = clean_candidate(raw, base) {
            return Some(url);
        }
    }
    None
}

/// Pull the image source, preferring `src` over lazy-loading attributes.
fn image_source<'a>(element: &ElementRef<'a>) -> Option<&'a str> {
    let value = element.value();
    value
        .attr("src")
        .or_else(|| value.attr("data-src"))
        .or_else(|| value.attr("data-lazy-src"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn looks_like_logo(element: &ElementRef<'_>, src: &str) -> bool {
    let mut haystack = src.to_lowercase();
    if let Some(alt) = element.value().attr("alt") {
        haystack.push(' ');
        haystack.push_str(&alt.to_lowercase());
    }
    if let Some(class) = element.value().attr("class") {
        haystack.push(' ');
        haystack.push_str(&class.to_lowercase());
    }
    LOGO_KEYWORDS
        .iter()
        .any(|keyword| haystack.contains(keyword))
}

/// Resolve a raw candidate against the page URL and keep only http(s) results.
fn clean_candidate(raw: &str, base: Option<&Url>) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let resolved = match base {
        Some(base) => base.join(raw).ok()?,
        None => Url::parse(raw).ok()?,
    };
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

fn dedupe(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter().filter(|url| seen.insert(url.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://shop.example.com/product/42";

    #[test]
    fn test_og_image_wins_over_gallery() {
        let html = r#"
            <html>
            <head>
                <meta property="og:image" content="https://cdn.example.com/og/main.jpg">
            </head>
            <body>
                <div class="product-gallery">
                    <img src="https://cdn.example.com/gallery/one.jpg">
                </div>
            </body>
            </html>
        "#;

        let candidates = extract_image_candidates(html, PAGE_URL);
        assert_eq!(candidates, vec!["https://cdn.example.com/og/main.jpg"]);
    }

    #[test]
    fn test_og_image_attribute_order_reversed() {
        let html = r#"
            <html><head>
                <meta content="https://cdn.example.com/og/reversed.jpg" property="og:image">
            </head><body></body></html>
        "#;

        let candidates = extract_image_candidates(html, PAGE_URL);
        assert_eq!(candidates, vec!["https://cdn.example.com/og/reversed.jpg"]);
    }

    #[test]
    fn test_twitter_image_when_no_og() {
        let html = r#"
            <html><head>
                <meta name="twitter:card" content="summary_large_image">
                <meta name="twitter:image" content="https://cdn.example.com/tw/card.jpg">
            </head><body></body></html>
        "#;

        let candidates = extract_image_candidates(html, PAGE_URL);
        assert_eq!(candidates, vec!["https://cdn.example.com/tw/card.jpg"]);
    }

    #[test]
    fn test_twitter_image_property_variant() {
        let html = r#"
            <html><head>
                <meta property="twitter:image" content="/media/card.jpg">
            </head><body></body></html>
        "#;

        let candidates = extract_image_candidates(html, PAGE_URL);
        assert_eq!(candidates, vec!["https://shop.example.com/media/card.jpg"]);
    }

    #[test]
    fn test_jsonld_image_string() {
        let html = r#"
            <html><head>
                <script type="application/ld+json">
                {
                    "@context": "https://schema.org",
                    "@type": "Product",
                    "name": "Stapler",
                    "image": "https://cdn.example.com/jsonld/stapler.jpg"
                }
                </script>
            </head><body></body></html>
        "#;

        let candidates = extract_image_candidates(html, PAGE_URL);
        assert_eq!(candidates, vec!["https://cdn.example.com/jsonld/stapler.jpg"]);
    }

    #[test]
    fn test_jsonld_image_array_of_objects() {
        let html = r#"
            <html><head>
                <script type="application/ld+json">
                {
                    "@type": "Product",
                    "image": [
                        {"@type": "ImageObject", "url": "https://cdn.example.com/a.jpg"},
                        {"@type": "ImageObject", "url": "https://cdn.example.com/b.jpg"}
                    ]
                }
                </script>
            </head><body></body></html>
        "#;

        let candidates = extract_image_candidates(html, PAGE_URL);
        assert_eq!(
            candidates,
            vec![
                "https://cdn.example.com/a.jpg",
                "https://cdn.example.com/b.jpg"
            ]
        );
    }

    #[test]
    fn test_jsonld_image_inside_graph() {
        let html = r#"
            <html><head>
                <script type="application/ld+json">
                {
                    "@context": "https://schema.org",
                    "@graph": [
                        {"@type": "WebSite", "name": "Shop"},
                        {"@type": "Product", "image": "https://cdn.example.com/graph.jpg"}
                    ]
                }
                </script>
            </head><body></body></html>
        "#;

        let candidates = extract_image_candidates(html, PAGE_URL);
        assert_eq!(candidates, vec!["https://cdn.example.com/graph.jpg"]);
    }

    #[test]
    fn test_jsonld_with_literal_newlines_in_strings() {
        let html = "<html><head><script type=\"application/ld+json\">\n{\n\"@type\": \"Product\",\n\"description\": \"line one\nline two\",\n\"image\": \"https://cdn.example.com/sanitized.jpg\"\n}\n</script></head><body></body></html>";

        let candidates = extract_image_candidates(html, PAGE_URL);
        assert_eq!(candidates, vec!["https://cdn.example.com/sanitized.jpg"]);
    }

    #[test]
    fn test_gallery_selector_filters_logos() {
        let html = r#"
            <html><body>
                <div class="product-gallery">
                    <img src="https://cdn.example.com/site-logo.png" alt="Store logo">
                    <img src="https://cdn.example.com/items/chair.jpg" alt="Office chair">
                </div>
            </body></html>
        "#;

        let candidates = extract_image_candidates(html, PAGE_URL);
        assert_eq!(candidates, vec!["https://cdn.example.com/items/chair.jpg"]);
    }

    #[test]
    fn test_gallery_selector_priority() {
        let html = r#"
            <html><body>
                <div class="gallery">
                    <img src="https://cdn.example.com/generic.jpg">
                </div>
                <div class="product-image">
                    <img src="https://cdn.example.com/specific.jpg">
                </div>
            </body></html>
        "#;

        let candidates = extract_image_candidates(html, PAGE_URL);
        assert_eq!(candidates, vec!["https://cdn.example.com/specific.jpg"]);
    }

    #[test]
    fn test_gallery_dedupes_repeated_sources() {
        let html = r#"
            <html><body>
                <div class="product-gallery">
                    <img src="https://cdn.example.com/items/desk.jpg">
                    <img src="https://cdn.example.com/items/desk.jpg">
                    <img src="https://cdn.example.com/items/lamp.jpg">
                </div>
            </body></html>
        "#;

        let candidates = extract_image_candidates(html, PAGE_URL);
        assert_eq!(
            candidates,
            vec![
                "https://cdn.example.com/items/desk.jpg",
                "https://cdn.example.com/items/lamp.jpg"
            ]
        );
    }

    #[test]
    fn test_lazy_loaded_source_attribute() {
        let html = r#"
            <html><body>
                <div class="product-image">
                    <img data-src="https://cdn.example.com/lazy/printer.jpg" alt="Printer">
                </div>
            </body></html>
        "#;

        let candidates = extract_image_candidates(html, PAGE_URL);
        assert_eq!(candidates, vec!["https://cdn.example.com/lazy/printer.jpg"]);
    }

    #[test]
    fn test_first_image_fallback_skips_logo() {
        let html = r#"
            <html><body>
                <header><img src="/assets/logo.svg" alt="Brand"></header>
                <article>
                    <img src="/photos/whiteboard.jpg" alt="Whiteboard marker set">
                </article>
            </body></html>
        "#;

        let candidates = extract_image_candidates(html, PAGE_URL);
        assert_eq!(
            candidates,
            vec!["https://shop.example.com/photos/whiteboard.jpg"]
        );
    }

    #[test]
    fn test_relative_and_protocol_relative_urls() {
        let html = r#"
            <html><body>
                <div class="product-gallery">
                    <img src="/images/one.jpg">
                    <img src="//cdn.example.com/two.jpg">
                </div>
            </body></html>
        "#;

        let candidates = extract_image_candidates(html, PAGE_URL);
        assert_eq!(
            candidates,
            vec![
                "https://shop.example.com/images/one.jpg",
                "https://cdn.example.com/two.jpg"
            ]
        );
    }

    #[test]
    fn test_non_http_sources_dropped() {
        let html = r#"
            <html><body>
                <div class="product-image">
                    <img src="data:image/gif;base64,R0lGODlhAQABAA==">
                    <img src="https://cdn.example.com/real.jpg">
                </div>
            </body></html>
        "#;

        let candidates = extract_image_candidates(html, PAGE_URL);
        assert_eq!(candidates, vec!["https://cdn.example.com/real.jpg"]);
    }

    #[test]
    fn test_empty_page_yields_nothing() {
        assert!(extract_image_candidates("", PAGE_URL).is_empty());
        assert!(extract_image_candidates("<html><body></body></html>", PAGE_URL).is_empty());
    }
}
