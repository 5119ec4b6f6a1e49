use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::config::{FETCH_TIMEOUT_SECS, PRICE_SCAN_LIMIT, USER_AGENT};
use crate::error::Result;
use crate::types::{Observation, Product};

/// Supplies one normalized observation per product per cycle. The cycle
/// orchestrator is generic over this so tests can run without network.
pub trait Fetch {
    async fn observe(&self, product: &Product) -> Result<Observation>;
}

// ---------------------------------------------------------------------------
// Page extraction
// ---------------------------------------------------------------------------

/// What the extractor could read off one product page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageData {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub in_stock: bool,
}

/// HTML extraction over the raw page text, in strategy order:
///
/// 1. JSON-LD `application/ld+json` product data — name, offer price,
///    availability.
/// 2. Markup stock phrases ("sold out online", "notify me", "add to bag") —
///    these override the JSON-LD availability, which lags the storefront.
/// 3. Dollar-amount scan as the price fallback, taking the lowest of the
///    first few matches (the sale price sits below the list price).
/// 4. `<h1>` then `<title>` as the name fallback.
pub struct PageExtractor {
    ldjson_re: Regex,
    h1_re: Regex,
    title_re: Regex,
    tag_re: Regex,
    price_re: Regex,
}

impl PageExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            ldjson_re: Regex::new(
                r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#,
            )?,
            h1_re: Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>")?,
            title_re: Regex::new(r"(?is)<title[^>]*>(.*?)</title>")?,
            tag_re: Regex::new(r"<[^>]+>")?,
            price_re: Regex::new(r"\$\s*(\d{1,3}(?:,\d{3})*(?:\.\d{2})?)")?,
        })
    }

    pub fn extract(&self, html: &str) -> PageData {
        let mut name = None;
        let mut price = None;
        let mut in_stock = false;

        if let Some(product) = self.find_ldjson_product(html) {
            if let Some(n) = product.get("name").and_then(|n| n.as_str()) {
                name = Some(n.trim().to_string());
            }
            if let Some(offers) = product.get("offers") {
                price = offers.get("price").and_then(|p| {
                    p.as_f64().or_else(|| p.as_str().and_then(|s| s.parse().ok()))
                });
                if let Some(avail) = offers.get("availability").and_then(|a| a.as_str()) {
                    let avail = avail.to_lowercase();
                    in_stock = avail.contains("instock") || avail.contains("in_stock");
                }
            }
        }

        // The rendered markup is the primary stock indicator — it reflects
        // the variant actually selected, where JSON-LD covers the product
        // as a whole.
        let lower = html.to_lowercase();
        if let Some(verdict) = stock_from_markup(&lower) {
            in_stock = verdict;
        }

        if price.is_none() {
            price = self.scan_price(html);
        }
        if name.is_none() {
            name = self.extract_name(html);
        }

        PageData { name, price, in_stock }
    }

    /// First JSON-LD block whose `@type` is `Product`.
    fn find_ldjson_product(&self, html: &str) -> Option<serde_json::Value> {
        for cap in self.ldjson_re.captures_iter(html) {
            let Ok(value) = serde_json::from_str::<serde_json::Value>(cap[1].trim()) else {
                continue;
            };
            if value.get("@type").and_then(|t| t.as_str()) == Some("Product") {
                return Some(value);
            }
        }
        None
    }

    /// Lowest dollar amount among the first `PRICE_SCAN_LIMIT` matches.
    fn scan_price(&self, html: &str) -> Option<f64> {
        self.price_re
            .captures_iter(html)
            .take(PRICE_SCAN_LIMIT)
            .filter_map(|cap| cap[1].replace(',', "").parse::<f64>().ok())
            .filter(|p| p.is_finite() && *p > 0.0)
            .min_by(|a, b| a.total_cmp(b))
    }

    fn extract_name(&self, html: &str) -> Option<String> {
        for re in [&self.h1_re, &self.title_re] {
            if let Some(cap) = re.captures(html) {
                let text = self.tag_re.replace_all(&cap[1], "");
                let text = text.trim();
                if !text.is_empty() {
                    return Some(text.to_string());
                }
            }
        }
        None
    }
}

/// Markup stock verdict, strongest signal first. "Sold out online" is the
/// storefront's exact out-of-stock banner; "notify me" is the sold-out
/// button label. Returns None when the page shows neither signal.
fn stock_from_markup(lower: &str) -> Option<bool> {
    if lower.contains("sold out online") {
        return Some(false);
    }
    if lower.contains("sold out") || lower.contains("out of stock") || lower.contains("notify me")
    {
        return Some(false);
    }
    if lower.contains("add to bag") || lower.contains("add to cart") {
        return Some(true);
    }
    None
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

pub struct HttpFetcher {
    client: reqwest::Client,
    extractor: PageExtractor,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, extractor: PageExtractor::new()? })
    }
}

impl Fetch for HttpFetcher {
    async fn observe(&self, product: &Product) -> Result<Observation> {
        let html = self
            .client
            .get(&product.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let page = self.extractor.extract(&html);
        debug!(
            url = %product.url,
            in_stock = page.in_stock,
            price = ?page.price,
            "[FETCH] {} | in_stock={} price={:?}",
            product.url, page.in_stock, page.price,
        );

        // A configured name override wins over whatever the page says.
        let name = product
            .name
            .clone()
            .or(page.name)
            .unwrap_or_else(|| "Unknown Product".to_string());

        Ok(Observation { in_stock: page.in_stock, price: page.price, name })
    }
}
