use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// One tracked product-variant URL from the config file. The URL doubles as
/// the stable product identifier in the state snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub url: String,
    /// Optional display name override; the fetcher's extracted name wins
    /// only when this is absent.
    #[serde(default)]
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// One check cycle's normalized reading of a product page.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub in_stock: bool,
    /// Absent when no price could be extracted from the page.
    pub price: Option<f64>,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Tier classification
// ---------------------------------------------------------------------------

/// Price bracket of an in-stock observation. Closed enum — the decision
/// table over it is exhaustively checkable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Price at or above the S2 ceiling, or no tier recorded yet.
    #[default]
    None,
    /// Best deal — strictly below the S1 ceiling.
    S1,
    /// Great deal — in [s1_ceiling, s2_ceiling).
    S2,
}

impl Tier {
    /// Email subject line for an alert-worthy tier. `None` never alerts.
    pub fn subject(&self) -> Option<&'static str> {
        match self {
            Tier::S1 => Some("Best lululemon deal"),
            Tier::S2 => Some("Great lululemon deal"),
            Tier::None => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tier::None => "none",
            Tier::S1 => "s1",
            Tier::S2 => "s2",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// ProductState — persisted per product, mutated at most once per cycle
// ---------------------------------------------------------------------------

/// Tracked state for one product identifier.
///
/// `was_in_s1` / `was_in_s2` mean "ever observed in stock in that tier" and
/// are monotone — once true they never reset, so a tier re-entry can never
/// fire a duplicate alert. `last_tier` reflects the latest in-stock S1/S2
/// observation and is diagnostic only; it does not gate alerting and is not
/// cleared when the product goes out of stock.
///
/// Per-field serde defaults: a partially corrupt persisted record degrades
/// to zero values instead of failing the whole snapshot load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductState {
    pub was_in_s1: bool,
    pub was_in_s2: bool,
    pub last_tier: Tier,
    pub last_alerted_tier: Tier,
    pub last_checked_price: Option<f64>,
    /// Unix seconds of the most recent observation. Bookkeeping only.
    pub last_checked_at: Option<i64>,
}

// ---------------------------------------------------------------------------
// AlertRequest — handed to the mailer, at most one per product per cycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AlertRequest {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub tier: Tier,
    pub subject: &'static str,
    /// Unix seconds of the observation that fired this alert.
    pub checked_at: i64,
}
