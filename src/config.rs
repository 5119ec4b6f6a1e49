use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::types::Product;

/// Browser user-agent sent with every product page request — the site serves
/// a degraded page to unknown agents.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Per-request timeout for product page fetches (seconds).
pub const FETCH_TIMEOUT_SECS: u64 = 10;

/// Price pattern matches scanned per page; the lowest of the first few is
/// taken as the sale price.
pub const PRICE_SCAN_LIMIT: usize = 5;

pub const DEFAULT_STATE_FILE: &str = "monitor_state.json";
pub const DEFAULT_CHECK_INTERVAL_MINUTES: u64 = 15;
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
/// Politeness delay between product fetches within a cycle (seconds).
pub const DEFAULT_FETCH_DELAY_SECS: u64 = 2;

// ---------------------------------------------------------------------------
// TierConfig
// ---------------------------------------------------------------------------

/// Deal-tier price ceilings. S1 is `price < s1_ceiling`, S2 is
/// `s1_ceiling <= price < s2_ceiling`, everything at or above `s2_ceiling`
/// is no deal at all.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    pub s1_ceiling: f64,
    pub s2_ceiling: f64,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self { s1_ceiling: 50.0, s2_ceiling: 60.0 }
    }
}

impl TierConfig {
    /// Invariant: `0 < s1_ceiling <= s2_ceiling`, both finite. Checked once
    /// at startup — there is no meaningful tier boundary to evaluate
    /// otherwise, so a violation fails the whole run.
    pub fn validate(&self) -> Result<()> {
        if !self.s1_ceiling.is_finite()
            || !self.s2_ceiling.is_finite()
            || self.s1_ceiling <= 0.0
            || self.s1_ceiling > self.s2_ceiling
        {
            return Err(AppError::Config(format!(
                "tier thresholds must satisfy 0 < s1_ceiling <= s2_ceiling \
                 (got s1_ceiling={}, s2_ceiling={})",
                self.s1_ceiling, self.s2_ceiling,
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub from: String,
    pub to: String,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: Option<String>,
    /// Usually left out of the config file and supplied via SMTP_PASSWORD.
    #[serde(default)]
    pub password: Option<String>,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub products: Vec<Product>,
    #[serde(default)]
    pub tiers: TierConfig,
    /// Absent email section means alerts are logged instead of delivered.
    #[serde(default)]
    pub email: Option<EmailConfig>,
    #[serde(default = "default_check_interval")]
    pub check_interval_minutes: u64,
    #[serde(default = "default_state_file")]
    pub state_file: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_fetch_delay")]
    pub fetch_delay_secs: u64,
}

impl Config {
    /// Load and validate the JSON config file, then apply environment
    /// overrides (LOG_LEVEL, SMTP_PASSWORD).
    pub fn load(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read config file {path}: {e}"))
        })?;
        let mut cfg: Config = serde_json::from_str(&raw).map_err(|e| {
            AppError::Config(format!("cannot parse config file {path}: {e}"))
        })?;

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            cfg.log_level = level;
        }
        if let Ok(password) = std::env::var("SMTP_PASSWORD") {
            if let Some(email) = cfg.email.as_mut() {
                email.password = Some(password);
            }
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.tiers.validate()?;
        if self.products.is_empty() {
            return Err(AppError::Config(
                "config contains no products to track".to_string(),
            ));
        }
        if self.check_interval_minutes == 0 {
            return Err(AppError::Config(
                "check_interval_minutes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_smtp_host() -> String {
    DEFAULT_SMTP_HOST.to_string()
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_MINUTES
}

fn default_state_file() -> String {
    DEFAULT_STATE_FILE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fetch_delay() -> u64 {
    DEFAULT_FETCH_DELAY_SECS
}
