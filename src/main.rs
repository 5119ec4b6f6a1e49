mod config;
mod engine;
mod error;
mod fetcher;
mod mailer;
mod monitor;
mod state;
mod types;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::Result;
use crate::fetcher::{Fetch, HttpFetcher};
use crate::mailer::{LogMailer, Mailer, SmtpMailer};
use crate::monitor::Monitor;
use crate::state::StateStore;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let once = args.iter().any(|a| a == "--once");
    let config_path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(String::as_str)
        .unwrap_or("config.json");

    let cfg = match Config::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg, once).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config, once: bool) -> Result<()> {
    info!(
        "Tracking {} products | tiers: S1 < ${:.0}, S2 < ${:.0} | state: {}",
        cfg.products.len(),
        cfg.tiers.s1_ceiling,
        cfg.tiers.s2_ceiling,
        cfg.state_file,
    );

    let store = StateStore::new(&cfg.state_file);
    let fetcher = HttpFetcher::new()?;

    match cfg.email.clone() {
        Some(email) => {
            let mailer = SmtpMailer::new(&email, cfg.tiers)?;
            info!("Alert delivery via SMTP relay {}:{}", email.smtp_host, email.smtp_port);
            run_monitor(Monitor::new(cfg, store, fetcher, mailer), once).await
        }
        None => {
            warn!("No email configuration — alerts will be logged, not delivered");
            run_monitor(Monitor::new(cfg, store, fetcher, LogMailer), once).await
        }
    }
}

async fn run_monitor<F: Fetch, M: Mailer>(monitor: Monitor<F, M>, once: bool) -> Result<()> {
    if once {
        // Single cycle for cron-style scheduling.
        monitor.run_cycle().await;
    } else {
        monitor.run().await;
    }
    Ok(())
}
