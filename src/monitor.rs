use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::Config;
use crate::engine::decide;
use crate::fetcher::Fetch;
use crate::mailer::Mailer;
use crate::state::{get_or_create, StateStore};
use crate::types::AlertRequest;

/// Cycle-level outcome: how many products were processed, how many alerts
/// went out, how many per-product or delivery errors were swallowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub products_checked: usize,
    pub alerts_fired: usize,
    pub errors: usize,
}

/// Runs check cycles over the tracked product list: fetch, decide, persist
/// one state snapshot, dispatch the collected alerts.
pub struct Monitor<F, M> {
    cfg: Config,
    store: StateStore,
    fetcher: F,
    mailer: M,
}

impl<F: Fetch, M: Mailer> Monitor<F, M> {
    pub fn new(cfg: Config, store: StateStore, fetcher: F, mailer: M) -> Self {
        Self { cfg, store, fetcher, mailer }
    }

    /// Scheduled mode: one cycle immediately, then one per configured
    /// interval. A slow cycle delays the next tick — cycles never overlap.
    pub async fn run(self) {
        let mut ticker =
            interval(Duration::from_secs(self.cfg.check_interval_minutes * 60));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.run_cycle().await;
        }
    }

    /// One full pass over the tracked products. Per-product failures are
    /// isolated: a bad fetch or a contract-violating observation skips that
    /// product for this cycle and the rest continue.
    pub async fn run_cycle(&self) -> CycleReport {
        info!("[CYCLE] Checking {} products", self.cfg.products.len());

        let mut states = self.store.load();
        let mut report = CycleReport::default();
        let mut alerts: Vec<AlertRequest> = Vec::new();

        for (idx, product) in self.cfg.products.iter().enumerate() {
            report.products_checked += 1;

            let obs = match self.fetcher.observe(product).await {
                Ok(obs) => obs,
                Err(e) => {
                    warn!("[CYCLE] Fetch failed for {}: {e}", product.url);
                    report.errors += 1;
                    continue;
                }
            };

            info!(
                url = %product.url,
                in_stock = obs.in_stock,
                price = ?obs.price,
                "[CYCLE] {} | in_stock={} price={:?}",
                obs.name, obs.in_stock, obs.price,
            );

            let prior = get_or_create(&states, &product.url);
            let decision =
                match decide(&prior, &product.url, &obs, &self.cfg.tiers, now_secs()) {
                    Ok(d) => d,
                    Err(e) => {
                        warn!("[CYCLE] Skipping {}: {e}", product.url);
                        report.errors += 1;
                        continue;
                    }
                };

            if let Some(alert) = decision.alert {
                info!(
                    "[CYCLE] {} entered tier {} — alert queued",
                    product.url, alert.tier,
                );
                alerts.push(alert);
            }
            states.insert(product.url.clone(), decision.next_state);

            // Don't hammer the storefront.
            if self.cfg.fetch_delay_secs > 0 && idx + 1 < self.cfg.products.len() {
                tokio::time::sleep(Duration::from_secs(self.cfg.fetch_delay_secs)).await;
            }
        }

        // Persist before dispatch. A failed save downgrades alerting to
        // at-least-once (the same alert may repeat next cycle) but never
        // suppresses the alerts already decided.
        if let Err(e) = self.store.save(&states) {
            warn!(
                "[CYCLE] State save failed ({e}) — alerts still dispatch; \
                 duplicates possible next cycle"
            );
            report.errors += 1;
        }

        for alert in &alerts {
            match self.mailer.deliver(alert).await {
                Ok(()) => {
                    report.alerts_fired += 1;
                    info!("[ALERT] Sent \"{}\" for {}", alert.subject, alert.name);
                }
                Err(e) => {
                    report.errors += 1;
                    warn!("[ALERT] Delivery failed for {}: {e}", alert.product_id);
                }
            }
        }

        info!(
            products = report.products_checked,
            alerts = report.alerts_fired,
            errors = report.errors,
            "[CYCLE] Complete | checked={} alerts={} errors={}",
            report.products_checked, report.alerts_fired, report.errors,
        );
        report
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
