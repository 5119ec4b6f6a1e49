use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::Result;
use crate::types::ProductState;

/// Full persisted snapshot: product identifier (URL) → tracked state.
pub type StateMap = HashMap<String, ProductState>;

/// Returns the existing record or a fresh zero-valued one. Does not insert —
/// the caller upserts the decided next state after the cycle's decision.
pub fn get_or_create(map: &StateMap, product_id: &str) -> ProductState {
    map.get(product_id).cloned().unwrap_or_default()
}

/// JSON snapshot store for the per-product state map.
///
/// Load and save operate on the full snapshot as a single unit — one
/// read-modify-write per cycle, no per-product transactions. The store is
/// only ever touched from the single cycle task, so there is no locking.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the persisted snapshot. Missing or corrupt data degrades to an
    /// empty map (cold start) — one unreadable state file must not block
    /// alerting for every product.
    pub fn load(&self) -> StateMap {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file at {} — cold start", self.path.display());
                return StateMap::new();
            }
            Err(e) => {
                warn!(
                    "Cannot read state file {} ({e}) — starting cold; \
                     already-alerted products may re-alert",
                    self.path.display(),
                );
                return StateMap::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                warn!(
                    "State file {} is corrupt ({e}) — starting cold; \
                     already-alerted products may re-alert",
                    self.path.display(),
                );
                StateMap::new()
            }
        }
    }

    /// Persist the full snapshot. Writes a sibling temp file and renames it
    /// into place so a crash mid-write leaves the previous snapshot intact
    /// rather than a truncated one.
    pub fn save(&self, map: &StateMap) -> Result<()> {
        let json = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
