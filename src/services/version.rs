use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::model::output::VersionState;
use crate::services::hash;

/// Where `VersionState` lives between runs.
pub trait VersionStore {
    fn load(&self) -> Result<Option<VersionState>>;
    fn save(&mut self, state: &VersionState) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryVersionStore {
    state: Option<VersionState>,
    saves: usize,
}

impl MemoryVersionStore {
    pub fn with_state(state: VersionState) -> Self {
        MemoryVersionStore {
            state: Some(state),
            saves: 0,
        }
    }

    pub fn state(&self) -> Option<&VersionState> {
        self.state.as_ref()
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl VersionStore for MemoryVersionStore {
    fn load(&self) -> Result<Option<VersionState>> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &VersionState) -> Result<()> {
        self.state = Some(state.clone());
        self.saves += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDecision {
    pub source_sha256: String,
    pub version: u64,
    pub generated_at_epoch: i64,
    pub changed: bool,
}

impl VersionDecision {
    pub fn state(&self) -> VersionState {
        VersionState {
            version: self.version,
            source_index_sha256: self.source_sha256.clone(),
            generated_at_epoch: self.generated_at_epoch,
        }
    }
}

/// Content-addressed versioning: bump only when the source hash moves.
pub fn calculate_version(source_sha: &str, stored: Option<&VersionState>, now_ms: i64) -> VersionDecision {
    let (last_sha, last_version, last_generated) = match stored {
        Some(s) => (Some(s.source_index_sha256.as_str()), s.version, s.generated_at_epoch),
        None => (None, 0, 0),
    };

    let changed = last_sha != Some(source_sha);
    let version = if changed {
        last_version.saturating_add(1)
    } else {
        last_version.max(1)
    };
    let generated_at_epoch = if changed || last_generated == 0 {
        now_ms
    } else {
        last_generated
    };

    VersionDecision {
        source_sha256: source_sha.to_string(),
        version,
        generated_at_epoch,
        changed,
    }
}

pub struct VersionManager<S: VersionStore> {
    store: S,
}

impl<S: VersionStore> VersionManager<S> {
    pub fn new(store: S) -> Self {
        VersionManager { store }
    }

    /// Hashes the raw payload and decides version/timestamp. Reads the store once.
    pub fn decide(&self, raw_payload: &[u8], now_ms: i64) -> Result<VersionDecision> {
        let source_sha = hash::sha256_hex(raw_payload);
        let stored = self.store.load()?;
        Ok(calculate_version(&source_sha, stored.as_ref(), now_ms))
    }

    /// Persists the new state only when the source changed. Returns whether it wrote.
    pub fn commit(&mut self, decision: &VersionDecision) -> Result<bool> {
        if !decision.changed {
            return Ok(false);
        }
        self.store.save(&decision.state())?;
        info!(version = decision.version, "version state updated");
        Ok(true)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
