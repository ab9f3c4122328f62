use serde::{Deserialize, Serialize};

use super::template::NormalizedTemplate;

/// The published artifact. `templates_sha256` is derived from this same
/// structure with the field held empty; see `services::integrity`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutputPayload {
    pub version: u64,
    pub generated_at_epoch: i64,
    pub count: usize,
    pub source_index_url: String,
    pub source_index_sha256: String,
    pub templates_sha256: String,
    pub templates: Vec<NormalizedTemplate>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub version: u64,
    pub generated_at_epoch: i64,
}

impl From<&OutputPayload> for VersionSummary {
    fn from(p: &OutputPayload) -> Self {
        VersionSummary {
            version: p.version,
            generated_at_epoch: p.generated_at_epoch,
        }
    }
}

/// Persisted between runs; only rewritten when the source hash changes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VersionState {
    #[serde(default)]
    pub version: u64,

    #[serde(default)]
    pub source_index_sha256: String,

    #[serde(default)]
    pub generated_at_epoch: i64,
}
