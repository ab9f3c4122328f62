use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One normalized, deduplicated site record. `domain` is unique across a run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTemplate {
    pub id: String,
    pub name: String,
    pub domain: String,
    pub base_url: String,
    pub engine_type: String,
    pub lang: Option<String>,
    pub is_nsfw: bool,
    pub has_cloudflare: bool,
    pub is_dead: bool,
    pub updated_at_epoch: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingBaseUrl,
    InvalidBaseUrl,
    DuplicateDomain,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingBaseUrl => "missing_base_url",
            SkipReason::InvalidBaseUrl => "invalid_base_url",
            SkipReason::DuplicateDomain => "duplicate_domain",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why entries did not become templates. Diagnostic only.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct SkipTally(BTreeMap<SkipReason, usize>);

impl SkipTally {
    pub fn record(&mut self, reason: SkipReason) {
        *self.0.entry(reason).or_insert(0) += 1;
    }

    pub fn get(&self, reason: SkipReason) -> usize {
        self.0.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Reasons ordered by descending count; ties keep declaration order.
    pub fn most_common(&self, n: usize) -> Vec<(SkipReason, usize)> {
        let mut v: Vec<(SkipReason, usize)> = self.0.iter().map(|(r, c)| (*r, *c)).collect();
        v.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        v.truncate(n);
        v
    }
}
