use chrono::{TimeZone, Utc};
use tracing::info;

use crate::config::GeneratorConfig;
use crate::error::{GeneratorError, Result};
use crate::model::output::OutputPayload;
use crate::model::template::SkipTally;
use crate::parsers::index;
use crate::services::{
    assemble,
    fetch::{self, FetchOutcome},
    integrity, publish,
    store::{EtagCache, FileVersionStore},
    version::{VersionDecision, VersionManager, VersionStore},
};

/// Result of the in-memory transformation. Nothing has been written yet.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub payload: OutputPayload,
    pub decision: VersionDecision,
    pub total_entries: usize,
    pub skipped: SkipTally,
}

/// Raw index bytes to a sealed payload. Reads version state but never writes it.
pub fn process<S: VersionStore>(
    raw_payload: &[u8],
    source_url: &str,
    versions: &VersionManager<S>,
    now_ms: i64,
) -> Result<PipelineOutput> {
    let decision = versions.decide(raw_payload, now_ms)?;

    let doc = index::decode_payload(raw_payload)?;
    let entries = index::extract_entries(&doc);
    let (templates, skipped) = assemble::build_templates(&entries, decision.generated_at_epoch);

    let payload = integrity::seal(integrity::build_output(
        templates,
        decision.version,
        decision.generated_at_epoch,
        source_url,
        &decision.source_sha256,
        String::new(),
    ))?;

    Ok(PipelineOutput {
        payload,
        decision,
        total_entries: entries.len(),
        skipped,
    })
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub source_url: String,
    pub http_status: u16,
    pub etag: Option<String>,
    pub source_sha256: String,
    pub total_entries: usize,
    pub templates: usize,
    pub skipped: SkipTally,
    pub version: u64,
    pub generated_at_epoch: i64,
    pub changed: bool,
}

impl RunReport {
    pub fn summary(&self) -> String {
        let top_reasons = self
            .skipped
            .most_common(5)
            .iter()
            .map(|(reason, count)| format!("{reason}={count}"))
            .collect::<Vec<_>>()
            .join(", ");
        let top_reasons = if top_reasons.is_empty() {
            "none".to_string()
        } else {
            top_reasons
        };
        let generated = Utc
            .timestamp_millis_opt(self.generated_at_epoch)
            .single()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| self.generated_at_epoch.to_string());

        format!(
            "Summary:\n\
             - input URL: {}\n\
             - http status: {}\n\
             - etag: {}\n\
             - sourceIndexSha256: {}\n\
             - version: {} ({})\n\
             - generated at: {}\n\
             - total entries: {}\n\
             - templates: {}\n\
             - skipped: {} (top reasons: {})",
            self.source_url,
            self.http_status,
            self.etag.as_deref().unwrap_or("none"),
            self.source_sha256,
            self.version,
            if self.changed { "new" } else { "unchanged" },
            generated,
            self.total_entries,
            self.templates,
            self.skipped.total(),
            top_reasons,
        )
    }
}

#[derive(Debug, Clone)]
pub enum GenerateOutcome {
    NotModified { url: String },
    Published(RunReport),
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Fetch, transform, publish, then persist version state if it moved.
pub fn generate(cfg: &GeneratorConfig) -> Result<GenerateOutcome> {
    let mut etags = EtagCache::load(&cfg.cache_dir);

    let result = match fetch::fetch_index(cfg, &etags)? {
        FetchOutcome::NotModified { url } => {
            info!(url = %url, "index not modified");
            return Ok(GenerateOutcome::NotModified { url });
        }
        FetchOutcome::Fetched(r) => r,
    };

    if result.payload.is_empty() {
        return Err(GeneratorError::Fetch("no payload received".into()));
    }

    if let Some(tag) = &result.etag {
        etags.insert(&result.url, tag);
        etags.save()?;
    }

    let mut versions = VersionManager::new(FileVersionStore::new(&cfg.cache_dir));
    let out = process(&result.payload, &result.url, &versions, now_ms())?;

    let published = publish::publish(&out.payload, &cfg.outdir)?;
    info!(
        path = %published.compact.display(),
        sha256 = %published.compact_sha256,
        "templates published"
    );

    versions.commit(&out.decision)?;

    Ok(GenerateOutcome::Published(RunReport {
        source_url: result.url,
        http_status: result.status,
        etag: result.etag,
        source_sha256: out.decision.source_sha256.clone(),
        total_entries: out.total_entries,
        templates: out.payload.count,
        skipped: out.skipped,
        version: out.decision.version,
        generated_at_epoch: out.decision.generated_at_epoch,
        changed: out.decision.changed,
    }))
}
