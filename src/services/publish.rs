use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GeneratorError, Result};
use crate::model::output::{OutputPayload, VersionSummary};
use crate::services::{canonical, hash, store};

pub const PRETTY_FILE: &str = "templates.json";
pub const COMPACT_FILE: &str = "templates.min.json";
pub const CHECKSUM_FILE: &str = "templates.min.json.sha256";
pub const SUMMARY_FILE: &str = "version.json";

/// Every artifact fully rendered before anything touches disk.
#[derive(Debug, Clone)]
pub struct RenderedOutputs {
    pub pretty: String,
    pub compact: String,
    pub compact_sha256: String,
    pub summary: String,
}

pub fn render(payload: &OutputPayload) -> Result<RenderedOutputs> {
    let pretty = canonical::to_pretty_string(payload)?;
    let compact = canonical::to_canonical_string(payload)?;
    let compact_sha256 = hash::sha256_hex(compact.as_bytes());
    let summary = canonical::to_pretty_string(&VersionSummary::from(payload))?;

    Ok(RenderedOutputs {
        pretty,
        compact,
        compact_sha256,
        summary,
    })
}

#[derive(Debug, Clone)]
pub struct PublishedPaths {
    pub pretty: PathBuf,
    pub compact: PathBuf,
    pub checksum: PathBuf,
    pub summary: PathBuf,
    pub compact_sha256: String,
}

pub fn publish(payload: &OutputPayload, outdir: &Path) -> Result<PublishedPaths> {
    let rendered = render(payload)?;

    fs::create_dir_all(outdir).map_err(|e| GeneratorError::io(outdir, e))?;

    let paths = PublishedPaths {
        pretty: outdir.join(PRETTY_FILE),
        compact: outdir.join(COMPACT_FILE),
        checksum: outdir.join(CHECKSUM_FILE),
        summary: outdir.join(SUMMARY_FILE),
        compact_sha256: rendered.compact_sha256.clone(),
    };

    store::write_atomic(&paths.pretty, rendered.pretty.as_bytes())?;
    store::write_atomic(&paths.compact, rendered.compact.as_bytes())?;
    store::write_atomic(&paths.checksum, rendered.compact_sha256.as_bytes())?;
    store::write_atomic(&paths.summary, rendered.summary.as_bytes())?;

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::integrity;
    use pretty_assertions::assert_eq;

    fn payload() -> OutputPayload {
        integrity::seal(integrity::build_output(
            Vec::new(),
            7,
            1_700_000_000_000,
            "https://example.com/index.json",
            "abc",
            String::new(),
        ))
        .unwrap()
    }

    #[test]
    fn checksum_matches_compact_bytes_not_templates_sha() {
        let r = render(&payload()).unwrap();
        assert_eq!(r.compact_sha256, hash::sha256_hex(r.compact.as_bytes()));
        // the compact file carries the filled hash, so its digest differs
        assert_ne!(r.compact_sha256, payload().templates_sha256);
    }

    #[test]
    fn writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let paths = publish(&payload(), &out).unwrap();

        let compact = fs::read(&paths.compact).unwrap();
        assert_eq!(
            fs::read_to_string(&paths.checksum).unwrap(),
            hash::sha256_hex(&compact)
        );

        let summary: VersionSummary =
            serde_json::from_str(&fs::read_to_string(&paths.summary).unwrap()).unwrap();
        assert_eq!(
            summary,
            VersionSummary {
                version: 7,
                generated_at_epoch: 1_700_000_000_000
            }
        );

        let pretty: OutputPayload =
            serde_json::from_str(&fs::read_to_string(&paths.pretty).unwrap()).unwrap();
        assert_eq!(pretty, payload());
    }
}
