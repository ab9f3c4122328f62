use std::fs;
use std::path::Path;

use crate::error::{GeneratorError, Result};
use crate::model::output::OutputPayload;
use crate::services::{hash, integrity, publish};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub version: u64,
    pub count: usize,
    pub compact_sha256: String,
    pub templates_sha256: String,
}

/// Checks a published directory the way a consumer would: the sidecar
/// digest against the compact file, then the embedded `templatesSha256`.
pub fn verify_dir(dir: &Path) -> Result<VerifyReport> {
    let compact_path = dir.join(publish::COMPACT_FILE);
    let checksum_path = dir.join(publish::CHECKSUM_FILE);

    let compact = fs::read(&compact_path).map_err(|e| GeneratorError::io(&compact_path, e))?;
    let sidecar =
        fs::read_to_string(&checksum_path).map_err(|e| GeneratorError::io(&checksum_path, e))?;

    let expected = sidecar.split_whitespace().next().unwrap_or("");
    let actual = hash::sha256_hex(&compact);
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(GeneratorError::Integrity(format!(
            "{} sha256 {actual} does not match sidecar {expected}",
            publish::COMPACT_FILE
        )));
    }

    let payload: OutputPayload = serde_json::from_slice(&compact)?;
    if !integrity::verify_templates_sha256(&payload)? {
        return Err(GeneratorError::Integrity(
            "templatesSha256 does not match payload".into(),
        ));
    }
    if payload.count != payload.templates.len() {
        return Err(GeneratorError::Integrity(format!(
            "count {} but {} templates",
            payload.count,
            payload.templates.len()
        )));
    }

    Ok(VerifyReport {
        version: payload.version,
        count: payload.count,
        compact_sha256: actual,
        templates_sha256: payload.templates_sha256,
    })
}
