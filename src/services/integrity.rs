use crate::error::Result;
use crate::model::output::OutputPayload;
use crate::model::template::NormalizedTemplate;
use crate::services::{canonical, hash};

pub fn build_output(
    templates: Vec<NormalizedTemplate>,
    version: u64,
    generated_at_epoch: i64,
    source_index_url: &str,
    source_index_sha256: &str,
    templates_sha256: String,
) -> OutputPayload {
    OutputPayload {
        version,
        generated_at_epoch,
        count: templates.len(),
        source_index_url: source_index_url.to_string(),
        source_index_sha256: source_index_sha256.to_string(),
        templates_sha256,
        templates,
    }
}

/// Hash of the canonical payload with `templatesSha256` held at "".
pub fn templates_sha256(payload: &OutputPayload) -> Result<String> {
    let mut placeholder = payload.clone();
    placeholder.templates_sha256 = String::new();
    let text = canonical::to_canonical_string(&placeholder)?;
    Ok(hash::sha256_hex(text.as_bytes()))
}

/// Computes the self-referential hash once and splices it in. The filled
/// value is never fed back into the hash.
pub fn seal(mut payload: OutputPayload) -> Result<OutputPayload> {
    payload.templates_sha256 = templates_sha256(&payload)?;
    Ok(payload)
}

pub fn verify_templates_sha256(payload: &OutputPayload) -> Result<bool> {
    Ok(templates_sha256(payload)? == payload.templates_sha256)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::hash::template_id;

    fn template() -> NormalizedTemplate {
        NormalizedTemplate {
            id: template_id("example.com"),
            name: "Test".into(),
            domain: "example.com".into(),
            base_url: "https://example.com".into(),
            engine_type: "GENERIC".into(),
            lang: None,
            is_nsfw: false,
            has_cloudflare: false,
            is_dead: false,
            updated_at_epoch: 123,
        }
    }

    fn unsealed() -> OutputPayload {
        build_output(
            vec![template()],
            1,
            123,
            "https://example.com/index.json",
            "deadbeef",
            String::new(),
        )
    }

    #[test]
    fn hash_covers_placeholder_not_filled_value() {
        let sealed = seal(unsealed()).unwrap();
        let expected = hash::sha256_hex(
            canonical::to_canonical_string(&unsealed()).unwrap().as_bytes(),
        );
        assert_eq!(sealed.templates_sha256, expected);

        // sealing twice must not hash the previous hash into itself
        let resealed = seal(sealed.clone()).unwrap();
        assert_eq!(resealed.templates_sha256, sealed.templates_sha256);
        assert!(verify_templates_sha256(&sealed).unwrap());
    }

    #[test]
    fn hash_is_pure_function_of_inputs() {
        let a = seal(unsealed()).unwrap();
        let b = seal(unsealed()).unwrap();
        assert_eq!(a.templates_sha256, b.templates_sha256);

        let mut other = unsealed();
        other.version = 2;
        assert_ne!(seal(other).unwrap().templates_sha256, a.templates_sha256);
    }

    #[test]
    fn tampering_is_detected() {
        let mut sealed = seal(unsealed()).unwrap();
        sealed.templates[0].name = "Changed".into();
        assert!(!verify_templates_sha256(&sealed).unwrap());
    }

    #[test]
    fn payload_round_trips_through_canonical_text() {
        let sealed = seal(unsealed()).unwrap();
        assert_eq!(sealed.count, 1);
        let text = canonical::to_canonical_string(&sealed).unwrap();
        assert!(text.contains(r#""lang":null"#));
        assert!(text.starts_with(r#"{"count":1,"generatedAtEpoch":123,"sourceIndexSha256":"deadbeef""#));
        let back: OutputPayload = serde_json::from_str(&text).unwrap();
        assert_eq!(back, sealed);
    }
}
