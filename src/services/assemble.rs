use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use crate::model::entry::RawEntry;
use crate::model::template::{NormalizedTemplate, SkipReason, SkipTally};
use crate::services::{classify, hash, normalize};

/// Numeric timestamps below this are seconds since epoch, otherwise millis.
pub const EPOCH_MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

const BASE_URL_KEYS: &[&str] = &[
    "baseUrl",
    "baseurl",
    "baseURL",
    "website",
    "site",
    "url",
    "domain",
    "sourceUrl",
    "sourceURL",
];
const SOURCE_BASE_URL_KEYS: &[&str] = &["baseUrl", "website"];
const NAME_KEYS: &[&str] = &["name", "sourceName", "title"];
const LANG_KEYS: &[&str] = &["lang", "language"];
const NSFW_KEYS: &[&str] = &["nsfw", "isNsfw"];
const CLOUDFLARE_KEYS: &[&str] = &["hasCloudflare", "cloudflare"];
const DEAD_KEYS: &[&str] = &["isDead", "obsolete"];
const UPDATED_AT_KEYS: &[&str] = &["updatedAt", "updateTime", "versionDate", "lastUpdated"];

/// Turns extracted entries into unique-by-domain templates.
///
/// Entries are processed in input order and the first occurrence of a
/// domain wins. `now_ms` stands in for entries without a timestamp.
pub fn build_templates(entries: &[RawEntry], now_ms: i64) -> (Vec<NormalizedTemplate>, SkipTally) {
    let mut templates: Vec<NormalizedTemplate> = Vec::new();
    let mut seen_domains: HashSet<String> = HashSet::new();
    let mut skipped = SkipTally::default();

    for entry in entries {
        let Some(raw_base) = find_base_url(entry) else {
            skipped.record(SkipReason::MissingBaseUrl);
            debug!("missing baseUrl/domain; skipping");
            continue;
        };

        let Some(normalized) = normalize::normalize_url(raw_base) else {
            skipped.record(SkipReason::InvalidBaseUrl);
            debug!(raw_base, "invalid baseUrl; skipping");
            continue;
        };

        if !seen_domains.insert(normalized.domain.clone()) {
            skipped.record(SkipReason::DuplicateDomain);
            debug!(domain = %normalized.domain, "duplicate domain; skipping");
            continue;
        }

        templates.push(assemble(entry, normalized, now_ms));
    }

    (templates, skipped)
}

fn assemble(entry: &RawEntry, normalized: normalize::NormalizedUrl, now_ms: i64) -> NormalizedTemplate {
    let normalize::NormalizedUrl { base_url, domain } = normalized;

    let id = hash::template_id(&domain);
    let name = display_name(entry).unwrap_or_else(|| domain.clone());
    let lang = entry.first_truthy(LANG_KEYS).and_then(scalar_text);

    NormalizedTemplate {
        id,
        name,
        domain,
        base_url,
        engine_type: classify::infer_engine_type(entry),
        lang,
        is_nsfw: entry.flag(NSFW_KEYS),
        has_cloudflare: entry.flag(CLOUDFLARE_KEYS),
        is_dead: entry.flag(DEAD_KEYS),
        updated_at_epoch: parse_epoch(entry.first_truthy(UPDATED_AT_KEYS), now_ms),
    }
}

pub fn find_base_url(entry: &RawEntry) -> Option<&str> {
    entry
        .first_non_blank_str(BASE_URL_KEYS)
        .or_else(|| {
            entry.sources().find_map(|source| {
                SOURCE_BASE_URL_KEYS
                    .iter()
                    .filter_map(|k| source.get(*k).and_then(Value::as_str))
                    .find(|s| !s.trim().is_empty())
            })
        })
}

fn display_name(entry: &RawEntry) -> Option<String> {
    NAME_KEYS
        .iter()
        .filter_map(|k| entry.get(k))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Seconds are scaled to millis; non-numeric or missing values fall back.
pub fn parse_epoch(value: Option<&Value>, fallback_ms: i64) -> i64 {
    let epoch = match value {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => i,
            None => match n.as_f64() {
                Some(f) => f as i64,
                None => return fallback_ms,
            },
        },
        _ => return fallback_ms,
    };

    if epoch < EPOCH_MILLIS_THRESHOLD {
        epoch.saturating_mul(1000)
    } else {
        epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const NOW_MS: i64 = 1_700_000_000_000;

    fn entries(v: Value) -> Vec<RawEntry> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn deduplicates_by_domain_first_wins() {
        let input = entries(json!([
            { "name": "A", "baseUrl": "https://example.com" },
            { "name": "B", "website": "https://example.com" },
            { "name": "C", "baseUrl": "https://other.com" }
        ]));
        let (templates, skipped) = build_templates(&input, NOW_MS);

        assert_eq!(templates.len(), 2);
        assert_eq!(skipped.get(SkipReason::DuplicateDomain), 1);
        assert_eq!(templates[0].name, "A");
        assert_eq!(templates[1].name, "C");
    }

    #[test]
    fn www_and_case_variants_are_duplicates() {
        let input = entries(json!([
            { "baseUrl": "https://www.Example.com" },
            { "baseUrl": "example.com." }
        ]));
        let (templates, skipped) = build_templates(&input, NOW_MS);
        assert_eq!(templates.len(), 1);
        assert_eq!(skipped.get(SkipReason::DuplicateDomain), 1);
    }

    #[test]
    fn tallies_missing_and_invalid() {
        let input = entries(json!([
            { "name": "no url" },
            { "name": "blank", "baseUrl": "   " },
            { "name": "bad", "baseUrl": "https://exa mple.com" }
        ]));
        let (templates, skipped) = build_templates(&input, NOW_MS);

        assert!(templates.is_empty());
        assert_eq!(skipped.get(SkipReason::MissingBaseUrl), 2);
        assert_eq!(skipped.get(SkipReason::InvalidBaseUrl), 1);
        assert_eq!(skipped.total(), 3);
    }

    #[test]
    fn hosts_failing_idna_are_invalid() {
        let long_label = format!("https://{}.com", "x".repeat(64));
        let input = entries(json!([
            { "name": "empty label", "baseUrl": "https://a..b.com" },
            { "name": "long label", "baseUrl": long_label },
            { "name": "ok", "baseUrl": "https://ok.example" }
        ]));
        let (templates, skipped) = build_templates(&input, NOW_MS);

        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].domain, "ok.example");
        assert_eq!(skipped.get(SkipReason::InvalidBaseUrl), 2);
    }

    #[test]
    fn base_url_falls_back_to_sources() {
        let input = entries(json!([{
            "name": "Nested",
            "sources": [{ "name": "s1" }, { "website": "https://nested.org/m" }]
        }]));
        let (templates, _) = build_templates(&input, NOW_MS);
        assert_eq!(templates[0].domain, "nested.org");
        assert_eq!(templates[0].base_url, "https://nested.org/m");
    }

    #[test]
    fn ids_are_deterministic_hash_of_domain() {
        let input = entries(json!([
            { "baseUrl": "https://a.com" },
            { "baseUrl": "https://b.com/path" }
        ]));
        let (first, _) = build_templates(&input, NOW_MS);
        let (second, _) = build_templates(&input, NOW_MS + 5);

        let ids: Vec<&str> = first.iter().map(|t| t.id.as_str()).collect();
        let again: Vec<&str> = second.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, again);
        assert_eq!(first[1].id, hash::template_id("b.com"));
    }

    #[test]
    fn full_template_fields() {
        let input = entries(json!([{
            "name": "  ",
            "title": "Titled",
            "baseUrl": "https://www.site.net/",
            "pkg": "eu.kanade.tachiyomi.extension.all.madara",
            "lang": "en",
            "nsfw": 1,
            "cloudflare": true,
            "obsolete": "no",
            "updatedAt": 1_600_000_000
        }]));
        let (templates, _) = build_templates(&input, NOW_MS);

        assert_eq!(
            templates[0],
            NormalizedTemplate {
                id: hash::template_id("site.net"),
                name: "Titled".into(),
                domain: "site.net".into(),
                base_url: "https://www.site.net/".into(),
                engine_type: "MADARA".into(),
                lang: Some("en".into()),
                is_nsfw: true,
                has_cloudflare: true,
                is_dead: false,
                updated_at_epoch: 1_600_000_000_000,
            }
        );
    }

    #[test]
    fn name_falls_back_to_domain_and_lang_is_optional() {
        let input = entries(json!([{ "url": "plain.io" }]));
        let (templates, _) = build_templates(&input, NOW_MS);
        assert_eq!(templates[0].name, "plain.io");
        assert_eq!(templates[0].lang, None);
        assert_eq!(templates[0].updated_at_epoch, NOW_MS);
        assert_eq!(templates[0].engine_type, classify::GENERIC_ENGINE);
    }

    #[test]
    fn epoch_threshold_boundary() {
        assert_eq!(parse_epoch(Some(&json!(999_999_999_999i64)), 0), 999_999_999_999_000);
        assert_eq!(parse_epoch(Some(&json!(1_000_000_000_000i64)), 0), 1_000_000_000_000);
        assert_eq!(parse_epoch(Some(&json!(1_700_000_000.9)), 0), 1_700_000_000_000);
        assert_eq!(parse_epoch(Some(&json!("2024-01-01")), 42), 42);
        assert_eq!(parse_epoch(None, 42), 42);
    }

    #[test]
    fn first_truthy_timestamp_alias_is_used() {
        let input = entries(json!([{
            "baseUrl": "https://t.com",
            "updatedAt": 0,
            "lastUpdated": 1_650_000_000_000i64
        }]));
        let (templates, _) = build_templates(&input, NOW_MS);
        assert_eq!(templates[0].updated_at_epoch, 1_650_000_000_000);
    }
}
