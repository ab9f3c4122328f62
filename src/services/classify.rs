use serde_json::Value;

use crate::model::entry::RawEntry;

pub const GENERIC_ENGINE: &str = "GENERIC";

const EXPLICIT_KEYS: &[&str] = &["engineType", "engine", "sourceType", "type"];

const PACKAGE_KEYS: &[&str] = &["pkg", "package", "packageName"];

/// Multi-source package segment -> engine label. Checked in order.
const MULTISRC_ENGINES: &[(&str, &str)] = &[
    ("madara", "MADARA"),
    ("mangastream", "MANGASTREAM"),
    ("mangathemesia", "MANGATHEMESIA"),
    ("wpcomics", "WPCOMICS"),
    ("foolslide", "FOOLSLIDE"),
    ("heancms", "HEANCMS"),
    ("fmreader", "FMREADER"),
    ("mmrcms", "MMRCMS"),
    ("genkan", "GENKAN"),
    ("mangareader", "MANGAREADER"),
];

const MADARA_ENGINE: &str = "MADARA";

const MADARA_KEYWORDS: &[&str] = &[
    "madara",
    "azora",
    "manga-spark",
    "mangaspark",
    "mangapro",
    "manga-pro",
    "mangasoul",
    "manga-soul",
    "areamanga",
    "area-manga",
    "umimanga",
    "hadess",
    "lekmanga",
    "link-manga",
    "mangalionz",
    "manga-starz",
    "mangaswat",
    "mangatales",
    "mangatuk",
    "manhuarmtl",
    "seraphicdeviltry",
    "ravensscans",
    "lavatoons",
    "thunderscans",
    "falconmanga",
    "manga-swat",
    "akuma",
    "gmanga",
    "manga-planet",
];

/// Infers the engine label for an entry. Tiers are tried in order and the
/// first match wins even when a later tier would also match.
pub fn infer_engine_type(entry: &RawEntry) -> String {
    if let Some(explicit) = entry.first_non_blank_str(EXPLICIT_KEYS) {
        return explicit.trim().to_uppercase();
    }

    let pkg = entry
        .first_non_blank_str(PACKAGE_KEYS)
        .unwrap_or("")
        .to_lowercase();

    if let Some(engine) = match_package(&pkg) {
        return engine.to_string();
    }

    let blob = keyword_blob(entry, &pkg);
    if MADARA_KEYWORDS.iter().any(|kw| blob.contains(kw)) {
        return MADARA_ENGINE.to_string();
    }

    GENERIC_ENGINE.to_string()
}

/// A key matches a whole dotted segment that is either an inner segment
/// or the one right after `all` (e.g. `...extension.all.madara`).
fn match_package(pkg: &str) -> Option<&'static str> {
    if pkg.is_empty() {
        return None;
    }
    let segments: Vec<&str> = pkg.split('.').collect();
    let last = segments.len().saturating_sub(1);

    MULTISRC_ENGINES.iter().find_map(|(key, engine)| {
        let hit = segments.iter().enumerate().any(|(i, seg)| {
            *seg == *key && i > 0 && (i < last || segments[i - 1] == "all")
        });
        hit.then_some(*engine)
    })
}

fn keyword_blob(entry: &RawEntry, pkg: &str) -> String {
    let name = entry.get("name").and_then(Value::as_str).unwrap_or("");
    let mut blob = format!("{} {}", pkg, name.to_lowercase());

    for source in entry.sources() {
        for key in ["name", "baseUrl"] {
            blob.push(' ');
            if let Some(s) = source.get(key).and_then(Value::as_str) {
                blob.push_str(&s.to_lowercase());
            }
        }
    }

    blob
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify(v: Value) -> String {
        infer_engine_type(&serde_json::from_value(v).unwrap())
    }

    #[test]
    fn explicit_metadata_wins_verbatim_uppercased() {
        assert_eq!(classify(json!({ "engineType": " custom-cms " })), "CUSTOM-CMS");
        assert_eq!(
            classify(json!({ "type": "heancms", "pkg": "x.all.madara" })),
            "HEANCMS"
        );
        assert_eq!(
            classify(json!({ "engine": "  ", "pkg": "eu.kanade.tachiyomi.extension.all.madara" })),
            "MADARA"
        );
    }

    #[test]
    fn package_segment_match() {
        assert_eq!(
            classify(json!({ "pkg": "eu.kanade.tachiyomi.extension.en.mangathemesia.site" })),
            "MANGATHEMESIA"
        );
        assert_eq!(
            classify(json!({ "pkg": "eu.kanade.tachiyomi.extension.all.foolslide" })),
            "FOOLSLIDE"
        );
    }

    #[test]
    fn package_match_is_not_substring_in_word() {
        assert_eq!(
            classify(json!({ "pkg": "eu.kanade.tachiyomi.extension.en.genkanscans" })),
            "GENERIC"
        );
        // trailing segment without a preceding `all` is the site, not the engine
        assert_eq!(classify(json!({ "pkg": "eu.kanade.tachiyomi.extension.en.genkan" })), "GENERIC");
    }

    #[test]
    fn keyword_heuristic_looks_into_sources() {
        assert_eq!(
            classify(json!({
                "pkg": "eu.kanade.tachiyomi.extension.ar.somesite",
                "name": "Some Site",
                "sources": [{ "name": "Mirror", "baseUrl": "https://thunderscans.com" }]
            })),
            "MADARA"
        );
        assert_eq!(classify(json!({ "name": "Azora Moon" })), "MADARA");
    }

    #[test]
    fn package_tier_precedes_keywords() {
        assert_eq!(
            classify(json!({ "pkg": "eu.kanade.tachiyomi.extension.all.wpcomics", "name": "Madara Fans" })),
            "WPCOMICS"
        );
    }

    #[test]
    fn falls_back_to_generic() {
        assert_eq!(classify(json!({})), GENERIC_ENGINE);
        assert_eq!(classify(json!({ "name": "Plain Reader", "pkg": 42 })), GENERIC_ENGINE);
    }
}
