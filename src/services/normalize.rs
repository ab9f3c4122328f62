use idna::uts46::{AsciiDenyList, DnsLength, Hyphens, Uts46};
use regex::Regex;
use std::sync::LazyLock;
use url::{Host, Url};

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://").expect("valid scheme regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    pub base_url: String,
    pub domain: String,
}

/// Canonicalizes a free-form URL into `(base_url, domain)`.
///
/// Returns `None` when there is no usable host or the host fails IDNA
/// encoding. The base URL keeps the host and path as written; query,
/// fragment and user-info never reach it.
pub fn normalize_url(value: &str) -> Option<NormalizedUrl> {
    let raw = value.trim();
    if raw.is_empty() {
        return None;
    }

    let with_scheme = if SCHEME_RE.is_match(raw) {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let parsed = Url::parse(&with_scheme).ok()?;
    let domain = match parsed.host()? {
        Host::Domain(d) => normalize_domain(d)?,
        Host::Ipv4(ip) => ip.to_string(),
        Host::Ipv6(ip) => format!("[{ip}]"),
    };

    let (authority, path) = split_authority(&with_scheme);
    let host = host_as_written(authority)?;

    let mut base_url = format!("{}://{}", parsed.scheme(), host);
    // `port()` is None for the scheme's default port.
    if let Some(port) = parsed.port() {
        base_url.push_str(&format!(":{port}"));
    }
    base_url.push_str(path);

    Some(NormalizedUrl { base_url, domain })
}

/// Lower-case, drop trailing dots and one leading `www.`, then IDNA-encode
/// with DNS length rules (no empty labels, labels up to 63 bytes).
pub fn normalize_domain(hostname: &str) -> Option<String> {
    let lowered = hostname.trim().to_lowercase();
    let cleaned = lowered.trim_end_matches('.');
    let cleaned = cleaned.strip_prefix("www.").unwrap_or(cleaned);
    if cleaned.is_empty() {
        return None;
    }

    Uts46::new()
        .to_ascii(
            cleaned.as_bytes(),
            AsciiDenyList::URL,
            Hyphens::Allow,
            DnsLength::Verify,
        )
        .ok()
        .map(|ascii| ascii.into_owned())
}

/// Splits `scheme://authority/path?query#fragment` into the raw authority
/// and the raw path (possibly empty).
fn split_authority(url: &str) -> (&str, &str) {
    let rest = url.split_once("://").map_or(url, |(_, r)| r);
    let authority_end = rest.find(['/', '\\', '?', '#']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    let path_end = tail.find(['?', '#']).unwrap_or(tail.len());
    (authority, &tail[..path_end])
}

/// Host text from a raw authority, without user-info or port.
fn host_as_written(authority: &str) -> Option<&str> {
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = if host_port.starts_with('[') {
        let close = host_port.find(']')?;
        &host_port[..=close]
    } else {
        host_port.split_once(':').map_or(host_port, |(h, _)| h)
    };
    Some(host).filter(|h| !h.is_empty())
}
