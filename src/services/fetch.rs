use rand::{thread_rng, Rng};
use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::StatusCode;
use tracing::{debug, warn};

use std::{thread, time::Duration};

use crate::config::GeneratorConfig;
use crate::error::{GeneratorError, Result};
use crate::services::store::EtagCache;

const BASE_DELAY_MS: u64 = 800;

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub url: String,
    pub status: u16,
    pub etag: Option<String>,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Fetched(FetchResult),
    NotModified { url: String },
}

fn backoff(attempt: usize) -> Duration {
    let jitter: u64 = thread_rng().gen_range(0..200);
    let ms = BASE_DELAY_MS * (2_u64.pow(attempt as u32)) + jitter;
    Duration::from_millis(ms)
}

/// Tries each mirror in order; the first success or 304 wins.
pub fn fetch_index(cfg: &GeneratorConfig, etags: &EtagCache) -> Result<FetchOutcome> {
    if cfg.index_urls.is_empty() {
        return Err(GeneratorError::Fetch("no index URLs configured".into()));
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .user_agent(cfg.user_agent.as_str())
        .build()
        .map_err(|e| GeneratorError::Fetch(e.to_string()))?;

    let mut last_err: Option<String> = None;

    for url in &cfg.index_urls {
        match fetch_one(&client, url, etags.get(url), cfg.max_retries) {
            Ok(outcome) => return Ok(outcome),
            Err(e) => {
                warn!(url = %url, "mirror failed: {e}");
                last_err = Some(format!("{url}: {e}"));
            }
        }
    }

    Err(GeneratorError::Fetch(
        last_err.unwrap_or_else(|| "all mirrors failed".into()),
    ))
}

fn fetch_one(
    client: &Client,
    url: &str,
    etag: Option<&str>,
    max_retries: usize,
) -> std::result::Result<FetchOutcome, String> {
    let attempts = max_retries.max(1);
    let mut last_err = String::from("no attempt made");

    for attempt in 0..attempts {
        let mut req = client.get(url);
        if let Some(tag) = etag {
            req = req.header(IF_NONE_MATCH, tag);
        }
        debug!(url, attempt, "fetching index");

        match req.send() {
            Ok(resp) => {
                let status = resp.status();

                if status == StatusCode::NOT_MODIFIED {
                    return Ok(FetchOutcome::NotModified {
                        url: url.to_string(),
                    });
                }

                if !status.is_success() {
                    last_err = format!("HTTP {}", status.as_u16());
                    if should_retry_http(status) && attempt + 1 < attempts {
                        thread::sleep(backoff(attempt));
                        continue;
                    }
                    break;
                }

                let response_etag = resp
                    .headers()
                    .get(ETAG)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);

                match resp.bytes() {
                    Ok(body) => {
                        return Ok(FetchOutcome::Fetched(FetchResult {
                            url: url.to_string(),
                            status: status.as_u16(),
                            etag: response_etag,
                            payload: body.to_vec(),
                        }))
                    }
                    Err(err) => last_err = err.to_string(),
                }
            }
            Err(err) => last_err = err.to_string(),
        }

        if attempt + 1 < attempts {
            thread::sleep(backoff(attempt));
        }
    }

    Err(last_err)
}

fn should_retry_http(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_statuses_are_retried() {
        assert!(should_retry_http(StatusCode::TOO_MANY_REQUESTS));
        assert!(should_retry_http(StatusCode::BAD_GATEWAY));
        assert!(should_retry_http(StatusCode::REQUEST_TIMEOUT));
        assert!(!should_retry_http(StatusCode::NOT_FOUND));
        assert!(!should_retry_http(StatusCode::FORBIDDEN));
    }

    #[test]
    fn backoff_grows_with_bounded_jitter() {
        let first = backoff(0).as_millis() as u64;
        let third = backoff(2).as_millis() as u64;
        assert!((BASE_DELAY_MS..BASE_DELAY_MS + 200).contains(&first));
        assert!((BASE_DELAY_MS * 4..BASE_DELAY_MS * 4 + 200).contains(&third));
    }

    #[test]
    fn no_mirrors_is_a_fetch_error() {
        let cfg = GeneratorConfig {
            index_urls: Vec::new(),
            ..GeneratorConfig::default()
        };
        let err = fetch_index(&cfg, &EtagCache::default()).unwrap_err();
        assert!(matches!(err, GeneratorError::Fetch(_)));
    }
}
