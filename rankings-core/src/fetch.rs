//! HTTP Fetcher (C1): GET/HEAD with bounded concurrency, per-request
//! timeout, and optional rate limiting.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{Quota, RateLimiter};
use reqwest::Client;
use scraper::Html;
use tokio::sync::Semaphore;
use tracing::warn;
use url::Url;

use crate::constants::USER_AGENT;
use crate::error::{IngestError, Result};

/// Result of a single GET: the parsed document, the final (possibly
/// redirected) URL, and the raw response bytes so callers can scrape and
/// persist without re-fetching.
pub struct GetResult {
    pub document: Html,
    pub final_url: Url,
    pub raw: Vec<u8>,
}

/// Result of a single HEAD probe, written into the output array at its
/// original request index so output ordering equals input ordering.
#[derive(Debug, Clone)]
pub struct HeadResult {
    pub url: String,
    pub status: Option<u16>,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(max_workers: usize) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(max_workers * 2)
            .build()
            .expect("client configuration should be valid");

        Self { client }
    }

    /// GETs `url`. Fails with [`IngestError::HttpStatus`] if the status
    /// isn't 200, [`IngestError::Network`] on transport errors.
    pub async fn get(&self, url: &str) -> Result<GetResult> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| IngestError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let final_url = response.url().clone();

        if status.as_u16() != 200 {
            return Err(IngestError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let raw = response
            .bytes()
            .await
            .map_err(|source| IngestError::Network {
                url: url.to_string(),
                source,
            })?
            .to_vec();

        let document = Html::parse_document(&String::from_utf8_lossy(&raw));

        Ok(GetResult {
            document,
            final_url,
            raw,
        })
    }

    /// HEADs every url in `urls` with at most `max_workers` requests in
    /// flight at once, optionally limited to `rps` requests/second (0 =
    /// unlimited), each bounded by `per_req_timeout`. Results land at
    /// their original index regardless of completion order.
    pub async fn head_all(
        &self,
        urls: &[String],
        max_workers: usize,
        rps: u32,
        per_req_timeout: Duration,
    ) -> Vec<HeadResult> {
        let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
        let limiter = (rps > 0).then(|| {
            Arc::new(RateLimiter::direct(Quota::per_second(
                NonZeroU32::new(rps).expect("rps > 0 checked above"),
            )))
        });

        let mut results = vec![
            HeadResult {
                url: String::new(),
                status: None,
                error: None,
            };
            urls.len()
        ];

        let mut set = tokio::task::JoinSet::new();
        for (idx, url) in urls.iter().cloned().enumerate() {
            let client = self.client.clone();
            let semaphore = semaphore.clone();
            let limiter = limiter.clone();

            set.spawn(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("semaphore is never closed");
                if let Some(limiter) = &limiter {
                    limiter.until_ready().await;
                }

                let result = tokio::time::timeout(
                    per_req_timeout,
                    client.head(&url).send(),
                )
                .await;

                let head_result = match result {
                    Ok(Ok(response)) => HeadResult {
                        url: url.clone(),
                        status: Some(response.status().as_u16()),
                        error: None,
                    },
                    Ok(Err(e)) => HeadResult {
                        url: url.clone(),
                        status: None,
                        error: Some(e.to_string()),
                    },
                    Err(_) => HeadResult {
                        url: url.clone(),
                        status: None,
                        error: Some("request timed out".to_string()),
                    },
                };

                (idx, head_result)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, result)) => results[idx] = result,
                Err(e) => warn!(error = %e, "head_all task panicked"),
            }
        }

        results
    }
}
