//! AI Locator Adapter (spec.md §4.4, component C4).
//!
//! Invoked only after the Selector Strategy Generator's candidate list has
//! been exhausted, and only when enabled (§4.5 step 5). Every failure mode
//! collapses to `None` at the trait boundary — missing credentials, a
//! transport error, a timeout, or an unparseable response are all "no
//! suggestion", never a propagated `Err`, so the Resolution Engine never has
//! to special-case AI failures (§4.4's error taxonomy).

mod cache;
mod ratelimit;
mod snapshot;

pub use snapshot::prune_snapshot;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cache::{CacheKey, TtlCache};
use parking_lot::Mutex;
use ratelimit::TokenBucket;
use runner_core_types::ActionKind;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Why a suggestion call produced `None`, surfaced only for logging/metrics
/// — never returned to callers as an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SuggestMiss {
    Disabled,
    RateLimited,
    Timeout,
    Transport,
    InvalidResponse,
    NoCandidate,
}

#[async_trait]
pub trait AiLocator: Send + Sync {
    /// `page_snapshot` is expected to already be pruned to the budget the
    /// adapter can afford (see [`prune_snapshot`]); this trait does not
    /// prune on the caller's behalf so that callers can share one pruned
    /// snapshot across several suggestion calls for the same page.
    async fn suggest(
        &self,
        page_snapshot: &str,
        page_fingerprint: &str,
        target: &str,
        action: ActionKind,
    ) -> Option<String>;
}

/// Always returns `None`. Used when no credentials are configured — AI
/// fallback is then a true no-op rather than a code path callers must
/// special-case (§4.4: "missing credentials -> disabled (return None)").
#[derive(Default)]
pub struct DisabledAiLocator;

#[async_trait]
impl AiLocator for DisabledAiLocator {
    async fn suggest(
        &self,
        _page_snapshot: &str,
        _page_fingerprint: &str,
        _target: &str,
        _action: ActionKind,
    ) -> Option<String> {
        None
    }
}

#[derive(Clone, Debug)]
pub struct HttpAiLocatorConfig {
    pub endpoint: String,
    pub api_key: String,
    pub requests_per_minute: u32,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpAiLocatorConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            requests_per_minute: 30,
            cache_ttl: Duration::from_secs(300),
            request_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Serialize)]
struct SuggestRequestBody<'a> {
    page_snapshot: &'a str,
    target: &'a str,
    action: &'a str,
}

#[derive(Deserialize)]
struct SuggestResponseBody {
    selector: Option<String>,
}

/// A real transport-backed adapter. Disabled (behaves like
/// [`DisabledAiLocator`]) whenever `api_key` is empty, so constructing one
/// from unset configuration is always safe.
pub struct HttpAiLocator {
    client: reqwest::Client,
    config: HttpAiLocatorConfig,
    bucket: Mutex<TokenBucket>,
    cache: Mutex<TtlCache>,
}

impl HttpAiLocator {
    pub fn new(config: HttpAiLocatorConfig) -> Arc<Self> {
        let bucket = TokenBucket::new(config.requests_per_minute);
        let cache = TtlCache::new(config.cache_ttl);
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_default();
        Arc::new(Self {
            client,
            config,
            bucket: Mutex::new(bucket),
            cache: Mutex::new(cache),
        })
    }

    fn disabled(&self) -> bool {
        self.config.api_key.trim().is_empty() || self.config.endpoint.trim().is_empty()
    }
}

#[async_trait]
impl AiLocator for HttpAiLocator {
    #[instrument(skip_all, fields(target = %target, action = ?action))]
    async fn suggest(
        &self,
        page_snapshot: &str,
        page_fingerprint: &str,
        target: &str,
        action: ActionKind,
    ) -> Option<String> {
        if self.disabled() {
            debug!(miss = ?SuggestMiss::Disabled, "ai locator disabled, no credentials configured");
            return None;
        }

        let key = CacheKey {
            page_fingerprint: page_fingerprint.to_string(),
            target: target.to_string(),
            action,
        };
        if let Some(cached) = self.cache.lock().get(&key) {
            return cached;
        }

        if !self.bucket.lock().try_acquire() {
            debug!(miss = ?SuggestMiss::RateLimited, "ai locator rate limit exhausted");
            return None;
        }

        let result = self.call_transport(page_snapshot, target, action).await;
        self.cache.lock().put(key, result.clone());
        result
    }
}

impl HttpAiLocator {
    async fn call_transport(
        &self,
        page_snapshot: &str,
        target: &str,
        action: ActionKind,
    ) -> Option<String> {
        let body = SuggestRequestBody {
            page_snapshot,
            target,
            action: action.wire_name(),
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(err) if err.is_timeout() => {
                warn!(miss = ?SuggestMiss::Timeout, "ai locator request timed out");
                return None;
            }
            Err(err) => {
                warn!(miss = ?SuggestMiss::Transport, error = %err, "ai locator transport error");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                miss = ?SuggestMiss::Transport,
                status = %response.status(),
                "ai locator returned non-success status"
            );
            return None;
        }

        match response.json::<SuggestResponseBody>().await {
            Ok(body) => match body.selector {
                Some(selector) if !selector.trim().is_empty() => Some(selector),
                _ => {
                    debug!(miss = ?SuggestMiss::NoCandidate, "ai locator had no suggestion");
                    None
                }
            },
            Err(err) => {
                warn!(miss = ?SuggestMiss::InvalidResponse, error = %err, "ai locator response was not parseable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_locator_always_returns_none() {
        let locator = DisabledAiLocator;
        assert_eq!(
            locator
                .suggest("<html/>", "fp", "Submit", ActionKind::Click)
                .await,
            None
        );
    }

    #[tokio::test]
    async fn http_locator_with_no_credentials_behaves_as_disabled() {
        let locator = HttpAiLocator::new(HttpAiLocatorConfig::default());
        assert_eq!(
            locator
                .suggest("<html/>", "fp", "Submit", ActionKind::Click)
                .await,
            None
        );
    }
}
