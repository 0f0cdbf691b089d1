//! Request interception
//!
//! A [`RequestGate`] sits in front of every outgoing request. Requests whose
//! destination matches its filter are rejected with an error before reaching
//! the network; everything else is forwarded untouched.
//!
//! The gate itself knows nothing about transports. [`GatedHttp`] plugs it in
//! front of a `reqwest::Client`.

use crate::error::InterceptError;
use crate::host::NetworkHook;
use pmobilibili::SEEK_PREVIEW_PATTERN;
use reqwest::{Client, Request, Response};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Predicate deciding which destinations are blocked
pub trait RequestFilter: Send + Sync {
    fn blocks(&self, destination: &str) -> bool;

    fn describe(&self) -> String;
}

/// Blocks seek-preview thumbnail requests
///
/// Matching is a plain substring test on the destination URL.
#[derive(Debug, Clone)]
pub struct SeekPreviewFilter {
    pattern: String,
}

impl SeekPreviewFilter {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Default for SeekPreviewFilter {
    fn default() -> Self {
        Self::new(SEEK_PREVIEW_PATTERN)
    }
}

impl RequestFilter for SeekPreviewFilter {
    fn blocks(&self, destination: &str) -> bool {
        !self.pattern.is_empty() && destination.contains(&self.pattern)
    }

    fn describe(&self) -> String {
        format!("seek-preview ({})", self.pattern)
    }
}

/// Decision taken for one outgoing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Forward,
    Reject,
}

/// Gate applying a filter to outgoing requests
pub struct RequestGate {
    filter: Box<dyn RequestFilter>,
    rejected: AtomicU64,
}

impl RequestGate {
    pub fn new(filter: impl RequestFilter + 'static) -> Self {
        Self {
            filter: Box::new(filter),
            rejected: AtomicU64::new(0),
        }
    }

    pub fn check(&self, destination: &str) -> Verdict {
        if self.filter.blocks(destination) {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            debug!(destination = %destination, "Rejecting request");
            Verdict::Reject
        } else {
            Verdict::Forward
        }
    }

    /// Number of requests rejected so far
    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for RequestGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestGate")
            .field("filter", &self.filter.describe())
            .field("rejected", &self.rejected_count())
            .finish()
    }
}

/// `reqwest` transport with an installable gate
///
/// Until a gate is installed every request goes straight through.
#[derive(Debug, Default)]
pub struct GatedHttp {
    client: Client,
    gate: RwLock<Option<Arc<RequestGate>>>,
}

impl GatedHttp {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            gate: RwLock::new(None),
        }
    }

    pub fn is_gated(&self) -> bool {
        self.current_gate().is_some()
    }

    fn current_gate(&self) -> Option<Arc<RequestGate>> {
        self.gate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Send a request through the gate
    ///
    /// Rejected requests fail with [`InterceptError::Rejected`]; forwarded
    /// ones are sent exactly as built.
    pub async fn execute(&self, request: Request) -> Result<Response, InterceptError> {
        if let Some(gate) = self.current_gate() {
            if gate.check(request.url().as_str()) == Verdict::Reject {
                return Err(InterceptError::Rejected {
                    url: request.url().to_string(),
                });
            }
        }
        Ok(self.client.execute(request).await?)
    }

    /// Convenience GET through the gate
    pub async fn get(&self, url: &str) -> Result<Response, InterceptError> {
        let request = self.client.get(url).build()?;
        self.execute(request).await
    }
}

impl NetworkHook for GatedHttp {
    fn install(&self, gate: Arc<RequestGate>) -> bool {
        let mut slot = self.gate.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            warn!("A request gate is already installed, ignoring {:?}", gate);
            return false;
        }
        *slot = Some(gate);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEEK_PREVIEW_URL: &str =
        "https://api.bilibili.com/x/player/videoshot?bvid=BV1xx411c7mD&cid=42&index=1";
    const METADATA_URL: &str = "https://api.bilibili.com/x/web-interface/view?bvid=BV1xx411c7mD";
    const THIRD_PARTY_URL: &str = "https://cdn.example.org/lib/player.js";

    #[test]
    fn test_seek_preview_filter() {
        let filter = SeekPreviewFilter::default();
        assert!(filter.blocks(SEEK_PREVIEW_URL));
        assert!(filter.blocks("//api.bilibili.com/x/player/videoshot?aid=1"));
        assert!(!filter.blocks(METADATA_URL));
        assert!(!filter.blocks(THIRD_PARTY_URL));
        assert!(!filter.blocks(
            "https://api.bilibili.com/x/player/wbi/playurl?bvid=BV1xx&cid=42&fnval=16"
        ));
    }

    #[test]
    fn test_empty_pattern_blocks_nothing() {
        let filter = SeekPreviewFilter::new("");
        assert!(!filter.blocks(SEEK_PREVIEW_URL));
    }

    #[test]
    fn test_gate_verdicts() {
        let gate = RequestGate::new(SeekPreviewFilter::default());

        assert_eq!(gate.check(SEEK_PREVIEW_URL), Verdict::Reject);
        assert_eq!(gate.check(METADATA_URL), Verdict::Forward);
        assert_eq!(gate.check(THIRD_PARTY_URL), Verdict::Forward);
        assert_eq!(gate.check(SEEK_PREVIEW_URL), Verdict::Reject);
        assert_eq!(gate.rejected_count(), 2);
    }

    #[tokio::test]
    async fn test_rejected_request_never_leaves() {
        let http = GatedHttp::default();
        assert!(http.install(Arc::new(RequestGate::new(SeekPreviewFilter::default()))));

        let err = http.get(SEEK_PREVIEW_URL).await.unwrap_err();
        assert!(err.is_rejected());
    }

    #[test]
    fn test_second_install_is_ignored() {
        let http = GatedHttp::default();
        let first = Arc::new(RequestGate::new(SeekPreviewFilter::default()));
        let second = Arc::new(RequestGate::new(SeekPreviewFilter::new("other")));

        assert!(!http.is_gated());
        assert!(http.install(first.clone()));
        assert!(!http.install(second));

        assert!(Arc::ptr_eq(&http.current_gate().unwrap(), &first));
    }
}
