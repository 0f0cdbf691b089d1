//! Memoized audio source resolution
//!
//! The pipeline (locator → stream id → audio URL) is spawned once, as soon
//! as the page is loaded, and its outcome is shared: every reader awaits the
//! same future and nobody triggers the network calls again.

use crate::error::ResolutionError;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use pmobilibili::{BilibiliClient, MediaLocator};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Direct URL of an audio-only stream
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioSource(String);

impl AudioSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Something able to run the whole resolution pipeline for a locator
#[async_trait]
pub trait AudioResolver: Send + Sync {
    async fn resolve(&self, locator: &MediaLocator) -> pmobilibili::Result<String>;
}

#[async_trait]
impl AudioResolver for BilibiliClient {
    async fn resolve(&self, locator: &MediaLocator) -> pmobilibili::Result<String> {
        self.resolve_locator(locator).await
    }
}

type SharedResolution = Shared<BoxFuture<'static, Result<AudioSource, ResolutionError>>>;

/// Shared, read-only handle on one resolution
///
/// Cloning the handle does not restart anything. The handle remembers the
/// locator it was started for so that a late result can be recognised as
/// stale after a navigation.
#[derive(Clone)]
pub struct AudioSourceHandle {
    locator: MediaLocator,
    outcome: SharedResolution,
}

impl AudioSourceHandle {
    /// Start resolving `locator` in the background
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(resolver: Arc<dyn AudioResolver>, locator: MediaLocator) -> Self {
        let task_locator = locator.clone();
        let task = tokio::spawn(async move {
            match resolver.resolve(&task_locator).await {
                Ok(url) => {
                    info!(locator = %task_locator, "Resolved audio source");
                    Ok(AudioSource::new(url))
                }
                Err(e) => {
                    warn!(locator = %task_locator, "Audio source resolution failed: {}", e);
                    Err(ResolutionError::from(e))
                }
            }
        });

        let outcome = async move {
            task.await
                .unwrap_or_else(|e| Err(ResolutionError::Aborted(e.to_string())))
        }
        .boxed()
        .shared();

        Self { locator, outcome }
    }

    /// Handle on an already known outcome
    pub fn ready(locator: MediaLocator, outcome: Result<AudioSource, ResolutionError>) -> Self {
        Self {
            locator,
            outcome: futures::future::ready(outcome).boxed().shared(),
        }
    }

    /// Locator this resolution was started for
    pub fn locator(&self) -> &MediaLocator {
        &self.locator
    }

    /// Wait for the outcome
    pub async fn audio_source(&self) -> Result<AudioSource, ResolutionError> {
        self.outcome.clone().await
    }

    /// Outcome if already available, without waiting
    pub fn peek(&self) -> Option<Result<AudioSource, ResolutionError>> {
        self.outcome.peek().cloned()
    }
}

impl fmt::Debug for AudioSourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioSourceHandle")
            .field("locator", &self.locator)
            .field("outcome", &self.peek())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedResolver;

    #[tokio::test]
    async fn test_resolution_runs_once_for_many_readers() {
        let resolver = Arc::new(ScriptedResolver::new().with_audio("BV1ab", "https://x/a.m4a"));
        let handle = AudioSourceHandle::spawn(resolver.clone(), MediaLocator::new("BV1ab", None));

        let copy = handle.clone();
        let (first, second) = tokio::join!(handle.audio_source(), copy.audio_source());
        let third = handle.audio_source().await;

        assert_eq!(first, Ok(AudioSource::new("https://x/a.m4a")));
        assert_eq!(first, second);
        assert_eq!(first, third);
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn test_resolution_starts_without_readers() {
        let resolver = Arc::new(ScriptedResolver::new().with_audio("BV1ab", "https://x/a.m4a"));
        let _handle = AudioSourceHandle::spawn(resolver.clone(), MediaLocator::new("BV1ab", None));

        tokio::task::yield_now().await;
        for _ in 0..10 {
            if resolver.calls() == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_memoized() {
        let resolver = Arc::new(ScriptedResolver::new().with_api_failure("BV1gone", -404));
        let handle =
            AudioSourceHandle::spawn(resolver.clone(), MediaLocator::new("BV1gone", None));

        assert!(matches!(
            handle.audio_source().await,
            Err(ResolutionError::Api(_))
        ));
        assert!(handle.audio_source().await.is_err());
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn test_ready_handle_peeks() {
        let handle = AudioSourceHandle::ready(
            MediaLocator::new("BV1ab", None),
            Ok(AudioSource::new("https://x/a.m4a")),
        );
        assert!(handle.peek().is_none());
        handle.audio_source().await.unwrap();
        assert_eq!(handle.peek(), Some(Ok(AudioSource::new("https://x/a.m4a"))));
    }
}
