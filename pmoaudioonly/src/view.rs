//! Visual side of audio-only mode
//!
//! The media element keeps playing but shows the video cover instead of
//! frames. Its source is swapped for the audio-only stream once that is
//! resolved.

use crate::error::{ModeError, ResolutionError, Result};
use crate::host::{MetaEntry, Page};
use crate::source::{AudioSource, AudioSourceHandle};
use pmobilibili::MediaLocator;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// `itemprop` of the meta entry carrying the cover image
pub const PAGE_IMAGE_PROPERTY: &str = "image";

/// Default opacity of the cover shown in place of the video
pub const DEFAULT_BACKDROP_OPACITY: f32 = 0.3;

/// Cover image painted behind the media element
#[derive(Debug, Clone, PartialEq)]
pub struct MediaBackdrop {
    pub image_url: String,
    pub opacity: f32,
}

impl MediaBackdrop {
    /// Inline style: centered, covering, semi-transparent
    pub fn to_css(&self) -> String {
        format!(
            "background: url(\"{}\") center center / cover no-repeat transparent; opacity: {};",
            self.image_url, self.opacity
        )
    }
}

/// What happened to the source binding of one view application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceBinding {
    /// The media element now plays this source
    Bound(AudioSource),
    /// The page moved to another media before the resolution finished
    Stale {
        resolved_for: MediaLocator,
        current: Option<MediaLocator>,
    },
    /// Resolution failed; the element stays silent
    Failed(ResolutionError),
}

/// First `image` meta entry of the page, if any
pub fn cover_image_url(entries: &[MetaEntry]) -> Option<String> {
    entries
        .iter()
        .find(|entry| entry.itemprop.as_deref() == Some(PAGE_IMAGE_PROPERTY))
        .map(|entry| entry.content.clone().unwrap_or_default())
}

/// Applies the audio-only presentation to the page
#[derive(Debug, Clone)]
pub struct ViewMutator {
    opacity: f32,
}

impl Default for ViewMutator {
    fn default() -> Self {
        Self::new(DEFAULT_BACKDROP_OPACITY)
    }
}

impl ViewMutator {
    pub fn new(opacity: f32) -> Self {
        Self { opacity }
    }

    /// Strip the preview, paint the cover, and bind the source once resolved
    ///
    /// The visual part happens before returning. The binding runs in the
    /// background; the returned handle reports how it ended.
    pub fn apply(
        &self,
        page: &Arc<dyn Page>,
        source: &AudioSourceHandle,
    ) -> Result<JoinHandle<SourceBinding>> {
        if page.remove_preview_image() {
            debug!("Removed seek-preview image");
        }

        if !page.has_media_element() {
            return Err(ModeError::MediaElementMissing);
        }

        let image_url = cover_image_url(&page.meta_entries()).unwrap_or_else(|| {
            debug!("No cover image in page metadata");
            String::new()
        });
        let backdrop = MediaBackdrop {
            image_url,
            opacity: self.opacity,
        };
        page.set_media_style(&backdrop.to_css());

        let page = Arc::clone(page);
        let source = source.clone();
        Ok(tokio::spawn(async move { bind_source(page, source).await }))
    }
}

async fn bind_source(page: Arc<dyn Page>, source: AudioSourceHandle) -> SourceBinding {
    let audio = match source.audio_source().await {
        Ok(audio) => audio,
        Err(e) => {
            warn!(locator = %source.locator(), "No audio source to bind: {}", e);
            return SourceBinding::Failed(e);
        }
    };

    let current = MediaLocator::from_url(&page.location()).ok();
    if current.as_ref() != Some(source.locator()) {
        debug!(
            resolved_for = %source.locator(),
            current = ?current,
            "Discarding stale audio source"
        );
        return SourceBinding::Stale {
            resolved_for: source.locator().clone(),
            current,
        };
    }

    page.set_media_source(audio.as_str());
    info!(locator = %source.locator(), "Bound audio-only source");
    SourceBinding::Bound(audio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePage;

    const PAGE_URL: &str = "https://www.bilibili.com/video/BV1ab/";

    fn ready_source(url: &str) -> AudioSourceHandle {
        AudioSourceHandle::ready(
            MediaLocator::new("BV1ab", None),
            Ok(AudioSource::new(url)),
        )
    }

    #[test]
    fn test_backdrop_css() {
        let backdrop = MediaBackdrop {
            image_url: "https://i0.hdslb.com/cover.jpg".into(),
            opacity: 0.3,
        };
        assert_eq!(
            backdrop.to_css(),
            "background: url(\"https://i0.hdslb.com/cover.jpg\") center center / cover no-repeat transparent; opacity: 0.3;"
        );
    }

    #[test]
    fn test_cover_image_takes_first_image_entry() {
        let entries = vec![
            MetaEntry::new("name", "title"),
            MetaEntry::new("image", "https://x/first.jpg"),
            MetaEntry::new("image", "https://x/second.jpg"),
        ];
        assert_eq!(
            cover_image_url(&entries).as_deref(),
            Some("https://x/first.jpg")
        );
        assert_eq!(cover_image_url(&[MetaEntry::new("name", "t")]), None);
    }

    #[tokio::test]
    async fn test_apply_paints_and_binds() {
        let fake = Arc::new(
            FakePage::new(PAGE_URL)
                .with_preview_image("https://x/shot.jpg")
                .with_meta(MetaEntry::new("image", "https://x/cover.jpg")),
        );
        let page: Arc<dyn Page> = fake.clone();

        let binding = ViewMutator::default()
            .apply(&page, &ready_source("https://x/a.m4a"))
            .unwrap()
            .await
            .unwrap();

        assert_eq!(binding, SourceBinding::Bound(AudioSource::new("https://x/a.m4a")));
        assert!(!fake.has_preview_image());
        assert!(fake
            .media_style()
            .unwrap()
            .contains("url(\"https://x/cover.jpg\")"));
        assert_eq!(fake.media_source().as_deref(), Some("https://x/a.m4a"));
    }

    #[tokio::test]
    async fn test_apply_without_cover_fails_soft() {
        let fake = Arc::new(FakePage::new(PAGE_URL));
        let page: Arc<dyn Page> = fake.clone();

        ViewMutator::default()
            .apply(&page, &ready_source("https://x/a.m4a"))
            .unwrap()
            .await
            .unwrap();

        assert!(fake.media_style().unwrap().starts_with("background: url(\"\")"));
    }

    #[tokio::test]
    async fn test_failed_resolution_binds_nothing() {
        let fake = Arc::new(FakePage::new(PAGE_URL));
        let page: Arc<dyn Page> = fake.clone();
        let source = AudioSourceHandle::ready(
            MediaLocator::new("BV1ab", None),
            Err(ResolutionError::Api("API error -404".into())),
        );

        let binding = ViewMutator::default()
            .apply(&page, &source)
            .unwrap()
            .await
            .unwrap();

        assert!(matches!(binding, SourceBinding::Failed(_)));
        assert!(fake.media_style().is_some());
        assert_eq!(fake.media_source(), None);
    }

    #[tokio::test]
    async fn test_stale_resolution_is_discarded() {
        let fake = Arc::new(FakePage::new("https://www.bilibili.com/video/BV1other/"));
        let page: Arc<dyn Page> = fake.clone();

        let binding = ViewMutator::default()
            .apply(&page, &ready_source("https://x/a.m4a"))
            .unwrap()
            .await
            .unwrap();

        assert!(matches!(binding, SourceBinding::Stale { .. }));
        assert_eq!(fake.media_source(), None);
    }

    #[tokio::test]
    async fn test_missing_media_element() {
        let fake = Arc::new(FakePage::new(PAGE_URL).without_media_element());
        let page: Arc<dyn Page> = fake.clone();

        let result = ViewMutator::default().apply(&page, &ready_source("https://x/a.m4a"));

        assert!(matches!(result, Err(ModeError::MediaElementMissing)));
        assert_eq!(fake.media_style(), None);
    }
}
