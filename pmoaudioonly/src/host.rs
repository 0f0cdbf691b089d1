//! Collaborators provided by the host runtime
//!
//! The session never touches the page, the script manager's storage or the
//! network layer directly. The host hands in implementations of these
//! traits; [`crate::testing`] has in-memory ones.

use crate::error::Result;
use crate::interceptor::RequestGate;
use std::sync::Arc;

/// Key of the flag that survives a reload and triggers automatic activation
pub const PENDING_RELOAD_KEY: &str = "autorun";

/// A `<meta>` entry of the page head
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaEntry {
    /// Value of the `itemprop` attribute
    pub itemprop: Option<String>,
    /// Value of the `content` attribute
    pub content: Option<String>,
}

impl MetaEntry {
    pub fn new(itemprop: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            itemprop: Some(itemprop.into()),
            content: Some(content.into()),
        }
    }
}

/// Overlay shown in the player region while audio-only mode is on
///
/// Its presence in the page is the "already active" marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioModeBanner {
    pub title: String,
    pub hint: String,
}

/// The video page document
///
/// All methods act on the live page; locating elements is up to the host
/// (player region, seek-preview image, media element).
pub trait Page: Send + Sync {
    /// Current location (absolute URL)
    fn location(&self) -> String;

    /// Whether the audio-only banner is already in the player region
    fn has_audio_marker(&self) -> bool;

    fn insert_audio_marker(&self, banner: &AudioModeBanner);

    /// Source of the seek-preview image, `None` when the element is absent
    fn preview_image_source(&self) -> Option<String>;

    /// Remove the seek-preview image; returns whether one was removed
    fn remove_preview_image(&self) -> bool;

    /// `<meta>` entries of the document, in document order
    fn meta_entries(&self) -> Vec<MetaEntry>;

    fn has_media_element(&self) -> bool;

    /// Replace the inline style of the media element
    fn set_media_style(&self, css: &str);

    /// Bind a playback source to the media element
    fn set_media_source(&self, url: &str);

    /// Request a full document reload
    fn reload(&self);
}

/// Durable boolean flags with read-and-clear semantics
pub trait FlagStore: Send + Sync {
    fn set_flag(&self, key: &str) -> Result<()>;

    /// Read a flag and clear it in the same step
    fn take_flag(&self, key: &str) -> Result<bool>;
}

/// Hook point in front of every outgoing request
pub trait NetworkHook: Send + Sync {
    /// Install a gate; returns `false` when one is already installed
    fn install(&self, gate: Arc<RequestGate>) -> bool;
}
