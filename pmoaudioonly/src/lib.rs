//! Audio-only playback mode for Bilibili video pages
//!
//! Turns a video page into an audio player: the video frames are replaced by
//! the cover image, the media element is fed the audio-only DASH stream, and
//! the seek-preview thumbnails (the heaviest remaining traffic) are blocked
//! before they leave.
//!
//! The crate does not talk to a browser. The host (a script manager, a
//! webview, a test) implements three small traits from [`host`]:
//!
//! - [`Page`]: the document (location, banner, preview image, media element)
//! - [`FlagStore`]: a durable flag surviving a reload; `pmoconfig::Config`
//!   implements it
//! - [`NetworkHook`]: where the request gate is installed; [`GatedHttp`]
//!   implements it on top of `reqwest`
//!
//! In-memory implementations of all three live in `pmoaudioonly::testing`, behind the
//! `testing` feature.
//!
//! # Example
//!
//! ```no_run
//! use pmoaudioonly::{
//!     AudioModeBanner, AudioOnlyConfigExt, AudioOnlyController, AudioOnlySession, GatedHttp,
//!     MetaEntry, Page, PageEvent,
//! };
//! use pmobilibili::BilibiliConfigExt;
//! use pmoconfig::get_config;
//! use std::sync::Arc;
//!
//! /// Bridge to the real document, provided by the host
//! struct HostPage;
//!
//! impl Page for HostPage {
//!     fn location(&self) -> String {
//!         "https://www.bilibili.com/video/BV1xx411c7mD/".to_string()
//!     }
//!     fn has_audio_marker(&self) -> bool { false }
//!     fn insert_audio_marker(&self, _banner: &AudioModeBanner) {}
//!     fn preview_image_source(&self) -> Option<String> { None }
//!     fn remove_preview_image(&self) -> bool { false }
//!     fn meta_entries(&self) -> Vec<MetaEntry> { Vec::new() }
//!     fn has_media_element(&self) -> bool { true }
//!     fn set_media_style(&self, _css: &str) {}
//!     fn set_media_source(&self, url: &str) { println!("Playing {}", url) }
//!     fn reload(&self) {}
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = get_config();
//!     let _logs = pmoaudioonly::logs::init_logging(&config)?;
//!
//!     let client = config.bilibili_client_builder()?.build().await?;
//!
//!     let controller = AudioOnlyController::load(
//!         Arc::new(HostPage),
//!         config.clone(),
//!         Arc::new(GatedHttp::default()),
//!         Arc::new(client),
//!         config.audio_only_settings()?,
//!     );
//!
//!     let (session, events) = AudioOnlySession::new(controller, 16);
//!     events.send(PageEvent::MenuCommand).await?;
//!     events.send(PageEvent::Shutdown).await?;
//!     session.run().await;
//!     Ok(())
//! }
//! ```

pub mod config_ext;
pub mod controller;
pub mod error;
pub mod host;
pub mod interceptor;
pub mod logs;
pub mod session;
pub mod source;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod view;

// Re-exports
pub use config_ext::AudioOnlyConfigExt;
pub use controller::{
    Activation, AudioOnlyController, AudioOnlySettings, ModeState, Navigation, ReloadReason,
};
pub use error::{InterceptError, ModeError, ResolutionError, Result};
pub use host::{AudioModeBanner, FlagStore, MetaEntry, NetworkHook, Page, PENDING_RELOAD_KEY};
pub use interceptor::{GatedHttp, RequestFilter, RequestGate, SeekPreviewFilter, Verdict};
pub use session::{AudioOnlySession, PageEvent};
pub use source::{AudioResolver, AudioSource, AudioSourceHandle};
pub use view::{MediaBackdrop, SourceBinding, ViewMutator};
