//! Bilibili client library for PMOBili
//!
//! This crate provides what is needed to go from a video page URL to a
//! direct audio-only stream URL:
//!
//! - **Locator parsing**: extract the media id (`BV…`) and the optional
//!   sub-part index (`?p=N`) from a page location
//! - **Stream id resolution**: map a media id and part to the internal
//!   stream id through the video metadata endpoint
//! - **Audio source resolution**: fetch the DASH manifest of a stream and
//!   pick its first audio track
//! - **Configuration Extension**: API base, referer, timeout and format flag
//!   stored in pmoconfig
//!
//! # Example
//!
//! ```no_run
//! use pmobilibili::{BilibiliClient, MediaLocator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BilibiliClient::new().await?;
//!     let locator = MediaLocator::from_url("https://www.bilibili.com/video/BV1xx411c7mD/?p=2")?;
//!
//!     let stream_id = client
//!         .resolve_stream_id(&locator.media_id, locator.sub_part)
//!         .await?;
//!     let audio = client
//!         .resolve_audio_source(&locator.media_id, &stream_id, client.fnval())
//!         .await?;
//!     println!("Audio stream: {}", audio);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Request signing
//!
//! The playback-address endpoint is the signed (`wbi`) variant. Signing is
//! the platform's concern: unsigned requests are still answered for public
//! videos, so no signature is computed here.

pub mod client;
pub mod error;
pub mod locator;
pub mod models;

#[cfg(feature = "pmoconfig")]
pub mod config_ext;

// Re-exports
pub use client::{BilibiliClient, ClientBuilder, DASH_FNVAL, SEEK_PREVIEW_PATTERN};
pub use error::{Error, LocatorError, Result};
pub use locator::MediaLocator;
pub use models::{ApiResponse, AudioTrack, DashManifest, PlayUrlInfo, StreamId, VideoInfo, VideoPart};

#[cfg(feature = "pmoconfig")]
pub use config_ext::BilibiliConfigExt;
