//! HTTP client for the Bilibili web API
//!
//! Resolving an audio-only stream takes two dependent calls:
//!
//! 1. the metadata endpoint maps a public media id (`bvid`) to the internal
//!    stream id (`cid`) of the requested part,
//! 2. the playback-address endpoint returns a DASH manifest for that stream,
//!    from which the first audio track is taken.
//!
//! Each call is a single attempt; retrying is left to the caller.
//!
//! # Example
//!
//! ```no_run
//! use pmobilibili::{BilibiliClient, MediaLocator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BilibiliClient::new().await?;
//!     let locator = MediaLocator::from_url("https://www.bilibili.com/video/BV1xx411c7mD")?;
//!
//!     let audio_url = client.resolve_locator(&locator).await?;
//!     println!("Audio: {}", audio_url);
//!
//!     Ok(())
//! }
//! ```

use crate::error::{Error, Result};
use crate::locator::MediaLocator;
use crate::models::{ApiResponse, PlayUrlInfo, StreamId, VideoInfo};
use reqwest::header::REFERER;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "https://api.bilibili.com";

/// Default `Referer` sent with API requests
pub const DEFAULT_REFERER: &str = "https://www.bilibili.com";

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "PMOBili/0.1.0 (pmobilibili)";

/// Format negotiation flag requesting the DASH layout (separate audio tracks)
pub const DASH_FNVAL: u32 = 16;

/// Video metadata endpoint
pub const VIEW_PATH: &str = "/x/web-interface/view";

/// Playback-address endpoint
pub const PLAYURL_PATH: &str = "/x/player/wbi/playurl";

/// Seek-preview thumbnail endpoint, as matched against outgoing request URLs
pub const SEEK_PREVIEW_PATTERN: &str = "api.bilibili.com/x/player/videoshot";

/// Bilibili HTTP client
///
/// Stateless: nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct BilibiliClient {
    pub(crate) client: Client,
    api_base: String,
    referer: String,
    timeout: Duration,
    fnval: u32,
}

impl BilibiliClient {
    /// Create a new client with default settings
    pub async fn new() -> Result<Self> {
        Self::builder().build().await
    }

    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client with a custom reqwest::Client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            fnval: DASH_FNVAL,
        }
    }

    /// Get the API base URL
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Format flag used by [`resolve_locator`](Self::resolve_locator)
    pub fn fnval(&self) -> u32 {
        self.fnval
    }

    /// Get the internal HTTP client
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    // ========================================================================
    // URLs
    // ========================================================================

    /// Metadata endpoint URL for a media id
    pub fn view_url(&self, media_id: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.api_base, VIEW_PATH))?;
        url.query_pairs_mut().append_pair("bvid", media_id);
        Ok(url)
    }

    /// Playback-address endpoint URL
    pub fn playurl_url(&self, media_id: &str, stream_id: &StreamId, fnval: u32) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.api_base, PLAYURL_PATH))?;
        url.query_pairs_mut()
            .append_pair("bvid", media_id)
            .append_pair("cid", stream_id.as_str())
            .append_pair("fnval", &fnval.to_string());
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<ApiResponse<T>> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(REFERER, &self.referer)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Fetch the metadata of a video
    pub async fn video_info(&self, media_id: &str) -> Result<VideoInfo> {
        let url = self.view_url(media_id)?;
        self.get_json::<VideoInfo>(url).await?.into_data()
    }

    /// Resolve the stream id of a sub-part (or of the main part when `None`)
    pub async fn resolve_stream_id(
        &self,
        media_id: &str,
        sub_part: Option<u32>,
    ) -> Result<StreamId> {
        let info = self.video_info(media_id).await?;
        let stream_id = info.stream_id_for(sub_part)?;

        debug!(
            media_id = %media_id,
            sub_part = ?sub_part,
            stream_id = %stream_id,
            "Resolved stream id"
        );

        Ok(stream_id)
    }

    // ========================================================================
    // Playback address
    // ========================================================================

    /// Fetch the playback manifest of a stream
    pub async fn play_url(
        &self,
        media_id: &str,
        stream_id: &StreamId,
        fnval: u32,
    ) -> Result<PlayUrlInfo> {
        let url = self.playurl_url(media_id, stream_id, fnval)?;
        self.get_json::<PlayUrlInfo>(url).await?.into_data()
    }

    /// Resolve the URL of the first audio track of a stream
    pub async fn resolve_audio_source(
        &self,
        media_id: &str,
        stream_id: &StreamId,
        fnval: u32,
    ) -> Result<String> {
        let info = self.play_url(media_id, stream_id, fnval).await?;

        info.first_audio_url()
            .map(str::to_string)
            .ok_or_else(|| Error::NoAudioTrack {
                media_id: media_id.to_string(),
                stream_id: stream_id.to_string(),
            })
    }

    /// Run the whole pipeline: locator → stream id → audio URL
    ///
    /// The playback call is only made once the stream id is known.
    ///
    /// ```no_run
    /// # use pmobilibili::{BilibiliClient, MediaLocator};
    /// # tokio_test::block_on(async {
    /// let client = BilibiliClient::new().await.unwrap();
    /// let locator: MediaLocator = "BV1xx411c7mD?p=2".parse().unwrap();
    /// let audio = client.resolve_locator(&locator).await.unwrap();
    /// # });
    /// ```
    pub async fn resolve_locator(&self, locator: &MediaLocator) -> Result<String> {
        let stream_id = self
            .resolve_stream_id(&locator.media_id, locator.sub_part)
            .await?;
        self.resolve_audio_source(&locator.media_id, &stream_id, self.fnval)
            .await
    }
}

/// Builder for configuring a BilibiliClient
#[derive(Debug)]
pub struct ClientBuilder {
    client: Option<Client>,
    api_base: String,
    referer: String,
    timeout: Duration,
    user_agent: String,
    proxy: Option<String>,
    fnval: u32,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            api_base: DEFAULT_API_BASE.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            fnval: DASH_FNVAL,
        }
    }
}

impl ClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the API base URL (no trailing slash)
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the `Referer` header
    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a proxy URL
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set the format negotiation flag
    pub fn fnval(mut self, fnval: u32) -> Self {
        self.fnval = fnval;
        self
    }

    /// Build the client
    pub async fn build(self) -> Result<BilibiliClient> {
        let client = if let Some(client) = self.client {
            client
        } else {
            let mut builder = Client::builder()
                .user_agent(&self.user_agent)
                .timeout(self.timeout);

            if let Some(proxy_url) = &self.proxy {
                let proxy = reqwest::Proxy::all(proxy_url)
                    .map_err(|e| Error::other(format!("Invalid proxy: {}", e)))?;
                builder = builder.proxy(proxy);
            }

            builder.build()?
        };

        Ok(BilibiliClient {
            client,
            api_base: self.api_base,
            referer: self.referer,
            timeout: self.timeout,
            fnval: self.fnval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = ClientBuilder::default();
        assert_eq!(builder.api_base, DEFAULT_API_BASE);
        assert_eq!(builder.fnval, DASH_FNVAL);
        assert_eq!(
            builder.timeout,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_builder_trims_api_base() {
        let builder = ClientBuilder::new().api_base("http://127.0.0.1:9000/");
        assert_eq!(builder.api_base, "http://127.0.0.1:9000");
    }

    #[tokio::test]
    async fn test_endpoint_urls() {
        let client = BilibiliClient::new().await.unwrap();

        assert_eq!(
            client.view_url("BV1ab").unwrap().as_str(),
            "https://api.bilibili.com/x/web-interface/view?bvid=BV1ab"
        );
        assert_eq!(
            client
                .playurl_url("BV1ab", &StreamId::new("42"), DASH_FNVAL)
                .unwrap()
                .as_str(),
            "https://api.bilibili.com/x/player/wbi/playurl?bvid=BV1ab&cid=42&fnval=16"
        );
    }

    #[tokio::test]
    async fn test_seek_preview_pattern_is_distinct_from_api_calls() {
        let client = BilibiliClient::new().await.unwrap();
        let view = client.view_url("BV1ab").unwrap();
        let play = client
            .playurl_url("BV1ab", &StreamId::new("1"), DASH_FNVAL)
            .unwrap();

        assert!(!view.as_str().contains(SEEK_PREVIEW_PATTERN));
        assert!(!play.as_str().contains(SEEK_PREVIEW_PATTERN));
    }

    /// Resolve a real video end to end
    #[tokio::test]
    #[ignore = "Integration test - calls real Bilibili API"]
    async fn test_resolve_real_video() {
        let client = BilibiliClient::new()
            .await
            .expect("Failed to create client");
        let locator = MediaLocator::new("BV1GJ411x7h7", None);

        let url = client.resolve_locator(&locator).await;
        assert!(url.is_ok(), "Failed to resolve audio: {:?}", url.err());
        println!("Audio: {}", url.unwrap());
    }
}
