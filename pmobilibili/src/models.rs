//! Data models for Bilibili API responses
//!
//! Every endpoint wraps its payload in the same envelope:
//! `{ "code": 0, "message": "0", "data": { ... } }`. A non-zero code is a
//! failure regardless of the HTTP status.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ============================================================================
// Envelope
// ============================================================================

/// Common response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// Status code, `0` on success
    #[serde(alias = "status")]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Unwrap the payload, turning a failure status or a missing payload into an error
    pub fn into_data(self) -> Result<T> {
        if !self.is_success() {
            return Err(Error::ApiError {
                code: self.code,
                message: self.message,
            });
        }
        self.data.ok_or_else(|| Error::missing_data("data"))
    }
}

// ============================================================================
// Stream id
// ============================================================================

/// Internal stream identifier (`cid`) of one part of a video
///
/// The API sends it as a number; it is kept as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StreamId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => StreamId(n.to_string()),
            Raw::Text(s) => StreamId(s),
        })
    }
}

// ============================================================================
// Metadata endpoint (/x/web-interface/view)
// ============================================================================

/// Payload of the video metadata endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub bvid: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Cover image URL
    #[serde(default)]
    pub pic: Option<String>,
    /// Stream id of the main (first) part
    #[serde(default)]
    pub cid: Option<StreamId>,
    /// Parts in order
    #[serde(default)]
    pub pages: Vec<VideoPart>,
}

/// One part of a multi-part video
#[derive(Debug, Clone, Deserialize)]
pub struct VideoPart {
    pub cid: StreamId,
    #[serde(default)]
    pub page: Option<u32>,
    /// Part title
    #[serde(default)]
    pub part: Option<String>,
    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<u64>,
}

impl VideoInfo {
    /// Select the stream id for a 1-based sub-part, or the main one
    pub fn stream_id_for(&self, sub_part: Option<u32>) -> Result<StreamId> {
        match sub_part {
            None => self
                .cid
                .clone()
                .or_else(|| self.pages.first().map(|p| p.cid.clone()))
                .ok_or_else(|| Error::missing_data("data.cid")),
            Some(requested) => requested
                .checked_sub(1)
                .and_then(|index| self.pages.get(index as usize))
                .map(|p| p.cid.clone())
                .ok_or(Error::PartOutOfRange {
                    requested,
                    available: self.pages.len(),
                }),
        }
    }
}

// ============================================================================
// Playback-address endpoint (/x/player/wbi/playurl)
// ============================================================================

/// Payload of the playback-address endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct PlayUrlInfo {
    #[serde(default)]
    pub quality: Option<u32>,
    /// DASH manifest, present when an audio-capable layout was negotiated
    #[serde(default)]
    pub dash: Option<DashManifest>,
}

/// DASH media manifest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashManifest {
    #[serde(default)]
    pub duration: Option<u64>,
    /// Audio representations, `null` for videos without a separate audio stream
    #[serde(default)]
    pub audio: Option<Vec<AudioTrack>>,
}

/// One audio representation
///
/// The API repeats the URL under both `baseUrl` and `base_url`.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioTrack {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(rename = "baseUrl", default)]
    base_url_camel: Option<String>,
    #[serde(rename = "base_url", default)]
    base_url_snake: Option<String>,
    #[serde(default)]
    pub bandwidth: Option<u64>,
    #[serde(default)]
    pub codecs: Option<String>,
}

impl AudioTrack {
    pub fn url(&self) -> Option<&str> {
        self.base_url_camel
            .as_deref()
            .or(self.base_url_snake.as_deref())
            .filter(|u| !u.is_empty())
    }
}

impl PlayUrlInfo {
    /// URL of the first audio track of the manifest
    pub fn first_audio_url(&self) -> Option<&str> {
        self.dash
            .as_ref()
            .and_then(|dash| dash.audio.as_deref())
            .and_then(<[AudioTrack]>::first)
            .and_then(AudioTrack::url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_failure() {
        let response: ApiResponse<VideoInfo> =
            serde_json::from_value(json!({"code": -404, "message": "啥都木有", "data": null}))
                .unwrap();
        match response.into_data() {
            Err(Error::ApiError { code, .. }) => assert_eq!(code, -404),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_envelope_accepts_status_alias() {
        let response: ApiResponse<VideoInfo> =
            serde_json::from_value(json!({"status": 0, "data": {"cid": "42"}})).unwrap();
        let info = response.into_data().unwrap();
        assert_eq!(info.stream_id_for(None).unwrap(), StreamId::new("42"));
    }

    #[test]
    fn test_envelope_success_without_data() {
        let response: ApiResponse<VideoInfo> =
            serde_json::from_value(json!({"code": 0})).unwrap();
        assert!(matches!(response.into_data(), Err(Error::MissingData(_))));
    }

    #[test]
    fn test_stream_id_selection() {
        let info: VideoInfo = serde_json::from_value(json!({
            "cid": 100,
            "pages": [{"cid": 100, "page": 1}, {"cid": 200, "page": 2}, {"cid": 300, "page": 3}]
        }))
        .unwrap();

        assert_eq!(info.stream_id_for(None).unwrap().as_str(), "100");
        assert_eq!(info.stream_id_for(Some(1)).unwrap().as_str(), "100");
        assert_eq!(info.stream_id_for(Some(3)).unwrap().as_str(), "300");
        assert!(matches!(
            info.stream_id_for(Some(4)),
            Err(Error::PartOutOfRange { requested: 4, available: 3 })
        ));
        assert!(matches!(
            info.stream_id_for(Some(0)),
            Err(Error::PartOutOfRange { .. })
        ));
    }

    #[test]
    fn test_main_stream_falls_back_to_first_page() {
        let info: VideoInfo =
            serde_json::from_value(json!({"pages": [{"cid": 7}]})).unwrap();
        assert_eq!(info.stream_id_for(None).unwrap().as_str(), "7");
    }

    #[test]
    fn test_audio_track_with_both_url_keys() {
        let info: PlayUrlInfo = serde_json::from_value(json!({
            "dash": {"audio": [
                {"id": 30280, "baseUrl": "https://x/a.m4a", "base_url": "https://x/a.m4a"},
                {"id": 30216, "baseUrl": "https://x/b.m4a"}
            ]}
        }))
        .unwrap();
        assert_eq!(info.first_audio_url(), Some("https://x/a.m4a"));
    }

    #[test]
    fn test_no_audio_track() {
        let info: PlayUrlInfo = serde_json::from_value(json!({"dash": {"audio": []}})).unwrap();
        assert_eq!(info.first_audio_url(), None);

        let info: PlayUrlInfo =
            serde_json::from_value(json!({"dash": {"audio": null}})).unwrap();
        assert_eq!(info.first_audio_url(), None);

        let info: PlayUrlInfo = serde_json::from_value(json!({"durl": []})).unwrap();
        assert_eq!(info.first_audio_url(), None);
    }
}
