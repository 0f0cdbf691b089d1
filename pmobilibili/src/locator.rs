//! Media locator parsing
//!
//! A video page URL looks like `https://www.bilibili.com/video/BV1xx411c7mD/?p=2`.
//! The media identifier is the first path segment starting with `BV`; the
//! optional `p` query parameter selects a 1-based sub-part.
//!
//! Parsing is a pure function of the location: no network, no page access.

use crate::error::LocatorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Prefix of public media identifiers (case-sensitive)
pub const MEDIA_ID_PREFIX: &str = "BV";

/// Query parameter holding the sub-part index
pub const PART_QUERY_KEY: &str = "p";

/// Origin used to resolve relative locations such as `/video/BV1xx`
pub const DEFAULT_PAGE_ORIGIN: &str = "https://www.bilibili.com/";

/// Media identifier and optional sub-part parsed from a page location
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaLocator {
    /// Public media identifier (e.g. "BV1xx411c7mD")
    pub media_id: String,
    /// 1-based part index, `None` for the first/only part
    pub sub_part: Option<u32>,
}

impl MediaLocator {
    pub fn new(media_id: impl Into<String>, sub_part: Option<u32>) -> Self {
        Self {
            media_id: media_id.into(),
            sub_part,
        }
    }

    /// Parse a locator from a path and an optional query string
    ///
    /// The query may be given with or without its leading `?`.
    ///
    /// # Example
    ///
    /// ```
    /// use pmobilibili::MediaLocator;
    ///
    /// let locator = MediaLocator::parse("/video/BV1xx411c7mD/", Some("?p=3")).unwrap();
    /// assert_eq!(locator.media_id, "BV1xx411c7mD");
    /// assert_eq!(locator.sub_part, Some(3));
    /// ```
    pub fn parse(path: &str, query: Option<&str>) -> Result<Self, LocatorError> {
        let media_id = path
            .split('/')
            .find(|segment| is_media_id(segment))
            .ok_or_else(|| LocatorError::MissingMediaId(path.to_string()))?;

        let sub_part = query.and_then(parse_sub_part);

        Ok(Self::new(media_id, sub_part))
    }

    /// Parse a locator from an absolute or site-relative URL
    pub fn from_url(location: &str) -> Result<Self, LocatorError> {
        let url = match Url::parse(location) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Url::parse(DEFAULT_PAGE_ORIGIN)?.join(location)?
            }
            Err(e) => return Err(e.into()),
        };
        Self::parse(url.path(), url.query())
    }
}

impl FromStr for MediaLocator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_url(s)
    }
}

impl fmt::Display for MediaLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sub_part {
            Some(p) => write!(f, "{}?{}={}", self.media_id, PART_QUERY_KEY, p),
            None => f.write_str(&self.media_id),
        }
    }
}

fn is_media_id(segment: &str) -> bool {
    segment
        .strip_prefix(MEDIA_ID_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric()))
}

// First `p` wins; zero or non-numeric values count as absent.
fn parse_sub_part(query: &str) -> Option<u32> {
    let query = query.strip_prefix('?').unwrap_or(query);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == PART_QUERY_KEY)
        .and_then(|(_, value)| value.parse::<u32>().ok())
        .filter(|p| *p > 0)
}
