//! Metadata derived from caller-supplied path strings.
//!
//! Paths arrive in several shapes: local paths, HTTP URLs, and
//! internal-network mount paths such as
//! `/mnt/data/pan/20241216/JB14_ccd_01/hf.jpg`. Nothing here touches the
//! filesystem; all derivation is string matching.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use texbake_common::clock::Clock;
use texbake_common::error::{TexbakeError, TexbakeResult};

use crate::request::RenderRequest;

static DATE_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[/\\](\d{8})[/\\]").expect("valid date segment regex"));

static SOURCE_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(pan|sar|irs)/(\d{8})/").expect("valid source segment regex"));

/// Imaging source recognized in internal-network texture paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    /// Panchromatic optical.
    Pan,
    /// Synthetic aperture radar.
    Sar,
    /// Infrared.
    Irs,
}

impl SourceTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pan => "pan",
            Self::Sar => "sar",
            Self::Irs => "irs",
        }
    }

    fn parse(tag: &str) -> Option<Self> {
        match tag {
            "pan" => Some(Self::Pan),
            "sar" => Some(Self::Sar),
            "irs" => Some(Self::Irs),
            _ => None,
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a date token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// An 8-digit segment of the texture path.
    Path,
    /// No segment found; today's date was used.
    Clock,
}

/// Model name and date token for one request. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    /// Model file name without extension.
    pub model_name: String,

    /// 8-digit date (`YYYYMMDD`).
    pub date_token: String,

    /// How the date token was obtained.
    pub date_source: DateSource,

    /// Imaging source of the top-view texture, when recognizable.
    /// Diagnostic only.
    pub source_tag: Option<SourceTag>,
}

impl ExtractedMetadata {
    /// Derive metadata for a request: the model name from its model path and
    /// the date token from its top-view texture path.
    ///
    /// The request must already be validated.
    pub fn extract(request: &RenderRequest, clock: &dyn Clock) -> TexbakeResult<Self> {
        request.validate()?;
        let model_name = extract_model_name(&request.model_path)?;
        let top = request.top_texture();
        let (date_token, date_source) = match find_date_segment(top) {
            Some(token) => (token.to_string(), DateSource::Path),
            None => (clock.date_token(), DateSource::Clock),
        };
        Ok(Self {
            model_name,
            date_token,
            date_source,
            source_tag: detect_source_tag(top).map(|(tag, _)| tag),
        })
    }
}

/// Final path segment with its extension stripped.
///
/// Both `/` and `\` are treated as separators; a URL query or fragment is
/// ignored. Fails when the segment has no `.` or nothing before it.
pub fn extract_model_name(path: &str) -> TexbakeResult<String> {
    let without_suffix = if path.contains("://") {
        path.split(['?', '#']).next().unwrap_or(path)
    } else {
        path
    };

    let file_name = without_suffix
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(without_suffix);

    if file_name.is_empty() {
        return Err(TexbakeError::malformed_path(path, "path has no file name"));
    }

    match file_name.rfind('.') {
        Some(0) => Err(TexbakeError::malformed_path(path, "file name has no stem")),
        Some(dot) => Ok(file_name[..dot].to_string()),
        None => Err(TexbakeError::malformed_path(
            path,
            "file name has no extension separator",
        )),
    }
}

/// The first 8-digit segment bounded by separators, if any.
pub fn find_date_segment(path: &str) -> Option<&str> {
    DATE_SEGMENT
        .captures(path)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Date token for a texture path, falling back to today's date.
pub fn extract_date_token(path: &str, clock: &dyn Clock) -> String {
    find_date_segment(path)
        .map(str::to_string)
        .unwrap_or_else(|| clock.date_token())
}

/// Recognize the `/<pan|sar|irs>/<YYYYMMDD>/` internal-network convention.
pub fn detect_source_tag(path: &str) -> Option<(SourceTag, String)> {
    let caps = SOURCE_SEGMENT.captures(path)?;
    let tag = SourceTag::parse(caps.get(1)?.as_str())?;
    Some((tag, caps.get(2)?.as_str().to_string()))
}
