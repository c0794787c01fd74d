//! Lyric source interface
//!
//! Fetching, decoding and parsing lyric files happens outside this crate.
//! A loader implements `LyricSource` and hands back `RawLyrics`; the sync
//! task only needs to know whether that worked.

use std::future::Future;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::types::RawLyrics;

/// Lyrics format tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LyricsFormat {
    /// Standard LRC format [mm:ss.xx]text
    Lrc,
    /// Apple Music TTML format
    Ttml,
}

/// Where a lyric resource lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceLocation {
    Local(PathBuf),
    Remote(String),
}

/// Text encoding the loader should decode with
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    #[default]
    Utf8,
    Gbk,
    /// Any other encoding label understood by the loader
    Other(String),
}

/// Describes one lyric resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub format: LyricsFormat,
    pub location: SourceLocation,
    #[serde(default)]
    pub encoding: TextEncoding,
}

impl SourceDescriptor {
    pub fn new(format: LyricsFormat, location: SourceLocation) -> Self {
        Self {
            format,
            location,
            encoding: TextEncoding::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }
}

impl std::fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            SourceLocation::Local(path) => write!(f, "{:?} ({:?})", path, self.format),
            SourceLocation::Remote(url) => write!(f, "{} ({:?})", url, self.format),
        }
    }
}

/// Errors a loader may report
#[derive(Debug)]
pub enum LoadError {
    /// The resource does not exist
    NotFound(String),
    /// Bytes could not be decoded with the requested encoding
    Decode(String),
    /// Content is not valid for the requested format
    Malformed(String),
    /// Anything else the loader ran into
    Other(anyhow::Error),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::NotFound(e) => write!(f, "Not found: {}", e),
            LoadError::Decode(e) => write!(f, "Decode error: {}", e),
            LoadError::Malformed(e) => write!(f, "Malformed lyrics: {}", e),
            LoadError::Other(e) => write!(f, "Load error: {:#}", e),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Other(e) => Some(&**e),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for LoadError {
    fn from(e: anyhow::Error) -> Self {
        LoadError::Other(e)
    }
}

/// Asynchronous producer of raw lyric records
pub trait LyricSource: Send + Sync + 'static {
    fn load(
        &self,
        descriptor: &SourceDescriptor,
    ) -> impl Future<Output = Result<RawLyrics, LoadError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_json() {
        let json = r#"{"format":"ttml","location":{"remote":"https://example.com/a.ttml"}}"#;
        let descriptor: SourceDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.format, LyricsFormat::Ttml);
        assert_eq!(descriptor.encoding, TextEncoding::Utf8);
        assert_eq!(descriptor.to_string(), "https://example.com/a.ttml (Ttml)");
    }

    #[test]
    fn test_load_error_wraps_anyhow() {
        let err: LoadError = anyhow::anyhow!("socket closed").context("fetching lyrics").into();
        assert_eq!(err.to_string(), "Load error: fetching lyrics: socket closed");
        assert!(std::error::Error::source(&err).is_some());
    }
}
