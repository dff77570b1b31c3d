//! Raw byte sources for the survey file

use std::fmt;
use std::path::PathBuf;

use tracing::info;

use crate::config::Encoding;
use crate::{DashError, Result};

/// Upper bound on a downloaded survey file
const MAX_DOWNLOAD_BYTES: u64 = 256 * 1024 * 1024;

/// Where the raw survey file lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    /// Classify a location: `http(s)://` prefixes are URLs, everything else a path
    pub fn parse(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(location.to_string())
        } else {
            Source::File(PathBuf::from(location))
        }
    }

    /// Read the whole source into memory
    pub fn fetch(&self) -> Result<Vec<u8>> {
        match self {
            Source::Url(url) => {
                info!("Downloading {}", url);
                let mut response = ureq::get(url)
                    .call()
                    .map_err(|e| DashError::LoadError(format!("Failed to fetch {}: {}", url, e)))?;
                response
                    .body_mut()
                    .with_config()
                    .limit(MAX_DOWNLOAD_BYTES)
                    .read_to_vec()
                    .map_err(|e| {
                        DashError::LoadError(format!("Failed to read body of {}: {}", url, e))
                    })
            }
            Source::File(path) => {
                info!("Reading {}", path.display());
                std::fs::read(path).map_err(|e| {
                    DashError::LoadError(format!("Failed to read {}: {}", path.display(), e))
                })
            }
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => write!(f, "{}", url),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Decode raw bytes to UTF-8 text
pub fn decode(bytes: Vec<u8>, encoding: Encoding) -> Result<String> {
    match encoding {
        Encoding::Utf8 => String::from_utf8(bytes)
            .map_err(|e| DashError::LoadError(format!("Source is not valid UTF-8: {}", e))),
        Encoding::Windows1252 => {
            // Every byte maps to a code point, so decoding never fails
            let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(&bytes);
            Ok(text.into_owned())
        }
    }
}
