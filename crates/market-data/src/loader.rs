use crate::clean::parse_csv;
use crate::error::DataError;
use core_types::OhlcvFrame;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Where to look for one symbol's bars. Sources are tried in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSource {
    pub filepath: Option<PathBuf>,
    /// An `http(s)://` or `file://` URL.
    pub url: Option<String>,
}

impl LoadSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            filepath: Some(path.into()),
            url: None,
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self {
            filepath: None,
            url: Some(url.into()),
        }
    }
}

/// Loads and cleans one symbol's bars from the first source that works.
///
/// A source that is unreadable, empty, or fails cleaning is skipped with a
/// warning. When every source fails, the last failure is attached to the
/// returned `NoSource` error.
pub fn load(symbol: &str, source: &LoadSource) -> Result<OhlcvFrame, DataError> {
    let mut last_error = None;

    if let Some(path) = &source.filepath {
        match from_file(path) {
            Ok(frame) => return Ok(loaded(symbol, "file", frame)),
            Err(err) => {
                tracing::warn!(symbol, path = %path.display(), error = %err, "skipping file source");
                last_error = Some(err);
            }
        }
    }

    if let Some(url) = &source.url {
        match from_url(url) {
            Ok(frame) => return Ok(loaded(symbol, "url", frame)),
            Err(err) => {
                tracing::warn!(symbol, url = %url, error = %err, "skipping url source");
                last_error = Some(err);
            }
        }
    }

    Err(DataError::NoSource {
        symbol: symbol.to_string(),
        last_error: last_error.map(Box::new),
    })
}

fn loaded(symbol: &str, kind: &str, frame: OhlcvFrame) -> OhlcvFrame {
    tracing::info!(symbol, source = kind, bars = frame.len(), "loaded price data");
    frame
}

fn from_file(path: &Path) -> Result<OhlcvFrame, DataError> {
    let file = File::open(path)?;
    parse_csv(BufReader::new(file))
}

fn from_url(url: &str) -> Result<OhlcvFrame, DataError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| DataError::InvalidUrl(url.to_string()))?;
    if parsed.scheme() == "file" {
        let path = parsed
            .to_file_path()
            .map_err(|_| DataError::InvalidUrl(url.to_string()))?;
        return from_file(&path);
    }

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()?;
    let body = client.get(parsed).send()?.error_for_status()?.bytes()?;
    parse_csv(&body[..])
}
