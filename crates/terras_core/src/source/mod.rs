//! Raw dataset loading and record extraction.
//!
//! # Responsibility
//! - Read the raw dataset from a local file or a remote URL.
//! - Parse it as JSON and extract the list of land record fragments.
//!
//! # Invariants
//! - Nothing here touches the database; every failure is fatal for the run
//!   and happens before any write.
//! - Accepted shapes: `{"content": {"info_geral": [..]}}`,
//!   `{"content": [..]}` and a bare `[..]`.

use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub mod fetch;
pub mod record;
pub mod timestamp;

pub use fetch::{HttpFetcher, RemoteFetcher};

/// Default remote endpoint of the ISA indigenous lands dataset.
pub const ISA_DATA_URL: &str = "https://mapa.eco.br/data/sisarp/v1/tis.json";

/// Where the raw dataset is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Remote(String),
}

impl DataSource {
    /// Local file when a path is given, the remote `url` otherwise.
    pub fn from_args(path: Option<PathBuf>, url: impl Into<String>) -> Self {
        match path {
            Some(path) => Self::File(path),
            None => Self::Remote(url.into()),
        }
    }
}

impl Display for DataSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "file: {}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// Fatal errors raised while loading or extracting the dataset.
#[derive(Debug)]
pub enum SourceError {
    FileNotFound(PathBuf),
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    Download {
        url: String,
        source: Box<dyn Error + Send + Sync>,
    },
    InvalidJson(serde_json::Error),
    UnexpectedShape,
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileNotFound(path) => write!(f, "File not found: {}", path.display()),
            Self::ReadFile { path, source } => {
                write!(f, "Failed to read file {}: {source}", path.display())
            }
            Self::Download { url, source } => {
                write!(f, "Failed to download data from URL {url}: {source}")
            }
            Self::InvalidJson(err) => write!(f, "Invalid JSON file: {err}"),
            Self::UnexpectedShape => write!(
                f,
                "Unexpected JSON structure. Expected 'content.info_geral' array or a list."
            ),
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::Download { source, .. } => Some(source.as_ref()),
            Self::InvalidJson(err) => Some(err),
            Self::FileNotFound(_) | Self::UnexpectedShape => None,
        }
    }
}

/// Reads the raw bytes of `source`, using `fetcher` for remote sources.
pub fn load_bytes(
    source: &DataSource,
    fetcher: &dyn RemoteFetcher,
) -> Result<Vec<u8>, SourceError> {
    match source {
        DataSource::File(path) => read_file(path),
        DataSource::Remote(url) => fetcher.fetch(url),
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, SourceError> {
    std::fs::read(path).map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            SourceError::FileNotFound(path.to_path_buf())
        } else {
            SourceError::ReadFile {
                path: path.to_path_buf(),
                source: err,
            }
        }
    })
}

/// Parses raw bytes as one JSON document.
pub fn parse_document(bytes: &[u8]) -> Result<Value, SourceError> {
    serde_json::from_slice(bytes).map_err(SourceError::InvalidJson)
}

/// Extracts the record fragment list from any accepted document shape.
pub fn extract_records(document: Value) -> Result<Vec<Value>, SourceError> {
    let records = match document {
        Value::Array(records) => records,
        Value::Object(mut root) => match root.remove("content") {
            Some(Value::Array(records)) => records,
            Some(Value::Object(mut content)) => match content.remove("info_geral") {
                Some(Value::Array(records)) => records,
                _ => return Err(SourceError::UnexpectedShape),
            },
            _ => return Err(SourceError::UnexpectedShape),
        },
        _ => return Err(SourceError::UnexpectedShape),
    };
    Ok(records)
}
