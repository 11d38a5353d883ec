use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::apis::ocr::RecognitionResult;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("API key must not be empty")]
    MissingApiKey,

    #[error("invalid endpoint URL {url:?}: {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("could not build multipart upload: {0}")]
    Multipart(#[source] reqwest::Error),

    #[error("request to OCR endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("OCR endpoint answered {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("could not decode OCR response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        /// Raw response body, kept for diagnostics.
        body: String,
    },

    #[error("unsupported file type {extension:?} for {path:?}, expected pdf, png, jpg or gif")]
    UnsupportedFileType { path: PathBuf, extension: String },

    #[error("could not read {path:?}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("OCR engine failed to process the document (exit code {exit_code}): {message}")]
    RemoteProcessing {
        exit_code: i64,
        message: String,
        result: Box<RecognitionResult>,
    },
}

impl Error {
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, Error::FileAccess { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }

    /// The decoded result behind a [`Error::RemoteProcessing`] failure.
    pub fn remote_result(&self) -> Option<&RecognitionResult> {
        match self {
            Error::RemoteProcessing { result, .. } => Some(result),
            _ => None,
        }
    }
}
