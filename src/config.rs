use std::fmt;

use once_cell::sync::Lazy;
use url::Url;

use crate::error::{Error, Result};

/// Public OCR.space parse endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.ocr.space/parse/image";

static DEFAULT_ENDPOINT_URL: Lazy<Url> =
    Lazy::new(|| Url::parse(DEFAULT_ENDPOINT).expect("DEFAULT_ENDPOINT is a valid URL"));

/// Credentials and destination shared by every request.
///
/// Built once and never mutated; clone it to hand it to several clients.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    api_key: String,
    language: String,
    endpoint: Url,
}

impl Config {
    /// The key is only checked for emptiness here. Whether the service accepts
    /// it is discovered when the first request comes back.
    pub fn new(api_key: impl Into<String>, language: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::MissingApiKey);
        }

        Ok(Self {
            api_key,
            language: language.into(),
            endpoint: DEFAULT_ENDPOINT_URL.clone(),
        })
    }

    pub fn with_endpoint(self, endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|source| Error::InvalidEndpoint {
            url: endpoint.to_owned(),
            source,
        })?;

        Ok(Self { endpoint, ..self })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("language", &self.language)
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}
