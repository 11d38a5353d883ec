//! Client for the [OCR.space](https://ocr.space) text recognition API.
//!
//! ```no_run
//! use ocr_space::{Config, OcrClient};
//!
//! # fn main() -> ocr_space::Result<()> {
//! let client = OcrClient::new(Config::new("my-api-key", "eng")?);
//! let result = client.convert_pdf_from_url("https://example.com/scan.pdf")?;
//! println!("{}", result.combined_text());
//! # Ok(())
//! # }
//! ```

pub mod apis;
mod client;
mod config;
mod error;
pub mod request;

pub use apis::ocr::{parse_response, DocumentResult, ErrorMessage, Line, RecognitionResult, TextOverlay, Word};
pub use client::OcrClient;
pub use config::{Config, DEFAULT_ENDPOINT};
pub use error::{Error, Result};
pub use request::{build_payload, ConversionOptions, DocumentKind, FileType, Payload, Source, UploadMode};
