use crate::error::{Error, Result};

/// Decoded body of a parse request.
#[derive(Default, Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecognitionResult {
    /// One entry per page, in source order.
    #[serde(rename = "ParsedResults", default, deserialize_with = "null_as_default")]
    pub documents: Vec<DocumentResult>,
    #[serde(rename = "OCRExitCode", default)]
    pub exit_code: i64,
    #[serde(rename = "IsErroredOnProcessing", default)]
    pub is_error: bool,
    #[serde(rename = "ErrorMessage", default)]
    pub error_message: ErrorMessage,
    #[serde(rename = "ErrorDetails", default, deserialize_with = "null_as_default")]
    pub error_details: String,
    #[serde(rename = "ProcessingTimeInMilliseconds", default, deserialize_with = "null_as_default")]
    pub processing_time_ms: String,
    #[serde(rename = "SearchablePDFURL", default)]
    pub searchable_pdf_url: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocumentResult {
    #[serde(rename = "TextOverlay", default)]
    pub overlay: Option<TextOverlay>,
    #[serde(rename = "TextOrientation", default, deserialize_with = "null_as_default")]
    pub text_orientation: String,
    #[serde(rename = "FileParseExitCode", default)]
    pub exit_code: i64,
    #[serde(rename = "ParsedText", default, deserialize_with = "null_as_default")]
    pub parsed_text: String,
    #[serde(rename = "ErrorMessage", default)]
    pub error_message: ErrorMessage,
    #[serde(rename = "ErrorDetails", default, deserialize_with = "null_as_default")]
    pub error_details: String,
}

#[derive(Default, Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextOverlay {
    #[serde(rename = "Lines", default, deserialize_with = "null_as_default")]
    pub lines: Vec<Line>,
    #[serde(rename = "HasOverlay", default)]
    pub has_overlay: bool,
    #[serde(rename = "Message", default, deserialize_with = "null_as_default")]
    pub message: String,
}

#[derive(Default, Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Line {
    #[serde(rename = "Words", default, deserialize_with = "null_as_default")]
    pub words: Vec<Word>,
    #[serde(rename = "MaxHeight", default)]
    pub max_height: f64,
    #[serde(rename = "MinTop", default)]
    pub min_top: f64,
}

#[derive(Default, Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Word {
    #[serde(rename = "WordText", default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(rename = "Left", default)]
    pub left: f64,
    #[serde(rename = "Top", default)]
    pub top: f64,
    #[serde(rename = "Height", default)]
    pub height: f64,
    #[serde(rename = "Width", default)]
    pub width: f64,
}

/// `ErrorMessage` comes back as a plain string from older single-document
/// responses and as a list of strings from newer ones.
#[derive(Default, Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    #[default]
    None,
    Single(String),
    Multiple(Vec<String>),
}

impl ErrorMessage {
    /// Every message in order, treating a single string as a one-item list.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            ErrorMessage::None => &[],
            ErrorMessage::Single(message) => std::slice::from_ref(message),
            ErrorMessage::Multiple(messages) => messages,
        };
        slice.iter().map(String::as_str)
    }

    pub fn joined(&self) -> String {
        self.messages().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.messages().all(str::is_empty)
    }
}

impl RecognitionResult {
    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// All recognized text, or the best available diagnostic when the engine
    /// reported an error.
    ///
    /// No separators are inserted between pages or messages.
    pub fn combined_text(&self) -> String {
        if !self.is_error {
            return self
                .documents
                .iter()
                .map(|doc| doc.parsed_text.as_str())
                .collect();
        }

        if !self.error_message.is_empty() {
            return self.error_message.joined();
        }

        let per_document: String = self
            .documents
            .iter()
            .map(|doc| doc.error_message.joined())
            .collect();
        if !per_document.is_empty() {
            return per_document;
        }

        self.error_details.clone()
    }

    /// Every overlay word, page by page and line by line.
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.documents
            .iter()
            .filter_map(|doc| doc.overlay.as_ref())
            .flat_map(|overlay| overlay.lines.iter())
            .flat_map(|line| line.words.iter())
    }

    /// Converts an engine-reported failure into [`Error::RemoteProcessing`].
    pub fn ensure_success(self) -> Result<Self> {
        if !self.is_error {
            return Ok(self);
        }

        Err(Error::RemoteProcessing {
            exit_code: self.exit_code,
            message: self.combined_text(),
            result: Box::new(self),
        })
    }
}

/// Decode a response body. Missing keys fall back to defaults, anything that
/// is not the expected JSON shape is a [`Error::Decode`].
///
/// The root must be a JSON object; serde would otherwise accept an array as
/// a positional field list and default every field.
pub fn parse_response(body: &str) -> Result<RecognitionResult> {
    let decode_error = |source: serde_json::Error| Error::Decode {
        source,
        body: body.to_owned(),
    };

    let value: serde_json::Value = serde_json::from_str(body).map_err(decode_error)?;
    if !value.is_object() {
        return Err(decode_error(<serde_json::Error as serde::de::Error>::custom(
            "expected a JSON object at the root of the response",
        )));
    }

    serde_json::from_value(value).map_err(decode_error)
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    Ok(<Option<T> as serde::Deserialize>::deserialize(deserializer)?.unwrap_or_default())
}
