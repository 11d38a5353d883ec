//! Building the outbound form for each kind of input.

use std::fs;
use std::path::{Path, PathBuf};

use base64::{prelude::BASE64_STANDARD, Engine as _};

use crate::config::Config;
use crate::error::{Error, Result};

/// What to recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A file the service downloads itself.
    RemoteUrl(String),
    /// A file on local disk, sent as a data URI or a multipart upload.
    LocalFile(PathBuf),
    /// An already encoded `data:<mime>;base64,...` string, sent as is.
    Encoded(String),
}

impl Source {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Source::RemoteUrl(_) => "url",
            Source::LocalFile(_) => "file",
            Source::Encoded(_) => "encoded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    #[default]
    DataUri,
    Multipart,
}

/// Per-call request flags. A flag that is off is left out of the form.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConversionOptions {
    pub overlay: bool,
    pub scale: bool,
    pub hide_searchable_pdf_text_layer: bool,
    pub upload: UploadMode,
}

impl ConversionOptions {
    /// Overlay, scaling and a hidden searchable-PDF text layer.
    pub fn document() -> Self {
        Self {
            overlay: true,
            scale: true,
            hide_searchable_pdf_text_layer: true,
            upload: UploadMode::DataUri,
        }
    }

    /// Plain text only.
    pub fn image() -> Self {
        Self::default()
    }

    pub fn for_kind(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Pdf => Self::document(),
            DocumentKind::Image => Self::image(),
        }
    }

    pub fn with_upload(self, upload: UploadMode) -> Self {
        Self { upload, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Png,
    Jpg,
    Gif,
}

impl FileType {
    /// Looks only at the text after the last `.` of the path, case-sensitively.
    /// A path without a dot in its final component has an empty extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let path_str = path.to_string_lossy();
        let extension = match path_str.rsplit_once('.') {
            Some((_, tail)) if !tail.chars().any(std::path::is_separator) => tail,
            _ => "",
        };

        match extension {
            "pdf" => Ok(FileType::Pdf),
            "png" => Ok(FileType::Png),
            "jpg" => Ok(FileType::Jpg),
            "gif" => Ok(FileType::Gif),
            _ => Err(Error::UnsupportedFileType {
                path: path.to_path_buf(),
                extension: extension.to_owned(),
            }),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Png => "png",
            FileType::Jpg => "jpg",
            FileType::Gif => "gif",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            FileType::Pdf => "application/pdf",
            FileType::Png => "image/png",
            FileType::Jpg => "image/jpg",
            FileType::Gif => "image/gif",
        }
    }

    pub fn data_uri_prefix(self) -> String {
        format!("data:{};base64,", self.mime_type())
    }
}

/// Convert binary data to a `data:` URI the service accepts as `base64Image`.
pub fn data_uri(file_type: FileType, data: &[u8]) -> String {
    format!("{}{}", file_type.data_uri_prefix(), BASE64_STANDARD.encode(data))
}

/// Read a local file and encode it as a data URI.
pub fn encode_file(path: &Path) -> Result<String> {
    let file_type = FileType::from_path(path)?;
    let bytes = read_file(path)?;
    Ok(data_uri(file_type, &bytes))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Error::FileAccess {
        path: path.to_path_buf(),
        source,
    })
}

pub type Fields = Vec<(&'static str, String)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// A request body ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// `application/x-www-form-urlencoded`
    Form(Fields),
    /// `multipart/form-data` with a `file` part.
    Multipart { fields: Fields, file: FilePart },
}

impl Payload {
    pub fn fields(&self) -> &[(&'static str, String)] {
        match self {
            Payload::Form(fields) | Payload::Multipart { fields, .. } => fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields()
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn file(&self) -> Option<&FilePart> {
        match self {
            Payload::Form(_) => None,
            Payload::Multipart { file, .. } => Some(file),
        }
    }
}

/// Build the body for one request. Only `Source::LocalFile` touches the disk,
/// and the file is fully read and closed before this returns.
pub fn build_payload(config: &Config, source: &Source, options: &ConversionOptions) -> Result<Payload> {
    let (source_field, file) = match source {
        Source::RemoteUrl(url) => (Some(("url", url.clone())), None),
        Source::Encoded(encoded) => (Some(("base64Image", encoded.clone())), None),
        Source::LocalFile(path) => {
            let file_type = FileType::from_path(path)?;
            let bytes = read_file(path)?;

            match options.upload {
                UploadMode::DataUri => (Some(("base64Image", data_uri(file_type, &bytes))), None),
                UploadMode::Multipart => {
                    let file_name = path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| format!("upload.{}", file_type.extension()));
                    let part = FilePart {
                        file_name,
                        mime_type: file_type.mime_type(),
                        bytes,
                    };
                    (None, Some(part))
                }
            }
        }
    };

    let mut fields = Fields::new();
    fields.extend(source_field);
    fields.push(("language", config.language().to_owned()));
    fields.push(("apikey", config.api_key().to_owned()));
    for (enabled, name) in [
        (options.overlay, "isOverlayRequired"),
        (options.hide_searchable_pdf_text_layer, "isSearchablePdfHideTextLayer"),
        (options.scale, "scale"),
    ] {
        if enabled {
            fields.push((name, "true".to_owned()));
        }
    }

    Ok(match file {
        None => Payload::Form(fields),
        Some(file) => Payload::Multipart { fields, file },
    })
}
