use std::path::Path;

use reqwest::blocking::multipart;
use tracing::{debug, trace, warn};

use crate::apis::ocr::{parse_response, RecognitionResult};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::request::{build_payload, ConversionOptions, DocumentKind, FilePart, Fields, Payload, Source};

/// Blocking OCR.space client. Every call issues exactly one POST and blocks
/// until the response body is read; wrap calls in your own timeout if needed.
#[derive(Debug, Clone)]
pub struct OcrClient {
    config: Config,
    http: reqwest::blocking::Client,
}

impl OcrClient {
    pub fn new(config: Config) -> Self {
        Self::with_http_client(config, reqwest::blocking::Client::new())
    }

    pub fn with_http_client(config: Config, http: reqwest::blocking::Client) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Submit `source` and decode the answer. An engine-side failure comes
    /// back as [`Error::RemoteProcessing`], carrying the decoded result.
    pub fn convert(&self, source: &Source, options: &ConversionOptions) -> Result<RecognitionResult> {
        let payload = build_payload(&self.config, source, options)?;

        debug!(
            endpoint = %self.config.endpoint(),
            source = source.kind(),
            multipart = payload.file().is_some(),
            "submitting OCR request"
        );

        let request = self.http.post(self.config.endpoint().clone());
        let request = match payload {
            Payload::Form(fields) => request.form(&fields),
            Payload::Multipart { fields, file } => request.multipart(multipart_form(fields, file)?),
        };

        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;
        trace!(%status, %body, "OCR response");

        // A failed status only yields a result when the engine itself explains
        // the failure; any other body would decode to an empty success.
        if !status.is_success() {
            return match parse_response(&body) {
                Ok(result) if result.is_error() => engine_outcome(result),
                _ => Err(Error::HttpStatus { status, body }),
            };
        }

        engine_outcome(parse_response(&body)?)
    }

    pub fn convert_pdf_from_url(&self, url: &str) -> Result<RecognitionResult> {
        self.convert(
            &Source::RemoteUrl(url.to_owned()),
            &ConversionOptions::for_kind(DocumentKind::Pdf),
        )
    }

    pub fn convert_image_from_url(&self, url: &str) -> Result<RecognitionResult> {
        self.convert(
            &Source::RemoteUrl(url.to_owned()),
            &ConversionOptions::for_kind(DocumentKind::Image),
        )
    }

    pub fn convert_pdf_from_local(&self, path: impl AsRef<Path>) -> Result<RecognitionResult> {
        self.convert(
            &Source::LocalFile(path.as_ref().to_path_buf()),
            &ConversionOptions::for_kind(DocumentKind::Pdf),
        )
    }

    pub fn convert_image_from_local(&self, path: impl AsRef<Path>) -> Result<RecognitionResult> {
        self.convert(
            &Source::LocalFile(path.as_ref().to_path_buf()),
            &ConversionOptions::for_kind(DocumentKind::Image),
        )
    }

    /// `encoded` must already be a `data:<mime>;base64,...` string.
    pub fn convert_encoded(&self, encoded: impl Into<String>) -> Result<RecognitionResult> {
        self.convert(&Source::Encoded(encoded.into()), &ConversionOptions::document())
    }
}

fn engine_outcome(result: RecognitionResult) -> Result<RecognitionResult> {
    if result.is_error() {
        warn!(
            exit_code = result.exit_code,
            message = %result.combined_text(),
            "OCR engine reported an error"
        );
    }

    result.ensure_success()
}

fn multipart_form(fields: Fields, file: FilePart) -> Result<multipart::Form> {
    let part = multipart::Part::bytes(file.bytes)
        .file_name(file.file_name)
        .mime_str(file.mime_type)
        .map_err(Error::Multipart)?;

    let form = fields
        .into_iter()
        .fold(multipart::Form::new(), |form, (name, value)| form.text(name, value));

    Ok(form.part("file", part))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::request::{FileType, UploadMode};

    fn config_for(server: &MockServer) -> Config {
        Config::new("test-key", "eng")
            .unwrap()
            .with_endpoint(&format!("{}/parse/image", server.uri()))
            .unwrap()
    }

    // The blocking client must be built, used and dropped off the async runtime
    // that drives the mock server.
    async fn with_client<T, F>(config: Config, f: F) -> T
    where
        T: Send + 'static,
        F: FnOnce(&OcrClient) -> T + Send + 'static,
    {
        tokio::task::spawn_blocking(move || f(&OcrClient::new(config)))
            .await
            .unwrap()
    }

    fn success_body(pages: &[&str]) -> serde_json::Value {
        let results: Vec<_> = pages
            .iter()
            .map(|text| {
                json!({
                    "TextOrientation": "0",
                    "FileParseExitCode": 1,
                    "ParsedText": text,
                    "ErrorMessage": "",
                    "ErrorDetails": ""
                })
            })
            .collect();

        json!({
            "ParsedResults": results,
            "OCRExitCode": 1,
            "IsErroredOnProcessing": false,
            "ProcessingTimeInMilliseconds": "120"
        })
    }

    #[tokio::test]
    async fn pdf_url_sends_form_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/parse/image"))
            .and(body_string_contains("language=eng"))
            .and(body_string_contains("apikey=test-key"))
            .and(body_string_contains("isOverlayRequired=true"))
            .and(body_string_contains("url=https%3A%2F%2Fexample.com%2Fscan.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body(&["A", "B", "C"])))
            .expect(1)
            .mount(&server)
            .await;

        let result = with_client(config_for(&server), |client| {
            client.convert_pdf_from_url("https://example.com/scan.pdf")
        })
        .await
        .unwrap();

        assert_eq!(result.documents.len(), 3);
        assert_eq!(result.combined_text(), "ABC");
        assert_eq!(result.processing_time_ms, "120");
    }

    #[tokio::test]
    async fn image_url_omits_overlay_flags() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/parse/image"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body(&["hi"])))
            .mount(&server)
            .await;

        let result = with_client(config_for(&server), |client| {
            client.convert_image_from_url("https://example.com/a.png")
        })
        .await
        .unwrap();
        assert_eq!(result.combined_text(), "hi");

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8(requests[0].body.clone()).unwrap();
        assert!(body.contains("language=eng"));
        assert!(!body.contains("isOverlayRequired"));
        assert!(!body.contains("scale"));
    }

    #[tokio::test]
    async fn multipart_upload_sends_file_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/parse/image"))
            .and(body_string_contains("name=\"file\""))
            .and(body_string_contains("fake png contents"))
            .and(body_string_contains("test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body(&["from upload"])))
            .expect(1)
            .mount(&server)
            .await;

        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"fake png contents").unwrap();
        let path = file.path().to_path_buf();

        let result = with_client(config_for(&server), move |client| {
            let options = ConversionOptions::image().with_upload(UploadMode::Multipart);
            client.convert(&Source::LocalFile(path), &options)
        })
        .await
        .unwrap();

        assert_eq!(result.combined_text(), "from upload");
    }

    #[tokio::test]
    async fn remote_error_is_typed_and_keeps_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "OCRExitCode": 99,
                "IsErroredOnProcessing": true,
                "ErrorMessage": ["bad file", "too large"],
                "ErrorDetails": ""
            })))
            .mount(&server)
            .await;

        let err = with_client(config_for(&server), |client| {
            client.convert_encoded("data:image/png;base64,AAAA")
        })
        .await
        .unwrap_err();

        match &err {
            Error::RemoteProcessing { exit_code, message, .. } => {
                assert_eq!(*exit_code, 99);
                assert_eq!(message, "bad filetoo large");
            }
            other => panic!("expected remote processing error, got {:?}", other),
        }
        assert!(err.remote_result().unwrap().is_error());
    }

    #[tokio::test]
    async fn non_json_error_status_is_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("The API key is invalid"))
            .mount(&server)
            .await;

        let err = with_client(config_for(&server), |client| {
            client.convert_image_from_url("https://example.com/a.png")
        })
        .await
        .unwrap_err();

        match err {
            Error::HttpStatus { status, body } => {
                assert_eq!(status.as_u16(), 403);
                assert_eq!(body, "The API key is invalid");
            }
            other => panic!("expected http status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn error_status_with_json_body_is_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"Message": "An error has occurred."})),
            )
            .mount(&server)
            .await;

        let err = with_client(config_for(&server), |client| {
            client.convert_image_from_url("https://example.com/a.png")
        })
        .await
        .unwrap_err();

        match err {
            Error::HttpStatus { status, body } => {
                assert_eq!(status.as_u16(), 500);
                assert!(body.contains("An error has occurred."));
            }
            other => panic!("expected http status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn error_status_with_engine_error_keeps_diagnostics() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "OCRExitCode": 99,
                "IsErroredOnProcessing": true,
                "ErrorMessage": ["File failed validation"]
            })))
            .mount(&server)
            .await;

        let err = with_client(config_for(&server), |client| {
            client.convert_pdf_from_url("https://example.com/scan.pdf")
        })
        .await
        .unwrap_err();

        match &err {
            Error::RemoteProcessing { exit_code, message, .. } => {
                assert_eq!(*exit_code, 99);
                assert_eq!(message, "File failed validation");
            }
            other => panic!("expected remote processing error, got {:?}", other),
        }
    }

    #[test]
    fn bad_part_mime_is_multipart_error() {
        let file = FilePart {
            file_name: "scan.pdf".to_owned(),
            mime_type: "not a mime",
            bytes: b"%PDF".to_vec(),
        };

        let err = multipart_form(Fields::new(), file).unwrap_err();
        assert!(matches!(err, Error::Multipart(_)));
    }

    #[test]
    fn file_type_mimes_build_multipart_parts() {
        for file_type in [FileType::Pdf, FileType::Png, FileType::Jpg, FileType::Gif] {
            let file = FilePart {
                file_name: format!("upload.{}", file_type.extension()),
                mime_type: file_type.mime_type(),
                bytes: vec![1, 2, 3],
            };
            assert!(multipart_form(vec![("apikey", "k".to_owned())], file).is_ok());
        }
    }

    #[tokio::test]
    async fn non_json_success_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = with_client(config_for(&server), |client| {
            client.convert_image_from_url("https://example.com/a.png")
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Decode { ref body, .. } if body == "not json"));
    }

    #[test]
    fn local_file_errors_happen_before_any_request() {
        // Nothing listens here; reaching the network would be a transport error instead.
        let config = Config::new("test-key", "eng")
            .unwrap()
            .with_endpoint("http://127.0.0.1:9/parse/image")
            .unwrap();
        let client = OcrClient::new(config);

        let err = client.convert_pdf_from_local("/definitely/not/here.pdf").unwrap_err();
        assert!(err.is_file_not_found());

        let err = client.convert_image_from_local("notes.txt").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType { .. }));
    }

    #[test]
    fn unreachable_endpoint_is_transport_error() {
        let config = Config::new("test-key", "eng")
            .unwrap()
            .with_endpoint("http://127.0.0.1:9/parse/image")
            .unwrap();
        let client = OcrClient::new(config);

        let err = client.convert_image_from_url("https://example.com/a.png").unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
