//! OCR service client.
//!
//! One REST round trip per recognition: the captured region is uploaded as
//! a multipart `file` part with the API key in a header, and the service
//! answers with JSON carrying the parsed text or an error flag.

use crate::config::Config;
use crate::error::{AppError, Result};
use serde::Deserialize;

/// Recognition capability injected into the orchestrator.
///
/// Implementations are called from a dedicated worker thread and may block;
/// the orchestrator never invokes this from the input or render paths.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, png: &[u8], filename: &str, mime: &str) -> Result<String>;
}

/// HTTP client for the OCR endpoint.
pub struct OcrClient {
    endpoint: url::Url,
    api_key: String,
    client: reqwest::Client,
}

impl OcrClient {
    pub fn new(config: &Config) -> Result<Self> {
        let endpoint = url::Url::parse(&config.ocr_endpoint)
            .map_err(|e| AppError::Config(format!("Invalid OCR endpoint: {}", e)))?;

        if config.ocr_api_key.is_empty() {
            return Err(AppError::MissingEnvVar("OCR_API_KEY".to_string()));
        }

        Ok(Self {
            endpoint,
            api_key: config.ocr_api_key.clone(),
            client: reqwest::Client::new(),
        })
    }

    /// Uploads one image and returns the recognized text.
    pub async fn submit(&self, png: Vec<u8>, filename: &str, mime: &str) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(png)
            .file_name(filename.to_string())
            .mime_str(mime)
            .map_err(|e| AppError::ocr(format!("Invalid mime type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        log::info!("submitting {} to OCR service", filename);

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("apikey", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::ocr(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AppError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("OCR service returned {}: {}", status, body);
            return Err(AppError::ocr(format!("Service returned {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::ocr(format!("Failed to read response: {}", e)))?;

        parse_response(&body)
    }
}

impl TextRecognizer for OcrClient {
    fn recognize(&self, png: &[u8], filename: &str, mime: &str) -> Result<String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AppError::ocr(format!("Failed to create async runtime: {}", e)))?;

        runtime.block_on(self.submit(png.to_vec(), filename, mime))
    }
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(rename = "ParsedResults", default)]
    parsed_results: Vec<ParsedResult>,
    #[serde(rename = "IsErroredOnProcessing", default)]
    is_errored_on_processing: bool,
    #[serde(rename = "ErrorMessage", default)]
    error_message: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ParsedResult {
    #[serde(rename = "ParsedText", default)]
    parsed_text: String,
}

/// Extracts the recognized text from a service response body.
fn parse_response(body: &str) -> Result<String> {
    let response: OcrResponse = serde_json::from_str(body)?;

    if response.is_errored_on_processing {
        return Err(AppError::ocr(error_text(&response.error_message)));
    }

    let text = response
        .parsed_results
        .iter()
        .map(|r| r.parsed_text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string();

    if text.is_empty() {
        return Err(AppError::ocr("No text recognized"));
    }

    Ok(text)
}

/// The error field comes back as a string or a list of strings.
fn error_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        _ => "Processing failed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_successful_response() {
        let body = r#"{
            "ParsedResults": [{"ParsedText": "HELLO\r\n"}],
            "IsErroredOnProcessing": false,
            "ErrorMessage": null
        }"#;
        assert_eq!(parse_response(body).unwrap(), "HELLO");
    }

    #[test]
    fn joins_multiple_result_pages() {
        let body = r#"{
            "ParsedResults": [{"ParsedText": "one"}, {"ParsedText": "two"}],
            "IsErroredOnProcessing": false
        }"#;
        assert_eq!(parse_response(body).unwrap(), "one\ntwo");
    }

    #[test]
    fn errored_processing_is_an_error() {
        let body = r#"{
            "ParsedResults": [],
            "IsErroredOnProcessing": true,
            "ErrorMessage": ["Unable to parse image"]
        }"#;
        let err = parse_response(body).unwrap_err();
        assert!(err.to_string().contains("Unable to parse image"));
    }

    #[test]
    fn empty_results_are_an_error() {
        let body = r#"{"ParsedResults": [], "IsErroredOnProcessing": false}"#;
        assert!(parse_response(body).is_err());
    }
}
