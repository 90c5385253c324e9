// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Tag providers: the external services that look at an image and return tags

pub mod gemini;
pub mod vision;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::{AnnotatorConfig, BackendKind};
use crate::{PhototagError, Result};

/// Header carrying the API key, so it never appears in URLs or error text
pub(crate) const API_KEY_HEADER: &str = "x-goog-api-key";

/// A service that turns image bytes into an ordered list of tags
#[async_trait]
pub trait TagBackend: Send + Sync {
    /// Name of this backend
    fn name(&self) -> &'static str;

    /// Produce tags for one image
    async fn tags(&self, filename: &str, image: &[u8]) -> Result<Vec<String>>;
}

/// Build the backend selected in the configuration
pub fn from_config(config: &AnnotatorConfig) -> Result<Box<dyn TagBackend>> {
    let api_key = config.api_key()?;
    let client = http_client(config.timeout_secs)?;

    let backend: Box<dyn TagBackend> = match config.backend {
        BackendKind::Gemini => Box::new(gemini::GeminiBackend::new(&config.gemini, api_key, client)),
        BackendKind::Vision => Box::new(vision::VisionBackend::new(&config.vision, api_key, client)),
    };

    debug!("Using tag backend: {}", backend.name());
    Ok(backend)
}

fn http_client(timeout_secs: Option<u64>) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// Error object returned by Google APIs, at top level or per image
#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl ApiError {
    pub(crate) fn into_error(self) -> PhototagError {
        let mut text = self.message;
        if let Some(status) = self.status {
            text = format!("{} ({})", text, status);
        }
        if let Some(code) = self.code {
            text = format!("[{}] {}", code, text);
        }
        PhototagError::Provider(text)
    }
}

/// Body shape of a failed call; only the error object matters
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<ApiError>,
}

/// Read and decode a response body
pub(crate) async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    decode_body(status, &body)
}

/// Success bodies decode as `T`. Any other status is an error: the
/// provider's own error object when the body carries one, else the status.
fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T> {
    if !status.is_success() {
        return match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody { error: Some(error) }) => Err(error.into_error()),
            _ => Err(PhototagError::Provider(format!(
                "provider returned status {}",
                status
            ))),
        };
    }

    serde_json::from_str::<T>(body)
        .map_err(|e| PhototagError::Provider(format!("undecodable response: {}", e)))
}

/// MIME type for an image filename, by extension
pub fn mime_type(filename: &str) -> &'static str {
    let ext = filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type() {
        assert_eq!(mime_type("a.JPG"), "image/jpeg");
        assert_eq!(mime_type("b.jpeg"), "image/jpeg");
        assert_eq!(mime_type("c.Png"), "image/png");
        assert_eq!(mime_type("d.gif"), "image/gif");
        assert_eq!(mime_type("e.bmp"), "image/bmp");
        assert_eq!(mime_type("noext"), "application/octet-stream");
    }

    #[test]
    fn test_api_error_message() {
        let err: ApiError = serde_json::from_str(
            r#"{ "code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED" }"#,
        )
        .unwrap();
        let text = err.into_error().to_string();
        assert_eq!(text, "Provider error: [403] API key not valid (PERMISSION_DENIED)");
    }

    #[test]
    fn test_from_config_requires_credential() {
        let mut config = AnnotatorConfig::default();
        config.api_key_env = "PHOTOTAG_TEST_BACKEND_KEY_ABSENT".to_string();
        std::env::remove_var("PHOTOTAG_TEST_BACKEND_KEY_ABSENT");

        assert!(matches!(
            from_config(&config),
            Err(PhototagError::MissingCredential(_))
        ));
    }

    #[test]
    fn test_from_config_selects_backend() {
        let mut config = AnnotatorConfig::default();
        config.api_key_env = "PHOTOTAG_TEST_BACKEND_KEY_SET".to_string();
        std::env::set_var("PHOTOTAG_TEST_BACKEND_KEY_SET", "k");

        config.backend = BackendKind::Gemini;
        assert_eq!(from_config(&config).unwrap().name(), "gemini");

        config.backend = BackendKind::Vision;
        config.timeout_secs = Some(30);
        assert_eq!(from_config(&config).unwrap().name(), "vision");
    }

    #[test]
    fn test_failed_status_keeps_status_when_body_has_no_error() {
        let err = decode_body::<serde_json::Value>(StatusCode::SERVICE_UNAVAILABLE, "{}").unwrap_err();
        assert!(err.to_string().contains("provider returned status 503"));

        let err = decode_body::<serde_json::Value>(
            StatusCode::FORBIDDEN,
            r#"{ "error": { "code": 403, "message": "denied" } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("[403] denied"));

        assert!(decode_body::<serde_json::Value>(StatusCode::OK, "{}").is_ok());
    }

    mod http {
        use super::super::gemini::GeminiBackend;
        use super::super::vision::VisionBackend;
        use super::super::TagBackend;
        use crate::config::{GeminiConfig, VisionConfig};
        use crate::PhototagError;
        use reqwest::Client;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};
        use tokio::task::JoinHandle;

        /// Answer a single request with a canned response; the handle yields
        /// the raw request as received
        async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = format!("http://{}/v1", listener.local_addr().unwrap());
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );

            let handle = tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let request = read_request(&mut socket).await;
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
                request
            });

            (url, handle)
        }

        /// Read headers plus a Content-Length body
        async fn read_request(socket: &mut TcpStream) -> String {
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);

                let text = String::from_utf8_lossy(&buf);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .filter_map(|line| line.split_once(':'))
                        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            String::from_utf8_lossy(&buf).into_owned()
        }

        fn vision(url: String) -> VisionBackend {
            let config = VisionConfig {
                url,
                max_results: 5,
            };
            VisionBackend::new(&config, "secret".to_string(), Client::new())
        }

        fn gemini(url: String) -> GeminiBackend {
            let config = GeminiConfig {
                url,
                ..GeminiConfig::default()
            };
            GeminiBackend::new(&config, "secret".to_string(), Client::new())
        }

        #[tokio::test]
        async fn test_vision_labels_and_key_header() {
            let (url, server) = serve_once(
                "200 OK",
                r#"{ "responses": [ { "labelAnnotations": [
                    { "description": "Sky" }, { "description": "Cloud" }
                ] } ] }"#,
            )
            .await;

            let tags = vision(url).tags("a.jpg", b"bytes").await.unwrap();
            assert_eq!(tags, vec!["Sky", "Cloud"]);

            let request = server.await.unwrap().to_ascii_lowercase();
            assert!(request.starts_with("post /v1/images:annotate "));
            assert!(request.contains("x-goog-api-key: secret"));
            assert!(!request.contains("key=secret"));
        }

        #[tokio::test]
        async fn test_server_error_with_html_body() {
            let (url, _server) =
                serve_once("500 Internal Server Error", "<html>oops</html>").await;

            let err = vision(url).tags("a.jpg", b"bytes").await.unwrap_err();
            assert!(matches!(err, PhototagError::Provider(_)));
            assert!(err.to_string().contains("provider returned status 500"));
        }

        #[tokio::test]
        async fn test_error_object_on_forbidden() {
            let (url, _server) = serve_once(
                "403 Forbidden",
                r#"{ "error": { "code": 403, "message": "denied", "status": "PERMISSION_DENIED" } }"#,
            )
            .await;

            let err = vision(url).tags("a.jpg", b"bytes").await.unwrap_err();
            assert!(err.to_string().contains("[403] denied"));
        }

        #[tokio::test]
        async fn test_gemini_reply_becomes_tags() {
            let (url, server) = serve_once(
                "200 OK",
                r#"{ "candidates": [ { "content": { "parts": [
                    { "text": "Tags:\n- harbor\n- boats\n" }
                ] } } ] }"#,
            )
            .await;

            let tags = gemini(url).tags("a.png", b"bytes").await.unwrap();
            assert_eq!(tags, vec!["harbor", "boats"]);

            let request = server.await.unwrap().to_ascii_lowercase();
            assert!(request.starts_with("post /v1/models/gemini-1.5-flash:generatecontent "));
            assert!(request.contains("x-goog-api-key: secret"));
        }

        #[tokio::test]
        async fn test_gemini_unavailable_with_empty_object() {
            let (url, _server) = serve_once("503 Service Unavailable", "{}").await;

            let err = gemini(url).tags("a.png", b"bytes").await.unwrap_err();
            assert!(err.to_string().contains("provider returned status 503"));
        }

        #[tokio::test]
        async fn test_undecodable_success_body() {
            let (url, _server) = serve_once("200 OK", "not json at all").await;

            let err = gemini(url).tags("a.png", b"bytes").await.unwrap_err();
            assert!(err.to_string().contains("undecodable response"));
        }

        #[tokio::test]
        async fn test_refused_connection_is_transport_error() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = format!("http://{}/v1", listener.local_addr().unwrap());
            drop(listener);

            let err = vision(url).tags("a.jpg", b"bytes").await.unwrap_err();
            assert!(matches!(err, PhototagError::Api(_)));
        }
    }
}
