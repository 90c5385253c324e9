// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Gemini `generateContent` backend: image + prompt in, free text out

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{mime_type, read_json, ApiError, TagBackend, API_KEY_HEADER};
use crate::config::GeminiConfig;
use crate::tags::{MarkerLineParser, TagParser};
use crate::{PhototagError, Result};

/// Generative-model backend; tags come from parsing the model's reply
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    model: String,
    prompt: String,
    api_key: String,
    parser: Box<dyn TagParser>,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text { text: String },
    Image { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback", default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

impl GeminiBackend {
    /// Create a backend using the marker-line parser from the config
    pub fn new(config: &GeminiConfig, api_key: String, client: Client) -> Self {
        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            prompt: config.prompt.clone(),
            api_key,
            parser: Box::new(MarkerLineParser::new(config.marker)),
        }
    }

    /// Swap the reply parser
    pub fn with_parser(mut self, parser: Box<dyn TagParser>) -> Self {
        self.parser = parser;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request(&self, filename: &str, image: &[u8]) -> Result<GenerateRequest> {
        let (mime, bytes) = prepare_image(filename, image)?;
        Ok(GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart::Text {
                        text: self.prompt.clone(),
                    },
                    RequestPart::Image {
                        inline_data: InlineData {
                            mime_type: mime.to_string(),
                            data: general_purpose::STANDARD.encode(&bytes),
                        },
                    },
                ],
            }],
        })
    }

    /// Ask the model about one image and return its raw reply
    pub async fn describe(&self, filename: &str, image: &[u8]) -> Result<String> {
        let request = self.build_request(filename, image)?;

        debug!("Sending {} to Gemini: model={}", filename, self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;

        reply_text(read_json(response).await?)
    }
}

#[async_trait]
impl TagBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn tags(&self, filename: &str, image: &[u8]) -> Result<Vec<String>> {
        let reply = self.describe(filename, image).await?;
        let tags = self.parser.parse(&reply);
        if tags.is_empty() {
            debug!("No tag lines in reply for {}: {:?}", filename, reply);
        }
        Ok(tags)
    }
}

/// Formats the model does not take inline are re-encoded as PNG first
fn prepare_image(filename: &str, image: &[u8]) -> Result<(&'static str, Vec<u8>)> {
    match mime_type(filename) {
        mime @ ("image/png" | "image/jpeg" | "image/webp") => Ok((mime, image.to_vec())),
        _ => {
            let decoded = image::load_from_memory(image)?;
            let mut buffer = Vec::new();
            decoded.write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)?;
            Ok(("image/png", buffer))
        }
    }
}

/// Pull the reply text out of a response, surfacing provider errors
fn reply_text(response: GenerateResponse) -> Result<String> {
    if let Some(error) = response.error {
        return Err(error.into_error());
    }

    let candidate = match response.candidates.into_iter().next() {
        Some(c) => c,
        None => {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(PhototagError::Provider(format!("empty reply: {}", reason)));
        }
    };

    let text = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    Ok(text)
}
