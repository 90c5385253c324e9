// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Cloud Vision label detection backend: structured labels, no parsing needed

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{read_json, ApiError, TagBackend, API_KEY_HEADER};
use crate::config::VisionConfig;
use crate::{PhototagError, Result};

pub struct VisionBackend {
    client: Client,
    base_url: String,
    max_results: u32,
    api_key: String,
}

#[derive(Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Serialize)]
struct ImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "maxResults")]
    max_results: u32,
}

#[derive(Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(rename = "labelAnnotations", default)]
    label_annotations: Vec<Label>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Label {
    description: String,
}

impl VisionBackend {
    pub fn new(config: &VisionConfig, api_key: String, client: Client) -> Self {
        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/images:annotate", self.base_url)
    }

    fn build_request(&self, image: &[u8]) -> AnnotateRequest {
        AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: general_purpose::STANDARD.encode(image),
                },
                features: vec![Feature {
                    kind: "LABEL_DETECTION",
                    max_results: self.max_results,
                }],
            }],
        }
    }
}

#[async_trait]
impl TagBackend for VisionBackend {
    fn name(&self) -> &'static str {
        "vision"
    }

    async fn tags(&self, filename: &str, image: &[u8]) -> Result<Vec<String>> {
        debug!("Sending {} to Cloud Vision label detection", filename);

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&self.build_request(image))
            .send()
            .await?;

        labels(read_json(response).await?)
    }
}

fn labels(response: AnnotateResponse) -> Result<Vec<String>> {
    if let Some(error) = response.error {
        return Err(error.into_error());
    }

    let image = response
        .responses
        .into_iter()
        .next()
        .ok_or_else(|| PhototagError::Provider("no annotation result returned".to_string()))?;

    if let Some(error) = image.error {
        return Err(error.into_error());
    }

    Ok(image
        .label_annotations
        .into_iter()
        .map(|l| l.description)
        .collect())
}
