// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for phototag

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{PhototagError, Result};

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Directory holding the source photographs
    #[serde(default = "default_photos_dir")]
    pub photos_dir: String,

    /// Tagging settings
    #[serde(default)]
    pub annotator: AnnotatorConfig,

    /// Thumbnail settings
    #[serde(default)]
    pub thumbnails: ThumbnailConfig,
}

/// Which provider produces the tags
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Generative model answering a prompt in free text
    Gemini,
    /// Label detection returning structured labels
    Vision,
}

/// On-disk shape of the annotation record
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// `{ "a.jpg": { "filename": "a.jpg", "tags": [..] } }`
    #[default]
    Nested,
    /// `{ "a.jpg": [..] }`, the shape written by the label-detection script
    Flat,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AnnotatorConfig {
    #[serde(default = "default_backend")]
    pub backend: BackendKind,

    /// Record file; defaults to `images.json` inside the photos directory
    #[serde(default)]
    pub record_path: Option<String>,

    #[serde(default)]
    pub format: RecordFormat,

    /// Extensions considered images (case-insensitive)
    #[serde(default = "default_annotator_formats")]
    pub formats: Vec<String>,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout; provider defaults apply when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Rewrite the record after every tagged image
    #[serde(default)]
    pub checkpoint: bool,

    /// Drop entries for files no longer in the photos directory
    #[serde(default)]
    pub prune_missing: bool,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub vision: VisionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_url")]
    pub url: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_prompt")]
    pub prompt: String,
    /// Leading character that marks a tag line in the reply
    #[serde(default = "default_marker")]
    pub marker: char,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VisionConfig {
    #[serde(default = "default_vision_url")]
    pub url: String,
    #[serde(default = "default_max_labels")]
    pub max_results: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ThumbnailConfig {
    /// Output directory, relative to the photos directory
    #[serde(default = "default_thumb_dir")]
    pub dir: String,
    #[serde(default = "default_thumb_prefix")]
    pub prefix: String,
    #[serde(default = "default_thumb_size")]
    pub max_width: u32,
    #[serde(default = "default_thumb_size")]
    pub max_height: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_thumb_formats")]
    pub formats: Vec<String>,
}

// Default value functions
fn default_photos_dir() -> String { "photos".to_string() }
fn default_backend() -> BackendKind { BackendKind::Gemini }
fn default_api_key_env() -> String { "PHOTOTAG_API_KEY".to_string() }
fn default_gemini_url() -> String { "https://generativelanguage.googleapis.com/v1beta".to_string() }
fn default_gemini_model() -> String { "gemini-1.5-flash".to_string() }
fn default_marker() -> char { '-' }
fn default_vision_url() -> String { "https://vision.googleapis.com/v1".to_string() }
fn default_max_labels() -> u32 { 10 }
fn default_thumb_dir() -> String { "thumbnails".to_string() }
fn default_thumb_prefix() -> String { "thumb_".to_string() }
fn default_thumb_size() -> u32 { 300 }
fn default_jpeg_quality() -> u8 { 85 }

fn default_gemini_prompt() -> String {
    "Look at this photograph and list between 5 and 10 short descriptive tags \
     (subjects, setting, colors, mood). Write one tag per line and start every \
     line with '- '. Return ONLY the list.".to_string()
}

fn default_annotator_formats() -> Vec<String> {
    ["png", "jpg", "jpeg", "gif", "bmp"].into_iter().map(String::from).collect()
}

fn default_thumb_formats() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif"].into_iter().map(String::from).collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            photos_dir: default_photos_dir(),
            annotator: AnnotatorConfig::default(),
            thumbnails: ThumbnailConfig::default(),
        }
    }
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            record_path: None,
            format: RecordFormat::default(),
            formats: default_annotator_formats(),
            api_key_env: default_api_key_env(),
            timeout_secs: None,
            checkpoint: false,
            prune_missing: false,
            gemini: GeminiConfig::default(),
            vision: VisionConfig::default(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            url: default_gemini_url(),
            model: default_gemini_model(),
            prompt: default_gemini_prompt(),
            marker: default_marker(),
        }
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            url: default_vision_url(),
            max_results: default_max_labels(),
        }
    }
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            dir: default_thumb_dir(),
            prefix: default_thumb_prefix(),
            max_width: default_thumb_size(),
            max_height: default_thumb_size(),
            jpeg_quality: default_jpeg_quality(),
            formats: default_thumb_formats(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str::<Self>(&content)
                .map_err(|e| PhototagError::Config(format!("Failed to parse config: {}", e)))?
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipelines cannot work with
    pub fn validate(&self) -> Result<()> {
        let thumbs = &self.thumbnails;
        if thumbs.max_width == 0 || thumbs.max_height == 0 {
            return Err(PhototagError::Config(
                "thumbnail bounds must be at least 1x1".to_string(),
            ));
        }
        if !(1..=100).contains(&thumbs.jpeg_quality) {
            return Err(PhototagError::Config(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                thumbs.jpeg_quality
            )));
        }
        if thumbs.dir.trim().is_empty() {
            return Err(PhototagError::Config("thumbnail dir must not be empty".to_string()));
        }
        if self.annotator.gemini.marker.is_whitespace() {
            return Err(PhototagError::Config("tag marker must not be whitespace".to_string()));
        }
        Ok(())
    }

    pub fn photos_dir(&self) -> PathBuf {
        PathBuf::from(&self.photos_dir)
    }

    /// Where the annotation record lives
    pub fn record_path(&self) -> PathBuf {
        match &self.annotator.record_path {
            Some(path) => PathBuf::from(path),
            None => self.photos_dir().join("images.json"),
        }
    }

    pub fn thumbnails_dir(&self) -> PathBuf {
        self.photos_dir().join(&self.thumbnails.dir)
    }
}

impl AnnotatorConfig {
    /// Read the provider API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(PhototagError::MissingCredential(self.api_key_env.clone())),
        }
    }
}
