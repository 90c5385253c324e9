// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Thumbnail generation: bounded, aspect-preserving downscale of every photo

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::persist::write_atomic;
use crate::report::RunSummary;
use crate::scan::{file_name, list_images};
use crate::Result;

/// Writes `<prefix><filename>` thumbnails into the thumbnails directory
pub struct Thumbnailer {
    photos_dir: PathBuf,
    output_dir: PathBuf,
    prefix: String,
    max_width: u32,
    max_height: u32,
    jpeg_quality: u8,
    extensions: Vec<String>,
}

impl Thumbnailer {
    pub fn new(config: &AppConfig) -> Self {
        let thumbs = &config.thumbnails;
        Self {
            photos_dir: config.photos_dir(),
            output_dir: config.thumbnails_dir(),
            prefix: thumbs.prefix.clone(),
            max_width: thumbs.max_width,
            max_height: thumbs.max_height,
            jpeg_quality: thumbs.jpeg_quality,
            extensions: thumbs.formats.clone(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Destination for a source filename
    pub fn output_path(&self, filename: &str) -> PathBuf {
        self.output_dir.join(format!("{}{}", self.prefix, filename))
    }

    /// Regenerate every thumbnail. Failures on single images are logged and
    /// skipped; a missing photos directory aborts.
    pub fn run(&self) -> Result<RunSummary> {
        let images = list_images(&self.photos_dir, &self.extensions)?;
        std::fs::create_dir_all(&self.output_dir)?;

        if images.is_empty() {
            info!("No images found in {:?}", self.photos_dir);
            return Ok(RunSummary::new(0));
        }

        info!("Generating thumbnails for {} image(s)...", images.len());

        let mut summary = RunSummary::new(images.len());
        for path in &images {
            let filename = match file_name(path) {
                Some(name) => name,
                None => {
                    summary.record_failure(&path.display().to_string(), "filename is not valid UTF-8");
                    continue;
                }
            };

            match self.create_thumbnail(path, &filename) {
                Ok(dest) => {
                    info!("Created thumbnail: {:?}", dest);
                    summary.record_success();
                }
                Err(e) => summary.record_failure(&filename, e),
            }
        }

        summary.log("Created thumbnails for");
        info!("Thumbnails written to {:?}", self.output_dir);
        Ok(summary)
    }

    /// Build one thumbnail. Nothing is written unless encoding succeeds.
    pub fn create_thumbnail(&self, source: &Path, filename: &str) -> Result<PathBuf> {
        let format = ImageFormat::from_path(source)?;
        let img = image::open(source)?;

        let (width, height) = img.dimensions();
        let (new_width, new_height) = fit_within(width, height, self.max_width, self.max_height);
        debug!("{}: {}x{} -> {}x{}", filename, width, height, new_width, new_height);

        let thumb = if (new_width, new_height) == (width, height) {
            img
        } else {
            img.resize_exact(new_width, new_height, FilterType::Lanczos3)
        };

        let bytes = encode(&thumb, format, self.jpeg_quality)?;
        let dest = self.output_path(filename);
        write_atomic(&dest, &bytes)?;

        Ok(dest)
    }
}

/// Largest size within `max_width`×`max_height` with the source's aspect
/// ratio. Never enlarges; never returns a zero dimension.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let new_width = ((width as f64 * scale).round() as u32).clamp(1, max_width);
    let new_height = ((height as f64 * scale).round() as u32).clamp(1, max_height);

    (new_width, new_height)
}

/// Encode in the source's format; JPEG at the given quality, PNG at best
/// compression
fn encode(img: &DynamicImage, format: ImageFormat, jpeg_quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();

    match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality);
            img.to_rgb8().write_with_encoder(encoder)?;
        }
        ImageFormat::Png => {
            let encoder =
                PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, PngFilter::Adaptive);
            img.write_with_encoder(encoder)?;
        }
        other => {
            DynamicImage::ImageRgba8(img.to_rgba8())
                .write_to(&mut std::io::Cursor::new(&mut buffer), other)?;
        }
    }

    Ok(buffer)
}
