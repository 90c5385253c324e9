// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Annotation pipeline: enumerate photos, ask the backend for tags, merge into
//! the record file

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::backends::{self, TagBackend};
use crate::config::{AppConfig, RecordFormat};
use crate::record::AnnotationStore;
use crate::report::RunSummary;
use crate::scan::{file_name, list_images};
use crate::Result;

/// Tags every image in the photos directory, one at a time
pub struct Annotator {
    backend: Box<dyn TagBackend>,
    photos_dir: PathBuf,
    record_path: PathBuf,
    format: RecordFormat,
    extensions: Vec<String>,
    checkpoint: bool,
    prune_missing: bool,
}

impl Annotator {
    /// Create an annotator around an already-built backend
    pub fn new(config: &AppConfig, backend: Box<dyn TagBackend>) -> Self {
        Self {
            backend,
            photos_dir: config.photos_dir(),
            record_path: config.record_path(),
            format: config.annotator.format,
            extensions: config.annotator.formats.clone(),
            checkpoint: config.annotator.checkpoint,
            prune_missing: config.annotator.prune_missing,
        }
    }

    /// Create an annotator with the backend and credential named in the config
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let backend = backends::from_config(&config.annotator)?;
        Ok(Self::new(config, backend))
    }

    /// Run one batch.
    ///
    /// Per-image failures are logged and skipped, leaving that image's
    /// existing entry alone. Only a missing photos directory, an unreadable
    /// record or a failed record write end the run early.
    pub async fn run(&self) -> Result<RunSummary> {
        let images = list_images(&self.photos_dir, &self.extensions)?;
        let mut store = AnnotationStore::load(&self.record_path, self.format)?;

        info!(
            "Tagging {} image(s) in {:?} with {}",
            images.len(),
            self.photos_dir,
            self.backend.name()
        );

        let mut summary = RunSummary::new(images.len());
        let mut present = HashSet::new();

        for path in &images {
            let filename = match file_name(path) {
                Some(name) => name,
                None => {
                    summary.record_failure(&path.display().to_string(), "filename is not valid UTF-8");
                    continue;
                }
            };
            present.insert(filename.clone());

            info!("Analyzing: {}", filename);
            match self.annotate_one(path, &filename).await {
                Ok(tags) => {
                    info!("{}: {:?}", filename, tags);
                    store.insert(filename, tags);
                    summary.record_success();
                    if self.checkpoint {
                        store.save()?;
                    }
                }
                Err(e) => summary.record_failure(&filename, e),
            }
        }

        if self.prune_missing {
            let removed = store.retain(|name| present.contains(name));
            if removed > 0 {
                info!("Pruned {} record(s) for missing files", removed);
            }
        }

        store.save()?;
        info!("Wrote {} record(s) to {:?}", store.len(), store.path());
        summary.log("Tagged");

        Ok(summary)
    }

    async fn annotate_one(&self, path: &Path, filename: &str) -> Result<Vec<String>> {
        let bytes = std::fs::read(path)?;
        debug!("Read {} bytes from {}", bytes.len(), filename);
        self.backend.tags(filename, &bytes).await
    }
}
