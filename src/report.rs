// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Per-run outcome counters shared by both pipelines

use serde::Serialize;
use std::fmt::Display;
use tracing::{info, warn};

/// A file that was skipped, with the reason
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Failure {
    pub filename: String,
    pub error: String,
}

/// What happened during one batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub found: usize,
    pub succeeded: usize,
    pub failures: Vec<Failure>,
}

impl RunSummary {
    pub fn new(found: usize) -> Self {
        Self {
            found,
            ..Self::default()
        }
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    /// Log and remember a skipped file
    pub fn record_failure(&mut self, filename: &str, error: impl Display) {
        let error = error.to_string();
        warn!("Skipping {}: {}", filename, error);
        self.failures.push(Failure {
            filename: filename.to_string(),
            error,
        });
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Emit the end-of-run line
    pub fn log(&self, action: &str) {
        info!(
            "{} {} of {} image(s), {} failed",
            action,
            self.succeeded,
            self.found,
            self.failed()
        );
    }
}
