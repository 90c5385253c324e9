// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! phototag: batch photo tagging and thumbnail generation
//!
//! Two one-shot pipelines over a photos directory: the annotator asks a cloud
//! vision model for descriptive tags and merges them into a JSON record, and
//! the thumbnailer writes bounded, aspect-preserving copies of every photo.

pub mod annotator;
pub mod backends;
pub mod config;
pub mod error;
pub mod persist;
pub mod record;
pub mod report;
pub mod scan;
pub mod tags;
pub mod thumbnail;

pub use annotator::Annotator;
pub use config::AppConfig;
pub use error::{PhototagError, Result};
pub use thumbnail::Thumbnailer;
