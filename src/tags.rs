// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Turning free-text model replies into tag lists

/// Extracts an ordered tag list from a model's raw reply
pub trait TagParser: Send + Sync {
    fn parse(&self, raw: &str) -> Vec<String>;
}

/// Keeps lines that start with a marker character, e.g. `- sunset`.
///
/// Leading whitespace before the marker is ignored. Lines without the marker
/// are dropped, as are marker lines that are empty once the marker and
/// surrounding whitespace are removed. Order follows the reply.
#[derive(Debug, Clone, Copy)]
pub struct MarkerLineParser {
    marker: char,
}

impl MarkerLineParser {
    pub fn new(marker: char) -> Self {
        Self { marker }
    }
}

impl Default for MarkerLineParser {
    fn default() -> Self {
        Self::new('-')
    }
}

impl TagParser for MarkerLineParser {
    fn parse(&self, raw: &str) -> Vec<String> {
        raw.lines()
            .filter_map(|line| line.trim().strip_prefix(self.marker))
            .map(|rest| rest.trim())
            .filter(|tag| !tag.is_empty())
            .map(String::from)
            .collect()
    }
}
