// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Whole-file writes that never leave a half-written target behind

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::Result;

/// Write `contents` to `path` through a temporary file in the same directory,
/// then rename it over the target. On error the target is left untouched.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;

    Ok(())
}
