// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Image enumeration for the photos directory

use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{PhototagError, Result};

/// List the files directly inside `dir` whose extension is in `extensions`.
///
/// Matching is case-insensitive and each file appears once, sorted by path,
/// however many extension patterns it matches. Subdirectories are never
/// descended into. A missing directory is an error.
pub fn list_images(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PhototagError::DirectoryNotFound(dir.display().to_string()));
    }

    let dir_str = dir.to_str().ok_or_else(|| {
        PhototagError::Config(format!("Photos directory is not valid UTF-8: {:?}", dir))
    })?;
    let base = Pattern::escape(dir_str);

    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut found = BTreeSet::new();
    for ext in extensions {
        let ext = ext.trim().trim_start_matches('.');
        if ext.is_empty() {
            continue;
        }
        let pattern = format!("{}/*.{}", base, Pattern::escape(ext));
        for entry in glob::glob_with(&pattern, options)? {
            match entry {
                Ok(path) if path.is_file() => {
                    found.insert(path);
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable entry: {}", e),
            }
        }
    }

    debug!("Found {} image(s) in {:?}", found.len(), dir);
    Ok(found.into_iter().collect())
}

/// Filename component as an owned string, used as the record key
pub fn file_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths.iter().filter_map(|p| file_name(p)).collect()
    }

    #[test]
    fn test_filters_by_extension_case_insensitively() {
        let dir = TempDir::new().unwrap();
        for name in ["a.jpg", "B.JPG", "c.Png", "notes.txt", "d.jpeg.bak", "e.webp", "README"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let found = list_images(dir.path(), &exts(&["jpg", "jpeg", "png", "gif"])).unwrap();
        assert_eq!(names(&found), vec!["B.JPG", "a.jpg", "c.Png"]);
    }

    #[test]
    fn test_no_double_counting_across_case_variants() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("photo.JPG"), b"x").unwrap();
        std::fs::write(dir.path().join("other.jpg"), b"x").unwrap();

        let found = list_images(dir.path(), &exts(&["jpg", "JPG", ".jpg"])).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_skips_subdirectories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("thumbnails")).unwrap();
        std::fs::create_dir(dir.path().join("album.jpg")).unwrap();
        std::fs::write(dir.path().join("thumbnails").join("thumb_a.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"x").unwrap();

        let found = list_images(dir.path(), &exts(&["jpg"])).unwrap();
        assert_eq!(names(&found), vec!["a.jpg"]);
    }

    #[test]
    fn test_directory_with_glob_characters() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("trip [2024]");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("beach.png"), b"x").unwrap();

        let found = list_images(&dir, &exts(&["png"])).unwrap();
        assert_eq!(names(&found), vec!["beach.png"]);
    }

    #[test]
    fn test_missing_directory_is_error() {
        let root = TempDir::new().unwrap();
        let result = list_images(&root.path().join("nope"), &exts(&["jpg"]));
        assert!(matches!(result, Err(PhototagError::DirectoryNotFound(_))));
    }
}
