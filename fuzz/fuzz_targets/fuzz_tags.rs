// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use libfuzzer_sys::fuzz_target;
use phototag::tags::{MarkerLineParser, TagParser};

fuzz_target!(|data: &[u8]| {
    if let Ok(reply) = std::str::from_utf8(data) {
        let marker_lines = reply
            .lines()
            .filter(|l| l.trim().starts_with('-'))
            .count();
        let tags = MarkerLineParser::default().parse(reply);

        assert!(tags.len() <= marker_lines);
        for tag in &tags {
            assert!(!tag.is_empty());
            assert_eq!(tag.trim(), tag.as_str());
        }
    }
});
