// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for parser crash safety.
//!
//! Feeds arbitrary UTF-8 to [`parse_source`] and checks the bookkeeping the
//! parser promises on every input: no panic, error spans inside the source,
//! and a root span that never runs past the end of the text.

#![no_main]

use apex_core::source_analysis::parse_source;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Invalid UTF-8 never reaches the parser
    if let Ok(source) = std::str::from_utf8(data) {
        let (unit, errors) = parse_source(source);
        let len = source.len();
        assert!(unit.span().end() as usize <= len);
        for error in &errors {
            assert!(error.span.end() as usize <= len);
            assert!(error.span.start() <= error.span.end());
        }
    }
});
