// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use datavault::cleanup::CleanupConfig;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    yaml: &'a str,
    file_name: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    if let Ok(config) = CleanupConfig::from_yaml_str(input.yaml) {
        let _ = config.classify(input.file_name);
        let _ = config.is_ignored_dir(input.file_name);
        if let Ok(yaml) = config.to_yaml_string() {
            let _ = CleanupConfig::from_yaml_str(&yaml);
        }
    }
});
