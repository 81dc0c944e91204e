use std::fs;

use crate::die;

pub fn settings_export() {
    print!("{}", megrez_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(
        megrez_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    println!(
        "OK: compositor.max_span_length={}, compositor.separator={:?}, node.overriding_score={}, candidates.max_results={}",
        s.compositor.max_span_length,
        s.compositor.separator,
        s.node.overriding_score,
        s.candidates.max_results
    );
}

/// Install a settings file for the rest of the process.
pub fn settings_load(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    die!(
        megrez_core::settings::init_custom(content),
        "Error loading settings: {}"
    );
}
