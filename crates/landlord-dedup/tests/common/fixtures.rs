//! Test fixture loading utilities

use std::path::PathBuf;

use landlord_dedup::RawContact;

/// Get the path to a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// Load a fixture file as a string
#[allow(dead_code)]
pub fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", name))
}

/// Load a JSON array of raw contacts
#[allow(dead_code)]
pub fn load_contacts(name: &str) -> Vec<RawContact> {
    serde_json::from_str(&load_fixture(name))
        .unwrap_or_else(|e| panic!("Invalid contact fixture {}: {}", name, e))
}

/// Load a JSON array of owner names
#[allow(dead_code)]
pub fn load_names(name: &str) -> Vec<String> {
    serde_json::from_str(&load_fixture(name))
        .unwrap_or_else(|e| panic!("Invalid name fixture {}: {}", name, e))
}
