// Version information for the Document Assistant Node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-document-qa-2026-08-27";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2026-08-27";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "pdf-ingestion",
    "text-ingestion",
    "persistent-collections",
    "cosine-retrieval",
    "embedding-model-pinning",
    "note-log",
    "tool-routing",
    "scripted-planner",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Document Assistant Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
