use serde::{Deserialize, Serialize};

/// Record describing a program dump known to the project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BinaryRecord {
    /// Human-friendly name; also the scope of the binary's durable blobs.
    pub name: String,
    /// Path to the program dump, relative to the project root if possible.
    pub path: String,
    /// Optional architecture string (e.g., "armv7", "x86_64").
    pub arch: Option<String>,
    /// Optional content hash for identity (e.g., SHA-256).
    pub hash: Option<String>,
}

impl BinaryRecord {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self { name: name.into(), path: path.into(), arch: None, hash: None }
    }
}
