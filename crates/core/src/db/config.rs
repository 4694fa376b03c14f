use serde::{Deserialize, Serialize};

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Path to the project database file (typically relative to project root).
    pub path: String,
}

impl DbConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Options controlling the cross-reference index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XrefSettings {
    /// When false the index lives only in memory for the session and the
    /// durable blob is never read or written.
    #[serde(default = "default_persist_xrefs")]
    pub persist_xrefs: bool,
}

fn default_persist_xrefs() -> bool {
    true
}

impl Default for XrefSettings {
    fn default() -> Self {
        Self { persist_xrefs: default_persist_xrefs() }
    }
}

impl XrefSettings {
    pub fn in_memory() -> Self {
        Self { persist_xrefs: false }
    }
}

/// Serializable configuration describing a fieldref project.
///
/// This lives at `.fieldref/project.json` in the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Human-friendly project name.
    pub name: String,
    /// Optional description / notes.
    pub description: Option<String>,
    /// Schema/config version. This is about the config format, not binary version.
    pub config_version: String,
    /// Database configuration (path is typically relative to project root).
    pub db: DbConfig,
    /// Cross-reference index options; missing in older configs.
    #[serde(default)]
    pub xrefs: XrefSettings,
}

impl ProjectConfig {
    /// Create a new project configuration using the given name and db path.
    pub fn new(name: impl Into<String>, db_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            db: DbConfig::new(db_path),
            xrefs: XrefSettings::default(),
        }
    }

    pub fn with_xrefs(mut self, xrefs: XrefSettings) -> Self {
        self.xrefs = xrefs;
        self
    }
}
