use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::db::{open_project_db, BinaryRecord, ProjectConfig, ProjectDb, ProjectLayout};

/// Convenience wrapper bundling layout, config, db path, and an open ProjectDb.
#[derive(Debug)]
pub struct ProjectContext {
    pub layout: ProjectLayout,
    pub config: ProjectConfig,
    pub db_path: PathBuf,
    pub db: ProjectDb,
}

impl ProjectContext {
    /// Load project config and open the database for a given root.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let layout = ProjectLayout::new(root);
        let (config, db_path, db) = open_project_db(&layout)?;
        Ok(Self { layout, config, db_path, db })
    }

    /// Look up a registered binary by name.
    pub fn binary(&self, name: &str) -> Result<BinaryRecord> {
        let binaries = self.db.list_binaries().context("Failed to list binaries")?;
        binaries
            .into_iter()
            .find(|b| b.name == name)
            .ok_or_else(|| anyhow!("Binary '{name}' is not registered in this project"))
    }

    /// Absolute path of a registered binary's program dump.
    pub fn binary_path(&self, record: &BinaryRecord) -> PathBuf {
        let path = Path::new(&record.path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.layout.root.join(path)
        }
    }
}
