use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::db::{ProjectConfig, ProjectDb, ProjectLayout};

/// Read `.fieldref/project.json` for `layout`.
pub fn load_project_config(layout: &ProjectLayout) -> Result<ProjectConfig> {
    let path = &layout.project_config_path;
    let text = fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read project config at {} (run `fieldref init-project` first)",
            path.display()
        )
    })?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse project config JSON in {}", path.display()))
}

/// Where the configured project database lives; relative paths hang off the root.
pub fn resolve_db_path(layout: &ProjectLayout, config: &ProjectConfig) -> PathBuf {
    let configured = Path::new(&config.db.path);
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        layout.root.join(configured)
    }
}

/// Load the config and open the database it points at.
pub fn open_project_db(layout: &ProjectLayout) -> Result<(ProjectConfig, PathBuf, ProjectDb)> {
    let config = load_project_config(layout)?;
    let db_path = resolve_db_path(layout, &config);
    let db = ProjectDb::open(&db_path).with_context(|| {
        format!("Failed to open project database at {} for '{}'", db_path.display(), config.name)
    })?;
    Ok((config, db_path, db))
}
