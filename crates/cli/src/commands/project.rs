use std::fs;

use crate::commands::{open_project_db, print_dir_status};
use crate::{canonicalize_or_current, infer_project_name};
use anyhow::{Context, Result};
use fieldref_core::db::{BinaryRecord, ProjectConfig, ProjectDb, ProjectLayout, XrefSettings};
use fieldref_core::services::store::XREF_INDEX_KEY;
use serde::Serialize;

#[derive(Serialize)]
pub struct ProjectInfoSnapshot {
    pub name: String,
    pub root: String,
    pub config_file: String,
    pub config_version: String,
    pub db_path: String,
    pub xrefs: XrefSettings,
    pub layout: ProjectInfoLayout,
    pub binaries: Vec<BinaryInfo>,
}

#[derive(Serialize)]
pub struct ProjectInfoLayout {
    pub meta_dir: String,
    pub reports_dir: String,
}

/// A registered binary plus the state of its persisted index.
#[derive(Serialize)]
pub struct BinaryInfo {
    #[serde(flatten)]
    pub record: BinaryRecord,
    pub index_bytes: Option<usize>,
    pub index_updated_at: Option<String>,
}

/// Initialize a new project at `root`.
pub fn init_project_command(root: &str, name: Option<String>, persist_xrefs: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);

    // Derive project name if not provided.
    let project_name = match name {
        Some(n) => n,
        None => infer_project_name(&root_path),
    };

    // Ensure directories exist.
    fs::create_dir_all(&layout.meta_dir)
        .with_context(|| format!("Failed to create meta dir: {}", layout.meta_dir.display()))?;
    fs::create_dir_all(&layout.reports_dir).with_context(|| {
        format!("Failed to create reports dir: {}", layout.reports_dir.display())
    })?;

    // Build project config.
    let db_path_rel = layout.db_path_relative_string();
    let config = ProjectConfig::new(&project_name, db_path_rel)
        .with_xrefs(XrefSettings { persist_xrefs });

    // Serialize and write config JSON.
    let json = serde_json::to_string_pretty(&config)?;
    fs::write(&layout.project_config_path, json).with_context(|| {
        format!("Failed to write project config: {}", layout.project_config_path.display())
    })?;

    // Create the project database immediately so follow-on commands (and tests)
    // can rely on its presence.
    ProjectDb::open(&layout.db_path).with_context(|| {
        format!("Failed to initialize project database at {}", layout.db_path.display())
    })?;

    println!("Initialized fieldref project:");
    println!("  Name: {}", project_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.project_config_path.display());
    println!("  DB path (relative): {}", config.db.path);
    println!("  Reports dir: {}", layout.reports_dir.display());
    println!("  Persist xrefs: {}", config.xrefs.persist_xrefs);

    Ok(())
}

/// Show basic information about an existing project.
pub fn project_info_command(root: &str, json: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);

    let (config, _db_path, db) = open_project_db(&layout)?;
    let mut binaries = Vec::new();
    for record in db.list_binaries().context("Failed to list binaries")? {
        let blob = db
            .blob_info(&record.name, XREF_INDEX_KEY)
            .with_context(|| format!("Failed to read index info for '{}'", record.name))?;
        binaries.push(BinaryInfo {
            record,
            index_bytes: blob.as_ref().map(|b| b.size),
            index_updated_at: blob.map(|b| b.updated_at),
        });
    }

    if json {
        let snapshot = ProjectInfoSnapshot {
            name: config.name.clone(),
            root: layout.root.display().to_string(),
            config_file: layout.project_config_path.display().to_string(),
            config_version: config.config_version.clone(),
            db_path: config.db.path.clone(),
            xrefs: config.xrefs,
            layout: ProjectInfoLayout {
                meta_dir: layout.meta_dir.display().to_string(),
                reports_dir: layout.reports_dir.display().to_string(),
            },
            binaries,
        };
        let serialized = serde_json::to_string_pretty(&snapshot)?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("fieldref Project Info");
    println!("=====================");
    println!("Name: {}", config.name);
    println!("Root: {}", layout.root.display());
    println!("Config file: {}", layout.project_config_path.display());
    println!("Config version: {}", config.config_version);
    println!("DB path (config): {}", config.db.path);
    println!("Persist xrefs: {}", config.xrefs.persist_xrefs);
    println!();

    // Basic directory existence checks.
    println!("Directories:");
    print_dir_status("Meta dir (.fieldref)", &layout.meta_dir);
    print_dir_status("Reports dir", &layout.reports_dir);
    println!();

    println!("Binaries ({}):", binaries.len());
    for info in binaries {
        match (info.index_bytes, info.index_updated_at) {
            (Some(size), Some(at)) => {
                println!("- {} (index: {} bytes, updated {})", info.record.name, size, at)
            }
            _ => println!("- {} (not indexed)", info.record.name),
        }
    }

    Ok(())
}
