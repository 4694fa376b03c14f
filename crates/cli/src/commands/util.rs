use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use fieldref_core::db::{BinaryRecord, ProjectConfig, ProjectContext, ProjectDb, ProjectLayout};
use fieldref_core::model::{CompositeType, TypeOrdinal};
use fieldref_core::services::backends::ProgramDump;

use crate::canonicalize_or_current;

/// Load the project config JSON from disk (delegates to core helper).
pub fn load_project_config(layout: &ProjectLayout) -> Result<ProjectConfig> {
    fieldref_core::db::load_project_config(layout)
}

/// Resolve the DB path (respecting relative/absolute config) and open a ProjectDb (delegates to core helper).
pub fn open_project_db(layout: &ProjectLayout) -> Result<(ProjectConfig, PathBuf, ProjectDb)> {
    fieldref_core::db::open_project_db(layout)
}

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}

/// Everything a per-binary command needs: project, registration, and loaded dump.
pub struct BinarySession {
    pub ctx: ProjectContext,
    pub record: BinaryRecord,
    pub dump: ProgramDump,
}

/// Open the project at `root` and load the program dump registered as `binary`.
pub fn open_binary_session(root: &str, binary: &str) -> Result<BinarySession> {
    let root_path = canonicalize_or_current(root)?;
    let ctx = ProjectContext::from_root(&root_path)?;
    let record = ctx.binary(binary)?;
    let dump_path = ctx.binary_path(&record);
    let dump = ProgramDump::load(&dump_path)
        .with_context(|| format!("Failed to load program dump for '{}'", record.name))?;
    log::debug!(
        "Loaded {} ({} functions, {} types, image base {:#X})",
        dump_path.display(),
        dump.functions.len(),
        dump.types.len(),
        dump.image_base
    );
    Ok(BinarySession { ctx, record, dump })
}

/// Resolve a `--type` argument: a composite name, or a numeric ordinal.
///
/// Numeric ordinals are accepted even when the dump has no layout for them.
pub fn resolve_type_arg<'d>(
    dump: &'d ProgramDump,
    type_arg: &str,
) -> Result<(TypeOrdinal, Option<&'d CompositeType>)> {
    if let Some(composite) = dump.composite_by_name(type_arg) {
        return Ok((composite.ordinal, Some(composite)));
    }
    if let Ok(ordinal) = type_arg.trim().parse::<TypeOrdinal>() {
        let composite = dump.types.iter().find(|t| t.ordinal == ordinal);
        return Ok((ordinal, composite));
    }
    Err(anyhow!("Unknown type '{type_arg}' (expected a composite name or ordinal)"))
}
