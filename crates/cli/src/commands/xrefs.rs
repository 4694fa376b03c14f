use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use fieldref_core::analysis::UsageKind;
use fieldref_core::db::ScopedBlobs;
use fieldref_core::model::{CompositeType, FieldOffset};
use fieldref_core::services::backends::ProgramDump;
use fieldref_core::services::decompiler::{Decompiler, TypeDatabase};
use fieldref_core::services::store::{XrefInfo, XrefStore};
use serde::Serialize;

use crate::commands::{open_binary_session, resolve_type_arg, BinarySession};

/// How the queried field is identified on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelector {
    Name(String),
    Offset(FieldOffset),
}

/// One usage, ready for printing.
#[derive(Debug, Clone, Serialize)]
pub struct XrefRow {
    pub function: String,
    pub function_name: Option<String>,
    pub address: String,
    pub offset: i64,
    pub kind: UsageKind,
    pub line: String,
}

#[derive(Serialize)]
pub struct XrefQueryResult {
    pub binary: String,
    pub ordinal: u32,
    pub type_name: Option<String>,
    pub field_offset: FieldOffset,
    pub field_name: Option<String>,
    pub usages: Vec<XrefRow>,
}

#[derive(Serialize)]
pub struct XrefReport {
    pub binary: String,
    pub image_base: String,
    pub types: Vec<TypeReport>,
}

#[derive(Serialize)]
pub struct TypeReport {
    pub ordinal: u32,
    pub name: Option<String>,
    pub fields: Vec<FieldReport>,
}

#[derive(Serialize)]
pub struct FieldReport {
    pub offset: FieldOffset,
    pub name: Option<String>,
    pub usages: Vec<XrefRow>,
}

/// Query recorded usages of one field of one composite type.
pub fn xrefs_command(
    root: &str,
    binary: &str,
    type_arg: &str,
    field: FieldSelector,
    json: bool,
) -> Result<()> {
    let session = open_binary_session(root, binary)?;
    let (ordinal, composite) = resolve_type_arg(&session.dump, type_arg)?;
    let (field_offset, field_name) = resolve_field(composite, type_arg, &field)?;

    let store = open_store(&session);
    let usages = rows(&session.dump, store.get_structure_info(ordinal, field_offset));

    let result = XrefQueryResult {
        binary: session.record.name.clone(),
        ordinal,
        type_name: composite.map(|c| c.name.clone()),
        field_offset,
        field_name,
        usages,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let type_label = composite
        .map(|c| format!("{} {}", c.kind.keyword(), c.name))
        .unwrap_or_else(|| format!("type #{ordinal}"));
    let field_label =
        result.field_name.clone().unwrap_or_else(|| format!("field_{field_offset:X}"));
    println!(
        "Xrefs to {type_label}.{field_label} (ordinal {ordinal}, offset {field_offset:#X}): {}",
        result.usages.len()
    );
    if result.usages.is_empty() {
        println!("(none)");
        return Ok(());
    }
    for row in &result.usages {
        let location = location(row);
        println!("  {:<24} {:<3} {}", location, row.kind.as_str(), row.line);
    }

    Ok(())
}

/// Write every recorded usage of a binary to a JSON report.
pub fn export_xrefs_command(root: &str, binary: &str, output: Option<String>) -> Result<()> {
    let session = open_binary_session(root, binary)?;
    let store = open_store(&session);
    let dump = &session.dump;

    let mut types = Vec::new();
    if let Some(index) = store.index() {
        for ordinal in index.ordinals() {
            let composite = dump.composite(ordinal);
            let fields = store
                .fields(ordinal)
                .into_iter()
                .map(|offset| FieldReport {
                    offset,
                    name: composite.and_then(|c| c.member_at(offset)).map(|m| m.name.clone()),
                    usages: rows(dump, store.get_structure_info(ordinal, offset)),
                })
                .collect();
            types.push(TypeReport { ordinal, name: composite.map(|c| c.name.clone()), fields });
        }
    }
    let report = XrefReport {
        binary: session.record.name.clone(),
        image_base: format!("{:#X}", dump.image_base()),
        types,
    };

    let out_path = match output {
        Some(path) => PathBuf::from(path),
        None => session.ctx.layout.report_path(&session.record.name),
    };
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report dir: {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(&report)?;
    fs::write(&out_path, serialized)
        .with_context(|| format!("Failed to write report: {}", out_path.display()))?;

    println!("Exported xrefs:");
    println!("  Binary: {}", report.binary);
    println!("  Types: {}", report.types.len());
    println!("  Report: {}", out_path.display());

    Ok(())
}

fn resolve_field(
    composite: Option<&CompositeType>,
    type_arg: &str,
    field: &FieldSelector,
) -> Result<(FieldOffset, Option<String>)> {
    match field {
        FieldSelector::Offset(offset) => {
            let name = composite.and_then(|c| c.member_at(*offset)).map(|m| m.name.clone());
            Ok((*offset, name))
        }
        FieldSelector::Name(name) => {
            let composite = composite.ok_or_else(|| {
                anyhow!("Type '{type_arg}' has no known layout; query by --offset instead")
            })?;
            let member = composite
                .member_named(name)
                .ok_or_else(|| anyhow!("Type '{}' has no field named '{name}'", composite.name))?;
            Ok((member.offset, Some(member.name.clone())))
        }
    }
}

fn open_store(session: &BinarySession) -> XrefStore<ScopedBlobs<'_>> {
    let blobs = ScopedBlobs::new(&session.ctx.db, &session.record.name);
    let mut store = XrefStore::new(blobs, session.ctx.config.xrefs, session.dump.image_base());
    store.open();
    store
}

/// Convert store results into rows ordered by function address, then offset.
fn rows(dump: &ProgramDump, mut infos: Vec<XrefInfo>) -> Vec<XrefRow> {
    infos.sort_by_key(|i| (i.func_ea, i.offset));
    infos
        .into_iter()
        .map(|info| XrefRow {
            function: format!("{:#X}", info.func_ea),
            function_name: dump.function(info.func_ea).and_then(|f| f.name.clone()),
            address: format!("{:#X}", info.ea()),
            offset: info.offset,
            kind: info.kind,
            line: info.line,
        })
        .collect()
}

fn location(row: &XrefRow) -> String {
    let base = row.function_name.as_deref().unwrap_or(&row.function);
    if row.offset < 0 {
        format!("{base}-{:#X}", row.offset.unsigned_abs())
    } else {
        format!("{base}+{:#X}", row.offset)
    }
}
