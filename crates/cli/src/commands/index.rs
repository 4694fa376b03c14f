use anyhow::{Context, Result};
use fieldref_core::analysis::ClosureReport;
use fieldref_core::db::ScopedBlobs;
use fieldref_core::services::decompiler::Decompiler;
use fieldref_core::services::indexer::XrefIndexer;
use fieldref_core::services::store::XrefStore;
use serde::Serialize;

use crate::commands::open_binary_session;

/// What an `index` invocation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexScope {
    /// One function, re-walked unconditionally.
    Function(u64),
    /// A function and everything it transitively calls.
    Closure(u64),
    /// Every function in the dump.
    All,
}

#[derive(Serialize)]
pub struct IndexSummary {
    pub binary: String,
    pub analyzed: Vec<String>,
    pub failed: Vec<String>,
    pub types: usize,
    pub index_bytes: usize,
    pub persisted: bool,
}

/// Index field usages of a registered binary and persist the result.
pub fn index_command(root: &str, binary: &str, scope: IndexScope, json: bool) -> Result<()> {
    let session = open_binary_session(root, binary)?;
    let settings = session.ctx.config.xrefs;
    let blobs = ScopedBlobs::new(&session.ctx.db, &session.record.name);
    let mut store = XrefStore::new(blobs, settings, session.dump.image_base());
    store.open();

    let mut indexer = XrefIndexer::new(&session.dump, &session.dump, store);
    let report = match scope {
        IndexScope::Function(address) => {
            indexer
                .index_function(address)
                .with_context(|| format!("Failed to index function at {address:#X}"))?;
            ClosureReport { analyzed: vec![address], failed: Vec::new() }
        }
        IndexScope::Closure(address) => indexer.close_from(address),
        IndexScope::All => indexer.index_all(),
    };

    let mut store = indexer.into_store();
    let summary = IndexSummary {
        binary: session.record.name.clone(),
        analyzed: report.analyzed.iter().map(|a| format!("{a:#X}")).collect(),
        failed: report.failed.iter().map(|a| format!("{a:#X}")).collect(),
        types: store.len_types(),
        index_bytes: store.encoded_size(),
        persisted: settings.persist_xrefs,
    };
    store.close().context("Failed to save xref index")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Indexed binary: {}", summary.binary);
    println!("  Functions analyzed: {}", summary.analyzed.len());
    println!("  Functions failed: {}", summary.failed.len());
    for address in &summary.failed {
        println!("    - {address}");
    }
    println!("  Types with usages: {}", summary.types);
    if summary.persisted {
        println!("  Index size: {} bytes", summary.index_bytes);
    } else {
        println!("  Index not persisted (persist_xrefs is off)");
    }

    Ok(())
}
