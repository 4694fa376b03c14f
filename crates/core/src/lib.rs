//! fieldref-core
//!
//! Core library for indexing structure field usages in decompiled pseudocode.
//!
//! This crate defines the pseudocode and type model, the field-access analysis,
//! the persistent cross-reference store, database integration, and the
//! decompiler backends that feed the analysis.
//!
//! The goal is to keep all substantive logic here so it is fully testable and
//! reusable from multiple frontends (CLI, decompiler plugins, etc.).

pub mod analysis;
pub mod db;
pub mod model;
pub mod services;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
