//! Program dump backend.
//!
//! A dump is a JSON or YAML snapshot of what a decompiler produced for one
//! binary: the image base, the composite types of its type library, and one
//! pseudocode tree (or a recorded failure) per function.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{CFunction, CompositeType, Stmt, TypeOrdinal};
use crate::services::decompiler::{DecompileError, Decompiler, TypeDatabase};

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("Failed to read program dump {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON program dump: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid YAML program dump: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Unsupported program dump extension for {0} (expected .json, .yaml or .yml)")]
    UnsupportedExtension(PathBuf),
}

/// A function as recorded in the dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpFunction {
    pub entry: u64,
    #[serde(default)]
    pub name: Option<String>,
    /// Pseudocode body; absent when decompilation failed.
    #[serde(default)]
    pub body: Option<Stmt>,
    /// Decompiler failure message, reported when `body` is absent.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramDump {
    #[serde(default)]
    pub image_base: u64,
    #[serde(default)]
    pub types: Vec<CompositeType>,
    #[serde(default)]
    pub functions: Vec<DumpFunction>,
    #[serde(skip)]
    by_entry: HashMap<u64, usize>,
}

impl ProgramDump {
    pub fn new(image_base: u64, types: Vec<CompositeType>, functions: Vec<DumpFunction>) -> Self {
        let mut dump = Self { image_base, types, functions, by_entry: HashMap::new() };
        dump.reindex();
        dump
    }

    /// Load a dump, picking the format from the file extension.
    pub fn load(path: &Path) -> Result<Self, DumpError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let read = || {
            fs::read_to_string(path)
                .map_err(|source| DumpError::Io { path: path.to_path_buf(), source })
        };
        match ext.as_str() {
            "json" => Self::from_json_str(&read()?),
            "yaml" | "yml" => Self::from_yaml_str(&read()?),
            _ => Err(DumpError::UnsupportedExtension(path.to_path_buf())),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, DumpError> {
        let mut dump: Self = serde_json::from_str(text)?;
        dump.reindex();
        Ok(dump)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, DumpError> {
        let mut dump: Self = serde_yaml::from_str(text)?;
        dump.reindex();
        Ok(dump)
    }

    /// Named composite lookup, used by CLI queries that take a type name.
    pub fn composite_by_name(&self, name: &str) -> Option<&CompositeType> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn function(&self, entry: u64) -> Option<&DumpFunction> {
        self.by_entry.get(&entry).and_then(|i| self.functions.get(*i))
    }

    fn reindex(&mut self) {
        // Later duplicates shadow earlier entries.
        self.by_entry =
            self.functions.iter().enumerate().map(|(i, f)| (f.entry, i)).collect();
    }
}

impl Decompiler for ProgramDump {
    fn decompile(&self, address: u64) -> Result<CFunction, DecompileError> {
        let func = self.function(address).ok_or(DecompileError::NotFound(address))?;
        match &func.body {
            Some(body) => Ok(CFunction {
                entry: func.entry,
                name: func.name.clone(),
                body: body.clone(),
            }),
            None => Err(DecompileError::Failed {
                address,
                reason: func.error.clone().unwrap_or_else(|| "no pseudocode recorded".into()),
            }),
        }
    }

    fn image_base(&self) -> u64 {
        self.image_base
    }

    fn functions(&self) -> Vec<u64> {
        let mut entries: Vec<u64> = self.by_entry.keys().copied().collect();
        entries.sort_unstable();
        entries
    }
}

impl TypeDatabase for ProgramDump {
    fn resolve_type_by_name(&self, name: &str) -> Option<TypeOrdinal> {
        self.composite_by_name(name).map(|t| t.ordinal)
    }

    fn composite(&self, ordinal: TypeOrdinal) -> Option<&CompositeType> {
        self.types.iter().find(|t| t.ordinal == ordinal)
    }
}
