//! Persistent cross-reference index.
//!
//! The index maps composite ordinal -> function (relative to the image base)
//! -> field offset -> usage records. Before a re-walked function's findings
//! are stored, everything it contributed to any type is dropped, so re-walking
//! never leaves stale or duplicate records behind.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::{FieldUsages, UsageKind, UsageRecord};
use crate::db::{BlobStore, DbError, XrefSettings};
use crate::model::{FieldOffset, TypeOrdinal};

/// Key under which the index is persisted in the blob store.
pub const XREF_INDEX_KEY: &str = "fieldref:xref-index";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Blob store error: {0}")]
    Blob(#[from] DbError),
    #[error("Failed to encode xref index: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Failed to decode xref index: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One usage as returned by queries: absolute function address plus record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XrefInfo {
    pub func_ea: u64,
    pub offset: i64,
    pub line: String,
    pub kind: UsageKind,
}

impl XrefInfo {
    /// Absolute address of the access.
    pub fn ea(&self) -> u64 {
        self.func_ea.wrapping_add(self.offset as u64)
    }
}

/// In-memory form of the persisted index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct XrefIndex {
    types: BTreeMap<TypeOrdinal, BTreeMap<u64, FieldUsages>>,
}

/// Persisted layout before key coercion: JSON object keys are always text.
type RawIndex = BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<UsageRecord>>>>;

impl XrefIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn len_types(&self) -> usize {
        self.types.len()
    }

    /// Replace everything `function_offset` contributed for `ordinal`.
    pub fn replace(&mut self, ordinal: TypeOrdinal, function_offset: u64, usages: FieldUsages) {
        self.types.entry(ordinal).or_default().insert(function_offset, usages);
    }

    /// Drop everything `function_offset` contributed, across all types.
    ///
    /// Types left without any function are removed. Returns how many types
    /// lost an entry.
    pub fn forget_function(&mut self, function_offset: u64) -> usize {
        let mut touched = 0;
        self.types.retain(|_, functions| {
            if functions.remove(&function_offset).is_some() {
                touched += 1;
            }
            !functions.is_empty()
        });
        touched
    }

    /// Per-function usages of one type, keyed by function offset.
    pub fn functions(&self, ordinal: TypeOrdinal) -> Option<&BTreeMap<u64, FieldUsages>> {
        self.types.get(&ordinal)
    }

    pub fn ordinals(&self) -> impl Iterator<Item = TypeOrdinal> + '_ {
        self.types.keys().copied()
    }

    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a persisted index, coercing every map key back to an integer.
    pub fn decode(bytes: &[u8]) -> StoreResult<Self> {
        let raw: RawIndex =
            serde_json::from_slice(bytes).map_err(|e| StoreError::Decode(e.to_string()))?;
        let mut index = XrefIndex::new();
        for (ordinal, functions) in raw {
            let ordinal: TypeOrdinal = parse_key(&ordinal)?;
            let entry = index.types.entry(ordinal).or_default();
            for (function_offset, fields) in functions {
                let function_offset: u64 = parse_key(&function_offset)?;
                let mut usages = FieldUsages::new();
                for (field, records) in fields {
                    let field: FieldOffset = parse_key(&field)?;
                    usages.insert(field, records);
                }
                entry.insert(function_offset, usages);
            }
        }
        Ok(index)
    }
}

fn parse_key<T: FromStr>(key: &str) -> StoreResult<T> {
    key.trim().parse().map_err(|_| StoreError::Decode(format!("non-integer key '{key}'")))
}

/// Owner of the index with an explicit open/close lifecycle.
///
/// Persistence goes through a `BlobStore`; with `persist_xrefs` off the store
/// never touches it and the index lives for the session only.
pub struct XrefStore<B: BlobStore> {
    blobs: B,
    settings: XrefSettings,
    image_base: u64,
    index: Option<XrefIndex>,
}

impl<B: BlobStore> XrefStore<B> {
    /// Create a closed store; call [`XrefStore::open`] before querying.
    pub fn new(blobs: B, settings: XrefSettings, image_base: u64) -> Self {
        Self { blobs, settings, image_base, index: None }
    }

    pub fn image_base(&self) -> u64 {
        self.image_base
    }

    pub fn is_open(&self) -> bool {
        self.index.is_some()
    }

    /// Load the index from the blob store, falling back to an empty one.
    pub fn open(&mut self) {
        let index = self.load_index();
        self.index = Some(index);
    }

    /// Persist (when enabled) and release the in-memory index.
    ///
    /// The index is released even if saving fails.
    pub fn close(&mut self) -> StoreResult<()> {
        let saved = self.save();
        self.index = None;
        saved
    }

    /// Write the whole index to the blob store.
    ///
    /// No-op when persistence is disabled, the store is closed, or the index is empty.
    pub fn save(&self) -> StoreResult<()> {
        if !self.settings.persist_xrefs {
            return Ok(());
        }
        let Some(index) = self.index.as_ref().filter(|i| !i.is_empty()) else {
            return Ok(());
        };
        let bytes = index.encode()?;
        self.blobs.save(XREF_INDEX_KEY, &bytes)?;
        log::debug!("Saved xref index ({} bytes, {} types)", bytes.len(), index.len_types());
        Ok(())
    }

    /// Replace the usages recorded for `(ordinal, function_address)`.
    ///
    /// Opens the store first if needed.
    pub fn update_structure_info(
        &mut self,
        ordinal: TypeOrdinal,
        function_address: u64,
        usages: FieldUsages,
    ) {
        let function_offset = function_address.wrapping_sub(self.image_base);
        self.index_mut().replace(ordinal, function_offset, usages);
    }

    /// Invalidate every record of the function at `function_address`.
    ///
    /// Opens the store first if needed.
    pub fn forget_function(&mut self, function_address: u64) -> usize {
        let function_offset = function_address.wrapping_sub(self.image_base);
        self.index_mut().forget_function(function_offset)
    }

    /// Every recorded usage of `field_offset` in type `ordinal`.
    ///
    /// Grouped by function; callers needing another order must sort.
    pub fn get_structure_info(
        &self,
        ordinal: TypeOrdinal,
        field_offset: FieldOffset,
    ) -> Vec<XrefInfo> {
        let Some(functions) = self.index.as_ref().and_then(|i| i.functions(ordinal)) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for (function_offset, fields) in functions {
            let Some(records) = fields.get(&field_offset) else {
                continue;
            };
            let func_ea = function_offset.wrapping_add(self.image_base);
            out.extend(records.iter().map(|r| XrefInfo {
                func_ea,
                offset: r.offset,
                line: r.line.clone(),
                kind: r.kind,
            }));
        }
        out
    }

    /// Field offsets of `ordinal` that have at least one usage.
    pub fn fields(&self, ordinal: TypeOrdinal) -> Vec<FieldOffset> {
        let mut out: Vec<FieldOffset> = self
            .index
            .as_ref()
            .and_then(|i| i.functions(ordinal))
            .map(|functions| functions.values().flat_map(|f| f.keys().copied()).collect())
            .unwrap_or_default();
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn index(&self) -> Option<&XrefIndex> {
        self.index.as_ref()
    }

    /// Number of composite types with recorded usages (0 when closed).
    pub fn len_types(&self) -> usize {
        self.index.as_ref().map_or(0, XrefIndex::len_types)
    }

    /// Size of the serialized index in bytes (0 when closed).
    pub fn encoded_size(&self) -> usize {
        self.index.as_ref().and_then(|i| i.encode().ok()).map(|b| b.len()).unwrap_or(0)
    }

    fn index_mut(&mut self) -> &mut XrefIndex {
        if self.index.is_none() {
            self.open();
        }
        self.index.get_or_insert_with(XrefIndex::new)
    }

    fn load_index(&self) -> XrefIndex {
        if !self.settings.persist_xrefs {
            return XrefIndex::new();
        }
        match self.blobs.load(XREF_INDEX_KEY) {
            Ok(Some(bytes)) => match XrefIndex::decode(&bytes) {
                Ok(index) => index,
                Err(err) => {
                    log::error!(
                        "Failed to read previous info about xrefs ({err}); rebuild the index to cache data"
                    );
                    XrefIndex::new()
                }
            },
            Ok(None) => XrefIndex::new(),
            Err(err) => {
                log::error!("Failed to load xref index: {err}");
                XrefIndex::new()
            }
        }
    }
}
