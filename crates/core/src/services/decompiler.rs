use thiserror::Error;

use crate::model::{CFunction, CompositeType, TypeOrdinal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecompileError {
    #[error("No function at {0:#X}")]
    NotFound(u64),
    #[error("Decompilation of {address:#X} failed: {reason}")]
    Failed { address: u64, reason: String },
}

/// Source of typed pseudocode trees.
///
/// Decompilation may be slow and may fail; callers treat each call as a
/// blocking operation and handle failures per function.
pub trait Decompiler {
    fn decompile(&self, address: u64) -> Result<CFunction, DecompileError>;

    /// Load base of the analyzed binary; persisted addresses are relative to it.
    fn image_base(&self) -> u64;

    /// Entry addresses of every known function, used by full indexing.
    fn functions(&self) -> Vec<u64>;
}

/// The binary's type database, as far as field indexing needs it.
pub trait TypeDatabase {
    /// Ordinal of the composite named `name`, if the database knows it.
    fn resolve_type_by_name(&self, name: &str) -> Option<TypeOrdinal>;

    /// Layout of the composite with the given ordinal.
    fn composite(&self, _ordinal: TypeOrdinal) -> Option<&CompositeType> {
        None
    }
}
