//! Core data model: the decompiled pseudocode tree and the type references
//! hanging off it.
//!
//! - `ast`: functions, statements, expressions, and the borrowed [`Item`]
//!   used for ancestor stacks.
//! - `types`: type references, composite layouts, ordinals and offsets.

pub mod ast;
pub mod types;

pub use ast::*;
pub use types::*;
