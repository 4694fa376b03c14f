//! Decompiler backends.
//!
//! Only file-backed program dumps are supported for now; a live decompiler
//! bridge would implement the same `Decompiler` + `TypeDatabase` pair.

pub mod dump;

pub use dump::{DumpError, DumpFunction, ProgramDump};
