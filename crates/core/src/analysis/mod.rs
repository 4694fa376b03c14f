//! Field-usage analysis over decompiled functions.
//!
//! - `resolver`: nearest concrete address for a node.
//! - `classify`: read / write / argument classification of an access.
//! - `render`: one-line pseudocode for the enclosing statement.
//! - `visitor`: the single-pass walker producing per-function findings.
//! - `closure`: visited-set traversal of the direct call graph.

pub mod classify;
pub mod closure;
pub mod render;
pub mod resolver;
pub mod visitor;

pub use classify::{classify_usage, UsageKind};
pub use closure::{ClosureReport, Reachability};
pub use render::{render_expr, render_stmt_line};
pub use resolver::resolve_address;
pub use visitor::{FieldAccessVisitor, FieldUsages, FunctionFindings, FunctionScan, UsageRecord};
