//! Project database integration and project layout definitions.
//!
//! This module wraps a SQLite database storing:
//! - Program dumps registered with the project
//! - Durable blobs (the persisted cross-reference index, one per binary)
//!
//! Pieces:
//! - `ProjectConfig` / `XrefSettings`: serializable project metadata.
//! - `ProjectLayout`: computed paths for project directories/files.
//! - `ProjectDb`: a small SQLite wrapper with versioned schema.
//! - `BlobStore` / `ScopedBlobs`: key-value blob access scoped to one binary.
//! - `ProjectContext`: layout + config + open database bundled together.

pub mod blobs;
pub mod config;
pub mod context;
pub mod layout;
pub mod models;
pub mod project_db;
pub mod util;

pub use blobs::{BlobStore, ScopedBlobs};
pub use config::{DbConfig, ProjectConfig, XrefSettings};
pub use context::ProjectContext;
pub use layout::ProjectLayout;
pub use models::BinaryRecord;
pub use project_db::{BlobInfo, DbError, DbResult, ProjectDb, CURRENT_SCHEMA_VERSION};
pub use util::{load_project_config, open_project_db, resolve_db_path};
