use crate::db::{DbResult, ProjectDb};

/// Durable key-value blob storage scoped to one analyzed binary.
pub trait BlobStore {
    fn load(&self, key: &str) -> DbResult<Option<Vec<u8>>>;
    fn save(&self, key: &str, data: &[u8]) -> DbResult<()>;
}

/// `BlobStore` view of the project database for a single binary.
#[derive(Debug, Clone, Copy)]
pub struct ScopedBlobs<'a> {
    db: &'a ProjectDb,
    scope: &'a str,
}

impl<'a> ScopedBlobs<'a> {
    pub fn new(db: &'a ProjectDb, scope: &'a str) -> Self {
        Self { db, scope }
    }

    pub fn scope(&self) -> &str {
        self.scope
    }
}

impl BlobStore for ScopedBlobs<'_> {
    fn load(&self, key: &str) -> DbResult<Option<Vec<u8>>> {
        self.db.load_blob(self.scope, key)
    }

    fn save(&self, key: &str, data: &[u8]) -> DbResult<()> {
        self.db.save_blob(self.scope, key, data)
    }
}
