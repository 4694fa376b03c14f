//! Services built on top of the model and analysis layers.
//!
//! - `decompiler`: the collaborator traits a decompiler must provide.
//! - `backends`: concrete decompiler sources (program dumps).
//! - `store`: the persistent cross-reference index.
//! - `indexer`: the context object driving analysis into the store.

pub mod backends;
pub mod decompiler;
pub mod indexer;
pub mod store;
