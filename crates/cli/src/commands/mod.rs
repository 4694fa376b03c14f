pub mod binaries;
pub mod index;
pub mod project;
pub mod util;
pub mod xrefs;

pub use binaries::*;
pub use index::*;
pub use project::*;
pub use util::*;
pub use xrefs::*;
