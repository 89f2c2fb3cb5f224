//! Domain models for the citation search engine

pub mod audit;
pub mod citation;
pub mod mesh;

pub use audit::{LoggedParameter, SearchLogEntry};
pub use citation::{ArtifactId, CitationRow, CurrentState};
pub use mesh::{MeshTree, MeshTreeNode};
