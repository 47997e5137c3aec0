//! Element types, entity templates and derived-topology caching.
//!
//! This module provides:
//! - [`ElementType`] and its compiled-in [`EntityTemplate`]s
//! - the CSR [`InverseIndex`] used to look up owners of nodes and entities
//! - [`TopologyCache`], which memoizes entities and adjacency per table

pub mod cache;
pub mod cell_type;
pub mod inverse;

pub use cache::{InvalidateCache, TopologyCache};
pub use cell_type::{ElementType, EntityTemplate, MAX_PLEX};
pub use inverse::InverseIndex;
