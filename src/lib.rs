#![cfg_attr(docsrs, feature(doc_cfg))]
//! # topomesh
//!
//! topomesh is the topology and coordinate-deduplication kernel of a mesh
//! library. It welds near-coincident points, derives the edges and faces of
//! element tables, builds element adjacency graphs, walks them frontally and
//! extracts their borders.
//!
//! ## Features
//! - Tolerance-based point fusing on a regular box grid ([`algs::fuse`])
//! - Exact lower-entity extraction with incidence tables ([`algs::entities`])
//! - CSR element and node adjacency, with level exclusion and entity masks
//! - Multi-source front walks, connectivity partitioning and selection growth
//! - Free-entity (border) extraction with owner provenance
//! - Optional data parallelism through the `rayon` feature
//!
//! ## Determinism
//!
//! Every result is a pure function of its inputs: unique points and entities
//! are numbered in order of first appearance, neighbor lists are sorted, and
//! front walks claim elements in ascending front order. Enabling `rayon`
//! never changes a result.
//!
//! ## Usage
//!
//! ```
//! use topomesh::prelude::*;
//!
//! let points = PointArray::from_rows(vec![
//!     [0.0, 0.0, 0.0],
//!     [1.0, 0.0, 0.0],
//!     [0.0, 1.0, 0.0],
//!     [1.0, 0.0, 0.0], // duplicate of point 1
//!     [1.0, 1.0, 0.0],
//! ]);
//! let elements = ElementTable::from_rows(ElementType::Tri3, &[[0, 1, 2], [3, 4, 2]]).unwrap();
//! let mesh = Mesh::new(points, elements).unwrap().fuse(&FuseOpts::default()).unwrap();
//! assert_eq!(mesh.npoints(), 4);
//! assert_eq!(mesh.adjacency(1).unwrap().neighbors(0), &[1]);
//! assert_eq!(mesh.border(&BorderOpts::default()).unwrap().len(), 4);
//! ```
//!
//! Logging goes through the [`log`] facade; install any logger to see grid
//! sizing, entity counts and degenerate-entity warnings.

pub mod algs;
pub mod data;
pub mod debug_invariants;
pub mod mesh;
pub mod mesh_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use mesh::Mesh;
pub use mesh_error::{ErrorKind, MeshError};

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::adjacency_graph::{
        build_adjacency, build_masked_adjacency, element_adjacency, node_adjacency, AdjacencyList,
        AdjacencyOpts,
    };
    pub use crate::algs::boundary::{
        border, classify_entities, free_entities, BorderOpts, BoundaryEntitySet,
    };
    pub use crate::algs::entities::{
        extract_entities, extract_entities_with, EntityIncidence, EntityOpts, IncidenceTable,
    };
    pub use crate::algs::fuse::{adjust, fuse, has_match, match_points, FuseOpts, FuseResult};
    pub use crate::algs::partition::{grow_selection, partition_by_connection};
    pub use crate::algs::progress::{Progress, ProgressHook, Stage};
    pub use crate::algs::traversal::{front_walk, FrontWalk, FrontWalkOpts, UNVISITED};
    pub use crate::data::coordinates::PointArray;
    pub use crate::data::elements::ElementTable;
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::mesh::Mesh;
    pub use crate::mesh_error::{ErrorKind, MeshError};
    pub use crate::topology::cache::{InvalidateCache, TopologyCache};
    pub use crate::topology::cell_type::{ElementType, EntityTemplate};
}
