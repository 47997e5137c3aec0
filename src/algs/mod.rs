//! Re-export public algorithms.

pub mod adjacency_graph;
pub mod boundary;
pub mod entities;
pub mod fuse;
pub mod manifold;
pub mod partition;
pub mod progress;
pub mod renumber;
pub mod traversal;

pub use adjacency_graph::{build_adjacency, element_adjacency, node_adjacency, AdjacencyList};
pub use boundary::{border, free_entities, BorderOpts, BoundaryEntitySet};
pub use entities::{extract_entities, EntityIncidence, IncidenceTable};
pub use fuse::{fuse, match_points, FuseOpts, FuseResult};
pub use traversal::{front_walk, FrontWalk, FrontWalkOpts, UNVISITED};
