//! Non-manifold detection.
//!
//! A surface is non-manifold at a node where pieces touch that are not
//! connected through an edge (two cones meeting at their apex). A volume is
//! non-manifold along an edge where pieces touch that are not connected
//! through a face.

use crate::algs::adjacency_graph::element_adjacency;
use crate::algs::entities::extract_entities;
use crate::algs::partition::partition_by_connection;
use crate::data::elements::ElementTable;
use crate::mesh_error::MeshError;

/// Nodes shared by two or more edge-connected parts, ascending.
///
/// Only meaningful for surface and volume elements; lower dimensional
/// tables return an empty list.
pub fn non_manifold_nodes(elements: &ElementTable) -> Result<Vec<usize>, MeshError> {
    if elements.eltype().dimension() < 2 {
        return Ok(Vec::new());
    }
    let parts = partition_by_connection(&element_adjacency(elements, 1, None)?, false, None)?;
    Ok(shared_between_parts(
        elements.rows().enumerate().map(|(e, r)| (parts[e], r)),
        elements.nnodes(),
    ))
}

/// Edge numbers (of the level 1 entities, in extraction order) shared by
/// two or more face-connected parts, ascending.
///
/// Only meaningful for volume elements; other tables return an empty list.
pub fn non_manifold_edges(elements: &ElementTable) -> Result<Vec<usize>, MeshError> {
    if elements.eltype().dimension() < 3 {
        return Ok(Vec::new());
    }
    let parts = partition_by_connection(&element_adjacency(elements, 2, None)?, false, None)?;
    let edges = extract_entities(elements, 1)?;
    Ok(shared_between_parts(
        edges.incidence.rows().enumerate().map(|(e, r)| (parts[e], r)),
        edges.nentities(),
    ))
}

/// Targets in `0..ntargets` that occur in rows of at least two parts.
fn shared_between_parts<'r>(
    rows: impl Iterator<Item = (i32, &'r [usize])>,
    ntargets: usize,
) -> Vec<usize> {
    const NONE: i32 = i32::MIN;
    let mut first_part = vec![NONE; ntargets];
    let mut shared = vec![false; ntargets];
    for (part, row) in rows {
        for &t in row {
            match first_part[t] {
                NONE => first_part[t] = part,
                p if p != part => shared[t] = true,
                _ => {}
            }
        }
    }
    (0..ntargets).filter(|&t| shared[t]).collect()
}
