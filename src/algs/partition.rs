//! Connectivity partitioning built on front walks.
//!
//! Parts are the connected components of an element adjacency graph. They
//! are discovered by a front walk that does not advance its label along a
//! front (`front_increment = 0`) and bumps it by one every time it has to
//! restart on an unreached element.

use crate::algs::adjacency_graph::AdjacencyList;
use crate::algs::traversal::{FrontWalk, UNVISITED};
use crate::mesh_error::MeshError;

/// Label every element with the number of its connected part.
///
/// Parts are numbered in order of their lowest element, or by decreasing
/// size with `sort_by_size` (ties keep the lowest-element order). With
/// `max_parts`, elements beyond the first `max_parts` parts found stay
/// [`UNVISITED`]; sorting then applies to the parts found.
pub fn partition_by_connection(
    adj: &AdjacencyList,
    sort_by_size: bool,
    max_parts: Option<usize>,
) -> Result<Vec<i32>, MeshError> {
    let max_level = match max_parts {
        None => None,
        Some(0) => Some(UNVISITED),
        Some(m) => Some(i32::try_from(m - 1).unwrap_or(i32::MAX)),
    };
    let mut labels = FrontWalk::new(adj)
        .front_increment(0)
        .partition_increment(1)
        .max_level(max_level)
        .continue_unreached(true)
        .run()?;
    if sort_by_size {
        relabel_by_size(&mut labels);
    }
    log::debug!(
        "partitioned {} elements into {} connected parts",
        labels.len(),
        count_parts(&labels)
    );
    Ok(labels)
}

fn count_parts(labels: &[i32]) -> usize {
    labels.iter().copied().max().map_or(0, |m| (m + 1).max(0) as usize)
}

fn part_sizes(labels: &[i32]) -> Vec<usize> {
    let mut sizes = vec![0usize; count_parts(labels)];
    for &l in labels {
        if l >= 0 {
            sizes[l as usize] += 1;
        }
    }
    sizes
}

fn relabel_by_size(labels: &mut [i32]) {
    let sizes = part_sizes(labels);
    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| sizes[b].cmp(&sizes[a]));
    let mut new_label = vec![0i32; sizes.len()];
    for (rank, &old) in order.iter().enumerate() {
        new_label[old] = rank as i32;
    }
    for l in labels.iter_mut().filter(|l| **l >= 0) {
        *l = new_label[*l as usize];
    }
}

/// The connected parts, largest first, each as a sorted element list.
pub fn connected_parts(adj: &AdjacencyList) -> Result<Vec<Vec<usize>>, MeshError> {
    let labels = partition_by_connection(adj, true, None)?;
    let mut parts = vec![Vec::new(); count_parts(&labels)];
    for (e, &l) in labels.iter().enumerate() {
        if l >= 0 {
            parts[l as usize].push(e);
        }
    }
    Ok(parts)
}

/// The elements of the largest connected part (the one with the lowest
/// element on ties). Empty for an empty graph.
pub fn largest_by_connection(adj: &AdjacencyList) -> Result<Vec<usize>, MeshError> {
    Ok(connected_parts(adj)?.into_iter().next().unwrap_or_default())
}

/// Grow a selection by `nsteps` fronts (unlimited with `None`).
///
/// Returns the sorted elements reached, the selection included.
pub fn grow_selection(
    adj: &AdjacencyList,
    selection: &[usize],
    nsteps: Option<u32>,
) -> Result<Vec<usize>, MeshError> {
    let max_level = nsteps.map(|n| i32::try_from(n).unwrap_or(i32::MAX));
    let labels = FrontWalk::new(adj)
        .seeds(selection.iter().copied())
        .front_increment(1)
        .partition_increment(0)
        .max_level(max_level)
        .run()?;
    Ok((0..labels.len()).filter(|&e| labels[e] != UNVISITED).collect())
}
