//! Element-to-element adjacency through shared entities.
//!
//! Two elements are adjacent at a level when they share an entity of that
//! level: a node (level 0), an edge (1) or a face (2). The graph is stored
//! CSR-style.
//!
//! Determinism:
//! - Neighbor lists are always sorted, deduplicated and free of self loops.
//! - The graph is symmetric.

use itertools::Itertools;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::algs::entities::{extract_entities, IncidenceTable};
use crate::data::elements::ElementTable;
use crate::debug_invariants::{validate_csr, DebugInvariants};
use crate::mesh_error::MeshError;
use crate::topology::cell_type::ElementType;
use crate::topology::inverse::InverseIndex;

/// CSR-style adjacency graph over `0..len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyList {
    /// CSR offsets into `adjncy` for each vertex.
    pub xadj: Vec<usize>,
    /// CSR adjacency list.
    pub adjncy: Vec<usize>,
}

impl AdjacencyList {
    /// A graph of `n` isolated vertices.
    pub fn isolated(n: usize) -> Self {
        Self {
            xadj: vec![0; n + 1],
            adjncy: Vec::new(),
        }
    }

    /// Build from per-vertex neighbor lists; lists are sorted, deduplicated
    /// and cleaned of self loops. Symmetry is the caller's business.
    pub fn from_lists(mut neigh: Vec<Vec<usize>>) -> Self {
        let clean = |(i, list): (usize, &mut Vec<usize>)| {
            list.sort_unstable();
            list.dedup();
            if let Ok(pos) = list.binary_search(&i) {
                list.remove(pos);
            }
        };
        #[cfg(feature = "rayon")]
        neigh.par_iter_mut().enumerate().for_each(clean);
        #[cfg(not(feature = "rayon"))]
        neigh.iter_mut().enumerate().for_each(clean);

        let total: usize = neigh.iter().map(Vec::len).sum();
        let mut xadj = Vec::with_capacity(neigh.len() + 1);
        let mut adjncy = Vec::with_capacity(total);
        xadj.push(0);
        for list in &neigh {
            adjncy.extend(list.iter().copied());
            xadj.push(adjncy.len());
        }
        Self { xadj, adjncy }
    }

    /// Connect every pair of rows that own a common target of `inv`, using
    /// only the targets for which `connects` holds.
    pub fn from_shared_owners(
        inv: &InverseIndex,
        nrows: usize,
        connects: impl Fn(usize) -> bool,
    ) -> Self {
        let mut neigh: Vec<Vec<usize>> = vec![Vec::new(); nrows];
        for t in 0..inv.len() {
            let owners = inv.owners(t);
            if owners.len() < 2 || !connects(t) {
                continue;
            }
            for (&a, &b) in owners.iter().tuple_combinations() {
                neigh[a].push(b);
                neigh[b].push(a);
            }
        }
        Self::from_lists(neigh)
    }

    /// Number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.xadj.len().saturating_sub(1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the neighbor index slice for vertex `i`.
    #[inline]
    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.adjncy[self.xadj[i]..self.xadj[i + 1]]
    }

    #[inline]
    pub fn degree(&self, i: usize) -> usize {
        self.xadj[i + 1] - self.xadj[i]
    }

    pub fn max_degree(&self) -> usize {
        self.xadj.windows(2).map(|w| w[1] - w[0]).max().unwrap_or(0)
    }

    /// Number of undirected edges.
    pub fn nedges(&self) -> usize {
        self.adjncy.len() / 2
    }

    /// True if `b` is a neighbor of `a`.
    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.neighbors(a).binary_search(&b).is_ok()
    }

    /// Remove every edge that is also present in `other`.
    ///
    /// Vertices beyond `other.len()` keep all their neighbors.
    pub fn exclude(&self, other: &AdjacencyList) -> AdjacencyList {
        let mut xadj = Vec::with_capacity(self.xadj.len());
        let mut adjncy = Vec::with_capacity(self.adjncy.len());
        xadj.push(0);
        for i in 0..self.len() {
            let drop: &[usize] = if i < other.len() { other.neighbors(i) } else { &[] };
            adjncy.extend(
                self.neighbors(i)
                    .iter()
                    .copied()
                    .filter(|n| drop.binary_search(n).is_err()),
            );
            xadj.push(adjncy.len());
        }
        AdjacencyList { xadj, adjncy }
    }

    /// Fixed-width rows, `-1` padded on the left so each row reads as a
    /// sorted list.
    pub fn to_padded(&self) -> Vec<Vec<i64>> {
        let width = self.max_degree();
        (0..self.len())
            .map(|i| {
                let nb = self.neighbors(i);
                let mut row = vec![-1i64; width - nb.len()];
                row.extend(nb.iter().map(|&n| n as i64));
                row
            })
            .collect()
    }

    /// Neighbor lists as owned vectors.
    pub fn to_lists(&self) -> Vec<Vec<usize>> {
        (0..self.len()).map(|i| self.neighbors(i).to_vec()).collect()
    }
}

impl DebugInvariants for AdjacencyList {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "AdjacencyList");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        let n = self.len();
        validate_csr("adjacency", &self.xadj, &self.adjncy, n)?;
        for i in 0..n {
            let nb = self.neighbors(i);
            if nb.windows(2).any(|w| w[0] >= w[1]) {
                return Err(MeshError::InvariantViolation(format!(
                    "neighbors of {i} are not strictly sorted"
                )));
            }
            for &j in nb {
                if j == i || !self.contains(j, i) {
                    return Err(MeshError::InvariantViolation(format!(
                        "edge {i} -> {j} is a self loop or has no reverse"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Options for [`element_adjacency_with`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjacencyOpts {
    /// Level of the shared entities: 0 nodes, 1 edges, 2 faces; negative
    /// counts from the element dimension.
    pub level: i32,
    /// Drop pairs that also share an entity of this (higher) level.
    pub exclude_level: Option<i32>,
}

impl Default for AdjacencyOpts {
    fn default() -> Self {
        Self {
            level: 0,
            exclude_level: None,
        }
    }
}

/// Element adjacency from an incidence table: elements sharing any entity.
pub fn build_adjacency(incidence: &IncidenceTable) -> AdjacencyList {
    AdjacencyList::from_shared_owners(&incidence.inverse(), incidence.nelems(), |_| true)
}

/// Element adjacency through the entities flagged in `mask` only.
pub fn build_masked_adjacency(
    incidence: &IncidenceTable,
    mask: &[bool],
) -> Result<AdjacencyList, MeshError> {
    if mask.len() != incidence.nentities() {
        return Err(MeshError::InvalidMask {
            expected: incidence.nentities(),
            found: mask.len(),
        });
    }
    Ok(AdjacencyList::from_shared_owners(
        &incidence.inverse(),
        incidence.nelems(),
        |t| mask[t],
    ))
}

/// Adjacency of the elements of `elements` through shared entities of
/// `level`, optionally without the pairs that also share an entity of
/// `exclude_level`.
///
/// `exclude_level` must be higher than `level`: "share a node but not an
/// edge" is `(0, Some(1))`.
pub fn element_adjacency(
    elements: &ElementTable,
    level: i32,
    exclude_level: Option<i32>,
) -> Result<AdjacencyList, MeshError> {
    let (lvl, excl) = resolve_levels(elements.eltype(), level, exclude_level)?;
    let adj = adjacency_at_level(elements, lvl)?;
    let out = match excl {
        Some(x) => adj.exclude(&adjacency_at_level(elements, x)?),
        None => adj,
    };
    crate::debug_invariants!(out.validate_invariants(), "element_adjacency");
    Ok(out)
}

/// Resolve a level and an optional exclude level, which must be higher.
pub(crate) fn resolve_levels(
    eltype: ElementType,
    level: i32,
    exclude_level: Option<i32>,
) -> Result<(u8, Option<u8>), MeshError> {
    let lvl = eltype.resolve_level(level)?;
    let Some(x) = exclude_level else {
        return Ok((lvl, None));
    };
    let excl = eltype.resolve_level(x)?;
    if excl <= lvl {
        return Err(MeshError::InvalidLevel {
            eltype: eltype.name(),
            level: x,
            dimension: eltype.dimension(),
        });
    }
    Ok((lvl, Some(excl)))
}

/// [`element_adjacency`] driven by an options struct.
pub fn element_adjacency_with(
    elements: &ElementTable,
    opts: &AdjacencyOpts,
) -> Result<AdjacencyList, MeshError> {
    element_adjacency(elements, opts.level, opts.exclude_level)
}

/// Adjacency at an already resolved level. Level 0 works on the node
/// numbers directly.
pub(crate) fn adjacency_at_level(elements: &ElementTable, lvl: u8) -> Result<AdjacencyList, MeshError> {
    if lvl == 0 {
        return Ok(AdjacencyList::from_shared_owners(
            &elements.inverse(),
            elements.nelems(),
            |_| true,
        ));
    }
    let ent = extract_entities(elements, i32::from(lvl))?;
    Ok(build_adjacency(&ent.incidence))
}

/// Node adjacency: nodes are adjacent when they belong to a common element.
///
/// The graph spans `0..elements.nnodes()`.
pub fn node_adjacency(elements: &ElementTable) -> AdjacencyList {
    let mut neigh: Vec<Vec<usize>> = vec![Vec::new(); elements.nnodes()];
    for row in elements.rows() {
        for &a in row {
            neigh[a].extend(row.iter().copied().filter(|&b| b != a));
        }
    }
    AdjacencyList::from_lists(neigh)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quads() -> ElementTable {
        // 2x2 quad patch
        // 6 7 8
        // 3 4 5
        // 0 1 2
        ElementTable::from_rows(
            ElementType::Quad4,
            &[[0, 1, 4, 3], [1, 2, 5, 4], [3, 4, 7, 6], [4, 5, 8, 7]],
        )
        .unwrap()
    }

    #[test]
    fn edge_and_node_adjacency() {
        let els = quads();
        let by_edge = element_adjacency(&els, 1, None).unwrap();
        assert_eq!(by_edge.to_lists(), vec![vec![1, 2], vec![0, 3], vec![0, 3], vec![1, 2]]);
        let by_node = element_adjacency(&els, 0, None).unwrap();
        assert_eq!(by_node.neighbors(0), &[1, 2, 3]);
        let corner_only = element_adjacency(&els, 0, Some(1)).unwrap();
        assert_eq!(corner_only.to_lists(), vec![vec![3], vec![2], vec![1], vec![0]]);
        assert!(corner_only.validate_invariants().is_ok());
    }

    #[test]
    fn exclude_level_must_be_higher() {
        let els = quads();
        assert!(matches!(
            element_adjacency(&els, 1, Some(0)),
            Err(MeshError::InvalidLevel { level: 0, .. })
        ));
        assert!(element_adjacency(&els, 1, Some(1)).is_err());
    }

    #[test]
    fn masked_adjacency_uses_only_flagged_entities() {
        let ent = extract_entities(&quads(), 1).unwrap();
        let inv = ent.incidence.inverse();
        // keep only the shared edge between elements 0 and 1
        let mask: Vec<bool> = (0..ent.nentities())
            .map(|t| inv.owners(t) == [0, 1])
            .collect();
        let adj = build_masked_adjacency(&ent.incidence, &mask).unwrap();
        assert_eq!(adj.to_lists(), vec![vec![1], vec![0], vec![], vec![]]);
        assert!(matches!(
            build_masked_adjacency(&ent.incidence, &[true]),
            Err(MeshError::InvalidMask { found: 1, .. })
        ));
    }

    #[test]
    fn padded_rows_are_left_filled() {
        let adj = AdjacencyList::from_lists(vec![vec![1, 2], vec![0], vec![0], vec![]]);
        assert_eq!(
            adj.to_padded(),
            vec![vec![1, 2], vec![-1, 0], vec![-1, 0], vec![-1, -1]]
        );
    }

    #[test]
    fn node_adjacency_of_one_triangle() {
        let t = ElementTable::from_rows(ElementType::Tri3, &[[0, 1, 2], [2, 3, 4]]).unwrap();
        let adj = node_adjacency(&t);
        assert_eq!(adj.len(), 5);
        assert_eq!(adj.neighbors(2), &[0, 1, 3, 4]);
        assert_eq!(adj.neighbors(0), &[1, 2]);
        assert_eq!(adj.nedges(), 6);
    }

    #[test]
    fn empty_graph() {
        let adj = element_adjacency(&ElementTable::empty(ElementType::Tri3), 1, None).unwrap();
        assert!(adj.is_empty());
        assert_eq!(adj.xadj, vec![0]);
        assert!(adj.to_padded().is_empty());
    }
}
