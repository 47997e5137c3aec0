//! Element connectivity tables.
//!
//! An [`ElementTable`] is a flat, row-major table of point indices with a
//! fixed row width (the plexitude) and an element-type tag selecting which
//! entity templates apply. Tables are never mutated in place; every
//! transformation returns a new table.

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshError;
use crate::topology::cell_type::{has_repeats, ElementType, EntityTemplate, MAX_PLEX};
use crate::topology::inverse::InverseIndex;

/// Canonical, fixed-size key of one table row.
pub(crate) type RowKey = [usize; MAX_PLEX];

/// Build the deduplication key of a row.
///
/// With `permutations`, rows holding the same nodes in any order share a key;
/// without it only identical rows do. Repeated nodes are kept, so `(0, 0, 1)`
/// and `(0, 1, 1)` stay distinct.
pub(crate) fn row_key(row: &[usize], permutations: bool) -> RowKey {
    let mut key = [usize::MAX; MAX_PLEX];
    key[..row.len()].copy_from_slice(row);
    if permutations {
        key[..row.len()].sort_unstable();
    }
    key
}

/// Fixed-width table of point indices tagged with an element type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementTable {
    eltype: ElementType,
    nodes: Vec<usize>,
}

impl ElementTable {
    /// Wrap a flat row-major buffer.
    pub fn new(eltype: ElementType, nodes: Vec<usize>) -> Result<Self, MeshError> {
        let width = eltype.nplex();
        if nodes.len() % width != 0 {
            return Err(MeshError::ShapeMismatch {
                len: nodes.len(),
                width,
            });
        }
        Ok(Self { eltype, nodes })
    }

    /// Build a table from individual rows.
    pub fn from_rows<R: AsRef<[usize]>>(eltype: ElementType, rows: &[R]) -> Result<Self, MeshError> {
        let width = eltype.nplex();
        let mut nodes = Vec::with_capacity(rows.len() * width);
        for r in rows {
            let r = r.as_ref();
            if r.len() != width {
                return Err(MeshError::PlexitudeMismatch {
                    eltype: eltype.name(),
                    expected: width,
                    found: r.len(),
                });
            }
            nodes.extend_from_slice(r);
        }
        Ok(Self { eltype, nodes })
    }

    /// Wrap a buffer already known to fill whole rows.
    pub(crate) fn from_parts(eltype: ElementType, nodes: Vec<usize>) -> Self {
        debug_assert_eq!(nodes.len() % eltype.nplex(), 0);
        Self { eltype, nodes }
    }

    /// An empty table of the given type.
    pub fn empty(eltype: ElementType) -> Self {
        Self {
            eltype,
            nodes: Vec::new(),
        }
    }

    /// Element type tag.
    #[inline]
    pub fn eltype(&self) -> ElementType {
        self.eltype
    }

    /// Number of nodes per element.
    #[inline]
    pub fn nplex(&self) -> usize {
        self.eltype.nplex()
    }

    /// Number of elements (rows).
    #[inline]
    pub fn nelems(&self) -> usize {
        self.nodes.len() / self.nplex()
    }

    /// True if the table has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes of element `e`.
    #[inline]
    pub fn row(&self, e: usize) -> &[usize] {
        let w = self.nplex();
        &self.nodes[e * w..(e + 1) * w]
    }

    /// Iterates over the element rows.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, usize> {
        self.nodes.chunks_exact(self.nplex())
    }

    /// The flat row-major node buffer.
    #[inline]
    pub fn as_flat(&self) -> &[usize] {
        &self.nodes
    }

    /// Consumes the table, returning the flat node buffer.
    pub fn into_flat(self) -> Vec<usize> {
        self.nodes
    }

    /// Highest node number plus one (0 for an empty table).
    pub fn nnodes(&self) -> usize {
        self.nodes.iter().max().map_or(0, |&m| m + 1)
    }

    /// Check that every node index addresses one of `npoints` points.
    pub fn validate(&self, npoints: usize) -> Result<(), MeshError> {
        let w = self.nplex();
        match self.nodes.iter().position(|&n| n >= npoints) {
            None => Ok(()),
            Some(pos) => Err(MeshError::IndexOutOfRange {
                element: pos / w,
                slot: pos % w,
                index: self.nodes[pos],
                npoints,
            }),
        }
    }

    /// Flag the elements that contain a repeated node.
    pub fn test_degenerate(&self) -> Vec<bool> {
        self.rows().map(has_repeats).collect()
    }

    /// Numbers of the degenerate elements.
    pub fn list_degenerate(&self) -> Vec<usize> {
        flagged(&self.test_degenerate(), true)
    }

    /// Numbers of the non-degenerate elements.
    pub fn list_non_degenerate(&self) -> Vec<usize> {
        flagged(&self.test_degenerate(), false)
    }

    /// A table without the degenerate elements.
    pub fn remove_degenerate(&self) -> ElementTable {
        self.select(&self.list_non_degenerate())
    }

    /// Flag the rows that duplicate an earlier row.
    ///
    /// With `permutations`, rows with the same node set in any order count as
    /// duplicates; otherwise only identical rows do. The first occurrence is
    /// never flagged.
    pub fn test_duplicate(&self, permutations: bool) -> Vec<bool> {
        let mut seen: hashbrown::HashSet<RowKey> = hashbrown::HashSet::with_capacity(self.nelems());
        self.rows()
            .map(|r| !seen.insert(row_key(r, permutations)))
            .collect()
    }

    /// Numbers of the first occurrences of every distinct row.
    pub fn list_unique(&self, permutations: bool) -> Vec<usize> {
        flagged(&self.test_duplicate(permutations), false)
    }

    /// Numbers of the rows duplicating an earlier one.
    pub fn list_duplicate(&self, permutations: bool) -> Vec<usize> {
        flagged(&self.test_duplicate(permutations), true)
    }

    /// A table with the duplicate rows removed.
    pub fn remove_duplicate(&self, permutations: bool) -> ElementTable {
        self.select(&self.list_unique(permutations))
    }

    /// A table holding the elements at `elems`, in that order.
    pub fn select(&self, elems: &[usize]) -> ElementTable {
        let mut nodes = Vec::with_capacity(elems.len() * self.nplex());
        for &e in elems {
            nodes.extend_from_slice(self.row(e));
        }
        ElementTable {
            eltype: self.eltype,
            nodes,
        }
    }

    /// Expand every element into the rows described by `template`, without
    /// collapsing duplicates.
    ///
    /// The result has `nelems * template.nentities()` rows of type
    /// `template.eltype`, grouped per element.
    pub fn select_nodes(&self, template: &EntityTemplate) -> Result<ElementTable, MeshError> {
        if template.parent.nplex() != self.nplex() {
            return Err(MeshError::PlexitudeMismatch {
                eltype: template.parent.name(),
                expected: template.parent.nplex(),
                found: self.nplex(),
            });
        }
        let per_elem = template.nentities() * template.nplex();
        let total = self
            .nelems()
            .checked_mul(per_elem)
            .ok_or(MeshError::Overflow {
                what: "candidate entity slots",
                value: self.nelems() as u128 * per_elem as u128,
                limit: usize::MAX as u128,
            })?;
        let mut out = vec![0usize; total];
        if per_elem > 0 {
            let fill = |(dst, row): (&mut [usize], &[usize])| {
                for (d, &local) in dst.iter_mut().zip(template.rows().flatten()) {
                    *d = row[local];
                }
            };
            #[cfg(feature = "rayon")]
            out.par_chunks_mut(per_elem)
                .zip(self.nodes.par_chunks(self.nplex()))
                .for_each(fill);
            #[cfg(not(feature = "rayon"))]
            out.chunks_mut(per_elem).zip(self.rows()).for_each(fill);
        }
        Ok(ElementTable {
            eltype: template.eltype,
            nodes: out,
        })
    }

    /// Node → elements inverse index (over `0..nnodes()`).
    pub fn inverse(&self) -> InverseIndex {
        InverseIndex::build(&self.nodes, self.nplex(), self.nnodes())
    }

    /// Number of elements connected to each node (`0..nnodes()`).
    pub fn n_parents(&self) -> Vec<usize> {
        self.inverse().counts()
    }

    /// Elements containing at least one of `nodes`, with the number of such
    /// nodes each contains. Elements are ascending.
    pub fn connected_to(&self, nodes: &[usize]) -> (Vec<usize>, Vec<usize>) {
        let hits = self.hits(nodes);
        hits.iter()
            .enumerate()
            .filter(|&(_, &h)| h > 0)
            .map(|(e, &h)| (e, h))
            .unzip()
    }

    /// For every element, the number of its distinct nodes listed in `nodes`.
    pub fn hits(&self, nodes: &[usize]) -> Vec<usize> {
        let mut wanted = vec![false; self.nnodes()];
        for &n in nodes {
            if let Some(w) = wanted.get_mut(n) {
                *w = true;
            }
        }
        self.rows()
            .map(|r| {
                r.iter()
                    .enumerate()
                    .filter(|&(k, &n)| wanted[n] && !r[..k].contains(&n))
                    .count()
            })
            .collect()
    }

    /// Replace every node `n` with `map[n]`.
    pub fn remap(&self, map: &[usize]) -> Result<ElementTable, MeshError> {
        self.validate(map.len())?;
        Ok(ElementTable {
            eltype: self.eltype,
            nodes: self.nodes.iter().map(|&n| map[n]).collect(),
        })
    }
}

impl DebugInvariants for ElementTable {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "ElementTable");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        if self.nodes.len() % self.nplex() != 0 {
            return Err(MeshError::InvariantViolation(format!(
                "{} nodes do not fill rows of {}",
                self.nodes.len(),
                self.nplex()
            )));
        }
        Ok(())
    }
}

fn flagged(flags: &[bool], value: bool) -> Vec<usize> {
    flags
        .iter()
        .enumerate()
        .filter(|&(_, &f)| f == value)
        .map(|(i, _)| i)
        .collect()
}
