//! Lower-entity extraction: the edges, faces or vertices of an element table.
//!
//! Every element is expanded through an [`EntityTemplate`] into candidate
//! rows of global node numbers. Candidates are deduplicated on an exact
//! integer key (the sorted node tuple, or the row itself when permutations
//! are not merged). Entities are numbered in order of first occurrence and keep
//! the node order of that first occurrence.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::algs::progress::{report, ProgressHook, Stage, REPORT_EVERY};
use crate::data::elements::{row_key, ElementTable, RowKey};
use crate::debug_invariants::{validate_csr, DebugInvariants};
use crate::mesh_error::MeshError;
use crate::topology::cell_type::{has_repeats, EntityTemplate, MAX_PLEX};
use crate::topology::inverse::InverseIndex;

/// Options for [`extract_entities_with`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityOpts {
    /// Treat rows with the same node set in a different order as one entity.
    pub permutations: bool,
}

impl Default for EntityOpts {
    fn default() -> Self {
        Self { permutations: true }
    }
}

/// Element → entity incidence: row `e`, slot `k` holds the entity number of
/// element `e`'s `k`-th local entity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IncidenceTable {
    width: usize,
    data: Vec<usize>,
    nentities: usize,
}

impl IncidenceTable {
    /// Wrap a flat row-major buffer of entity numbers in `0..nentities`.
    pub fn new(width: usize, data: Vec<usize>, nentities: usize) -> Result<Self, MeshError> {
        if width == 0 || data.len() % width != 0 {
            return Err(MeshError::ShapeMismatch {
                len: data.len(),
                width,
            });
        }
        if let Some(pos) = data.iter().position(|&v| v >= nentities) {
            return Err(MeshError::IndexOutOfRange {
                element: pos / width,
                slot: pos % width,
                index: data[pos],
                npoints: nentities,
            });
        }
        Ok(Self {
            width,
            data,
            nentities,
        })
    }

    /// Entities per element.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn nelems(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.data.len() / self.width
        }
    }

    /// Number of distinct entities referenced.
    #[inline]
    pub fn nentities(&self) -> usize {
        self.nentities
    }

    #[inline]
    pub fn row(&self, e: usize) -> &[usize] {
        &self.data[e * self.width..(e + 1) * self.width]
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, usize> {
        self.data.chunks_exact(self.width.max(1))
    }

    #[inline]
    pub fn as_flat(&self) -> &[usize] {
        &self.data
    }

    /// Entity → owning elements.
    pub fn inverse(&self) -> InverseIndex {
        InverseIndex::build(&self.data, self.width, self.nentities)
    }

    /// Number of elements owning each entity.
    pub fn owner_counts(&self) -> Vec<usize> {
        self.inverse().counts()
    }
}

/// Result of one entity extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityIncidence {
    /// Resolved (non-negative) entity level.
    pub level: u8,
    /// Element → entity numbers.
    pub incidence: IncidenceTable,
    /// The unique entities, in order of first occurrence.
    pub entities: ElementTable,
    /// Per entity: true if it has fewer distinct nodes than its template row
    /// (e.g. an edge `(4, 4)`).
    pub degenerate: Vec<bool>,
    /// Per element: true if any of its entities is degenerate.
    pub degenerate_elements: Vec<bool>,
}

impl EntityIncidence {
    #[inline]
    pub fn nentities(&self) -> usize {
        self.entities.nelems()
    }

    /// Numbers of the degenerate entities.
    pub fn list_degenerate(&self) -> Vec<usize> {
        (0..self.degenerate.len())
            .filter(|&i| self.degenerate[i])
            .collect()
    }
}

/// Extract the entities of `elements` at `level` (negative counts down from
/// the element dimension) with default options.
pub fn extract_entities(elements: &ElementTable, level: i32) -> Result<EntityIncidence, MeshError> {
    let template = elements.eltype().entities(level)?;
    extract_entities_with(elements, &template, &EntityOpts::default())
}

/// Extract entities using an explicit template.
pub fn extract_entities_with(
    elements: &ElementTable,
    template: &EntityTemplate,
    opts: &EntityOpts,
) -> Result<EntityIncidence, MeshError> {
    extract_entities_with_progress(elements, template, opts, None)
}

/// [`extract_entities_with`] with a progress/cancellation hook.
pub fn extract_entities_with_progress(
    elements: &ElementTable,
    template: &EntityTemplate,
    opts: &EntityOpts,
    hook: Option<ProgressHook<'_>>,
) -> Result<EntityIncidence, MeshError> {
    let level = template.eltype.dimension();
    let width = template.nentities();
    let candidates = elements.select_nodes(template)?;
    let ncand = candidates.nelems();

    let mut ids: HashMap<RowKey, usize> = HashMap::with_capacity(ncand / 2 + 1);
    let mut first: Vec<usize> = Vec::new();
    let mut degenerate: Vec<bool> = Vec::new();
    let mut degenerate_elements = vec![false; elements.nelems()];
    let mut data = Vec::with_capacity(ncand);
    let mut nodes = [0usize; MAX_PLEX];
    for (c, row) in candidates.rows().enumerate() {
        if c % REPORT_EVERY == 0 {
            report(hook, Stage::EntityDedup, c, ncand)?;
        }
        // repeats written into the template (wedge end faces) are not part
        // of the key and do not make the entity degenerate
        let n = template.gather_distinct(c % width, row, &mut nodes);
        let collapsed = has_repeats(&nodes[..n]);
        let id = *ids
            .entry(row_key(&nodes[..n], opts.permutations))
            .or_insert_with(|| {
                first.push(c);
                degenerate.push(collapsed);
                first.len() - 1
            });
        if collapsed {
            degenerate_elements[c / width] = true;
        }
        data.push(id);
    }
    report(hook, Stage::EntityDedup, ncand, ncand)?;

    let entities = candidates.select(&first);
    let ndegen = degenerate.iter().filter(|&&d| d).count();
    if ndegen > 0 {
        log::warn!(
            "{} of {} {} entities of {} elements are degenerate",
            ndegen,
            degenerate.len(),
            template.eltype,
            elements.eltype()
        );
    }
    log::debug!(
        "extracted {} unique {} entities (level {level}) from {} candidates",
        first.len(),
        template.eltype,
        ncand
    );

    let nentities = first.len();
    let out = EntityIncidence {
        level,
        incidence: IncidenceTable {
            width,
            data,
            nentities,
        },
        entities,
        degenerate,
        degenerate_elements,
    };
    crate::debug_invariants!(out.validate_invariants(), "extract_entities");
    Ok(out)
}

impl DebugInvariants for EntityIncidence {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "EntityIncidence");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        let n = self.nentities();
        if self.incidence.nentities != n || self.degenerate.len() != n {
            return Err(MeshError::InvariantViolation(format!(
                "entity count mismatch: table {n}, incidence {}, flags {}",
                self.incidence.nentities,
                self.degenerate.len()
            )));
        }
        if self.degenerate_elements.len() != self.incidence.nelems() {
            return Err(MeshError::InvariantViolation(
                "element flag count differs from element count".into(),
            ));
        }
        // every entity is owned by at least one element
        let inv = self.incidence.inverse();
        validate_csr("entity owners", &inv.xadj, &inv.owners, self.incidence.nelems())?;
        if let Some(t) = (0..inv.len()).find(|&t| inv.count(t) == 0) {
            return Err(MeshError::InvariantViolation(format!(
                "entity {t} has no owner"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::cell_type::ElementType;

    fn tri(rows: &[[usize; 3]]) -> ElementTable {
        ElementTable::from_rows(ElementType::Tri3, rows).unwrap()
    }

    #[test]
    fn two_triangles_share_one_edge() {
        let ent = extract_entities(&tri(&[[0, 1, 2], [1, 3, 2]]), 1).unwrap();
        assert_eq!(ent.nentities(), 5);
        assert_eq!(ent.entities.as_flat(), &[0, 1, 1, 2, 2, 0, 1, 3, 3, 2]);
        assert_eq!(ent.incidence.row(0), &[0, 1, 2]);
        assert_eq!(ent.incidence.row(1), &[3, 4, 1]);
        assert_eq!(ent.incidence.owner_counts(), vec![1, 2, 1, 1, 1]);
        assert!(ent.degenerate.iter().all(|&d| !d));
    }

    #[test]
    fn first_orientation_is_kept() {
        let ent = extract_entities(&tri(&[[2, 1, 0], [0, 1, 2]]), 1).unwrap();
        assert_eq!(ent.nentities(), 3);
        assert_eq!(ent.entities.row(0), &[2, 1]);
    }

    #[test]
    fn without_permutations_reversed_edges_differ() {
        let els = tri(&[[0, 1, 2], [1, 3, 2]]);
        let tpl = ElementType::Tri3.entities(1).unwrap();
        let ent = extract_entities_with(&els, &tpl, &EntityOpts { permutations: false }).unwrap();
        assert_eq!(ent.nentities(), 6);
    }

    #[test]
    fn degenerate_edges_are_flagged_not_dropped() {
        let ent = extract_entities(&tri(&[[0, 1, 1], [0, 1, 2]]), 1).unwrap();
        assert_eq!(ent.list_degenerate(), vec![1]);
        assert_eq!(ent.entities.row(1), &[1, 1]);
        assert_eq!(ent.degenerate_elements, vec![true, false]);
    }

    #[test]
    fn stacked_wedges_share_their_end_triangle() {
        let w = ElementTable::from_rows(
            ElementType::Wedge6,
            &[[0, 1, 2, 3, 4, 5], [3, 4, 5, 6, 7, 8]],
        )
        .unwrap();
        let ent = extract_entities(&w, 2).unwrap();
        assert_eq!(ent.nentities(), 9);
        assert_eq!(ent.incidence.row(0)[1], ent.incidence.row(1)[0]);
        assert!(ent.list_degenerate().is_empty());
        assert_eq!(ent.degenerate_elements, vec![false, false]);
    }

    #[test]
    fn collapsed_wedge_is_flagged() {
        let w = ElementTable::from_rows(
            ElementType::Wedge6,
            &[[0, 1, 1, 3, 4, 4], [3, 4, 5, 6, 7, 8]],
        )
        .unwrap();
        let ent = extract_entities(&w, 2).unwrap();
        assert_eq!(ent.degenerate_elements, vec![true, false]);
        // both end triangles and the quad over the collapsed edge
        assert_eq!(ent.list_degenerate(), vec![0, 1, 3]);
    }

    #[test]
    fn repeated_nodes_are_not_merged() {
        let ent = extract_entities(&tri(&[[0, 0, 1], [0, 1, 1]]), 2).unwrap();
        assert_eq!(ent.nentities(), 2);
        assert_eq!(ent.incidence.as_flat(), &[0, 1]);
        assert_eq!(ent.degenerate, vec![true, true]);
    }

    #[test]
    fn empty_table_gives_empty_result() {
        let ent = extract_entities(&ElementTable::empty(ElementType::Hex8), 2).unwrap();
        assert_eq!(ent.nentities(), 0);
        assert_eq!(ent.incidence.nelems(), 0);
        assert_eq!(ent.incidence.width(), 6);
        assert!(ent.validate_invariants().is_ok());
    }

    #[test]
    fn incidence_table_checks_range() {
        assert!(IncidenceTable::new(2, vec![0, 1, 1, 2], 3).is_ok());
        assert!(matches!(
            IncidenceTable::new(2, vec![0, 1, 1, 3], 3),
            Err(MeshError::IndexOutOfRange { element: 1, slot: 1, .. })
        ));
        assert!(IncidenceTable::new(0, vec![], 0).is_err());
    }
}
