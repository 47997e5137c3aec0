//! Boundary ("free") entity extraction and classification.
//!
//! An entity is on the boundary when at most `max_owners` elements own it;
//! with the default of one this is the geometric border of the mesh: the
//! outer edges of a surface, the outer faces of a volume.

use serde::{Deserialize, Serialize};

use crate::algs::entities::{extract_entities, EntityIncidence};
use crate::data::elements::ElementTable;
use crate::mesh_error::MeshError;

/// Options for [`free_entities`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderOpts {
    /// Entities owned by at most this many elements are selected.
    pub max_owners: usize,
    /// Record an owning `(element, slot)` for every selected entity.
    pub provenance: bool,
}

impl Default for BorderOpts {
    fn default() -> Self {
        Self {
            max_owners: 1,
            provenance: true,
        }
    }
}

/// Selected boundary entities.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryEntitySet {
    /// Entity numbers (into the extraction's entity table), ascending.
    pub entity_ids: Vec<usize>,
    /// Node rows of the selected entities, in `entity_ids` order.
    pub entities: ElementTable,
    /// For every selected entity, its lowest owning element and the slot of
    /// the entity within that element.
    pub provenance: Option<Vec<(usize, usize)>>,
}

impl BoundaryEntitySet {
    #[inline]
    pub fn len(&self) -> usize {
        self.entity_ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entity_ids.is_empty()
    }
}

/// Classified boundary/interior entity sets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoundaryClassification {
    pub boundary: Vec<usize>,
    pub interior: Vec<usize>,
}

/// Split the entities of an extraction by owner count.
///
/// Entities with at most `max_owners` owners are boundary; the rest are
/// interior. Both lists are ascending and together cover every entity once.
pub fn classify_entities(ent: &EntityIncidence, max_owners: usize) -> BoundaryClassification {
    let mut boundary = Vec::new();
    let mut interior = Vec::new();
    for (t, count) in ent.incidence.owner_counts().into_iter().enumerate() {
        if count <= max_owners {
            boundary.push(t);
        } else {
            interior.push(t);
        }
    }
    BoundaryClassification { boundary, interior }
}

/// Select the entities owned by at most `opts.max_owners` elements.
pub fn free_entities(ent: &EntityIncidence, opts: &BorderOpts) -> BoundaryEntitySet {
    let inv = ent.incidence.inverse();
    let entity_ids: Vec<usize> = (0..inv.len())
        .filter(|&t| inv.count(t) <= opts.max_owners)
        .collect();
    let provenance = opts.provenance.then(|| {
        entity_ids
            .iter()
            .filter_map(|&t| {
                let &e = inv.owners(t).first()?;
                let slot = ent.incidence.row(e).iter().position(|&x| x == t)?;
                Some((e, slot))
            })
            .collect()
    });
    log::debug!(
        "{} of {} entities have at most {} owner(s)",
        entity_ids.len(),
        inv.len(),
        opts.max_owners
    );
    BoundaryEntitySet {
        entities: ent.entities.select(&entity_ids),
        entity_ids,
        provenance,
    }
}

/// The border of an element table: its free entities one level below the
/// element dimension (edges of a surface, faces of a volume).
pub fn border(elements: &ElementTable, opts: &BorderOpts) -> Result<BoundaryEntitySet, MeshError> {
    let ent = extract_entities(elements, -1)?;
    Ok(free_entities(&ent, opts))
}

/// Elements owning at least one border entity, ascending.
pub fn border_elements(elements: &ElementTable) -> Result<Vec<usize>, MeshError> {
    let ent = extract_entities(elements, -1)?;
    let counts = ent.incidence.owner_counts();
    Ok(ent
        .incidence
        .rows()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|&t| counts[t] <= 1))
        .map(|(e, _)| e)
        .collect())
}

/// Nodes on the border, ascending.
pub fn border_nodes(elements: &ElementTable) -> Result<Vec<usize>, MeshError> {
    let set = border(
        elements,
        &BorderOpts {
            provenance: false,
            ..BorderOpts::default()
        },
    )?;
    let mut nodes = set.entities.into_flat();
    nodes.sort_unstable();
    nodes.dedup();
    Ok(nodes)
}
