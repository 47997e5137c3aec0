//! Cache invalidation utilities and the per-table topology cache.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::algs::adjacency_graph::{adjacency_at_level, build_adjacency, resolve_levels, AdjacencyList};
use crate::algs::entities::{extract_entities, EntityIncidence};
use crate::data::elements::ElementTable;
use crate::mesh_error::MeshError;

/// Anything that caches derived topology (entities, adjacency, …)
/// should implement this.
pub trait InvalidateCache {
    /// Invalidate *all* internal caches so future queries recompute correctly.
    fn invalidate_cache(&mut self);
}

// Blanket impl for Box<T>
impl<T: InvalidateCache + ?Sized> InvalidateCache for Box<T> {
    #[inline]
    fn invalidate_cache(&mut self) {
        (**self).invalidate_cache();
    }
}

/// Number of cached levels (nodes, edges, faces, volumes).
const NLEVELS: usize = 4;

/// Lazily computed entities and adjacency of one element table.
///
/// The cache is bound to a specific `Arc<ElementTable>`: [`is_for`] compares
/// pointers, so a table with equal contents at another address never hits.
///
/// [`is_for`]: TopologyCache::is_for
#[derive(Debug)]
pub struct TopologyCache {
    elements: Arc<ElementTable>,
    entities: [OnceCell<EntityIncidence>; NLEVELS],
    adjacency: [OnceCell<AdjacencyList>; NLEVELS],
}

impl TopologyCache {
    pub fn new(elements: Arc<ElementTable>) -> Self {
        Self {
            elements,
            entities: std::array::from_fn(|_| OnceCell::new()),
            adjacency: std::array::from_fn(|_| OnceCell::new()),
        }
    }

    pub fn elements(&self) -> &Arc<ElementTable> {
        &self.elements
    }

    /// True if this cache was built for exactly this table.
    #[inline]
    pub fn is_for(&self, elements: &Arc<ElementTable>) -> bool {
        Arc::ptr_eq(&self.elements, elements)
    }

    /// Entities at `level` (negative counts from the element dimension).
    pub fn entities(&self, level: i32) -> Result<&EntityIncidence, MeshError> {
        let lvl = self.elements.eltype().resolve_level(level)?;
        self.entities[usize::from(lvl)]
            .get_or_try_init(|| extract_entities(&self.elements, i32::from(lvl)))
    }

    /// Element adjacency through shared entities of `level`.
    pub fn adjacency(&self, level: i32) -> Result<&AdjacencyList, MeshError> {
        let lvl = self.elements.eltype().resolve_level(level)?;
        self.adjacency_at(lvl)
    }

    /// Element adjacency at `level` without the pairs that also share an
    /// entity of `exclude_level`. Only the two plain adjacencies are cached.
    pub fn adjacency_excluding(
        &self,
        level: i32,
        exclude_level: Option<i32>,
    ) -> Result<AdjacencyList, MeshError> {
        let (lvl, excl) = resolve_levels(self.elements.eltype(), level, exclude_level)?;
        let adj = self.adjacency_at(lvl)?;
        Ok(match excl {
            Some(x) => adj.exclude(self.adjacency_at(x)?),
            None => adj.clone(),
        })
    }

    fn adjacency_at(&self, lvl: u8) -> Result<&AdjacencyList, MeshError> {
        self.adjacency[usize::from(lvl)].get_or_try_init(|| {
            if lvl == 0 {
                adjacency_at_level(&self.elements, 0)
            } else {
                Ok(build_adjacency(&self.entities(i32::from(lvl))?.incidence))
            }
        })
    }

    /// Number of levels with cached data.
    pub fn cached_levels(&self) -> usize {
        (0..NLEVELS)
            .filter(|&l| self.entities[l].get().is_some() || self.adjacency[l].get().is_some())
            .count()
    }
}

impl InvalidateCache for TopologyCache {
    fn invalidate_cache(&mut self) {
        for cell in &mut self.entities {
            cell.take();
        }
        for cell in &mut self.adjacency {
            cell.take();
        }
    }
}
