//! A points + elements pair with cached topology.
//!
//! [`Mesh`] is a thin delegation layer: every method forwards to a kernel
//! function in [`crate::algs`], feeding it cached entities and adjacency
//! where possible. It never mutates its arrays in place; operations that
//! change the mesh return a new one.

use std::sync::Arc;

use crate::algs::adjacency_graph::AdjacencyList;
use crate::algs::boundary::{free_entities, BorderOpts, BoundaryEntitySet};
use crate::algs::entities::EntityIncidence;
use crate::algs::fuse::FuseOpts;
use crate::algs::manifold;
use crate::algs::partition;
use crate::algs::renumber::{compact, fuse_mesh};
use crate::algs::traversal::{FrontWalk, FrontWalkOpts};
use crate::data::coordinates::PointArray;
use crate::data::elements::ElementTable;
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshError;
use crate::topology::cache::{InvalidateCache, TopologyCache};
use crate::topology::cell_type::ElementType;

#[derive(Debug)]
pub struct Mesh {
    points: PointArray,
    elements: Arc<ElementTable>,
    cache: TopologyCache,
}

impl Mesh {
    /// Build a mesh; every node must address one of `points`.
    pub fn new(points: PointArray, elements: ElementTable) -> Result<Self, MeshError> {
        elements.validate(points.len())?;
        elements.debug_assert_invariants();
        let elements = Arc::new(elements);
        Ok(Self {
            cache: TopologyCache::new(elements.clone()),
            points,
            elements,
        })
    }

    #[inline]
    pub fn points(&self) -> &PointArray {
        &self.points
    }

    #[inline]
    pub fn elements(&self) -> &ElementTable {
        &self.elements
    }

    /// Shared handle to the element table.
    pub fn elements_arc(&self) -> &Arc<ElementTable> {
        &self.elements
    }

    #[inline]
    pub fn eltype(&self) -> ElementType {
        self.elements.eltype()
    }

    #[inline]
    pub fn npoints(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn nelems(&self) -> usize {
        self.elements.nelems()
    }

    /// Replace the element table, dropping cached topology.
    pub fn set_elements(&mut self, elements: Arc<ElementTable>) -> Result<(), MeshError> {
        elements.validate(self.points.len())?;
        self.elements = elements;
        if !self.cache.is_for(&self.elements) {
            self.cache = TopologyCache::new(self.elements.clone());
        }
        Ok(())
    }

    /// Merge coincident points and renumber the elements.
    pub fn fuse(&self, opts: &FuseOpts) -> Result<Mesh, MeshError> {
        let (fused, elements) = fuse_mesh(&self.points, &self.elements, opts)?;
        Mesh::new(fused.points, elements)
    }

    /// Drop unused points.
    pub fn compact(&self) -> Result<Mesh, MeshError> {
        let (points, elements) = compact(&self.points, &self.elements)?;
        Mesh::new(points, elements)
    }

    pub fn entities(&self, level: i32) -> Result<&EntityIncidence, MeshError> {
        self.cache.entities(level)
    }

    pub fn adjacency(&self, level: i32) -> Result<&AdjacencyList, MeshError> {
        self.cache.adjacency(level)
    }

    pub fn adjacency_excluding(
        &self,
        level: i32,
        exclude_level: i32,
    ) -> Result<AdjacencyList, MeshError> {
        self.cache.adjacency_excluding(level, Some(exclude_level))
    }

    /// Front walk over the elements, connected through entities of `level`.
    pub fn front_walk(
        &self,
        level: i32,
        seeds: &[usize],
        opts: &FrontWalkOpts,
    ) -> Result<Vec<i32>, MeshError> {
        FrontWalk::new(self.adjacency(level)?)
            .seeds(seeds.iter().copied())
            .opts(*opts)
            .run()
    }

    /// Number the parts connected through entities of `level`.
    pub fn partition_by_connection(&self, level: i32, sort_by_size: bool) -> Result<Vec<i32>, MeshError> {
        partition::partition_by_connection(self.adjacency(level)?, sort_by_size, None)
    }

    pub fn grow_selection(
        &self,
        selection: &[usize],
        level: i32,
        nsteps: Option<u32>,
    ) -> Result<Vec<usize>, MeshError> {
        partition::grow_selection(self.adjacency(level)?, selection, nsteps)
    }

    /// Free entities at `level`.
    pub fn free_entities(&self, level: i32, opts: &BorderOpts) -> Result<BoundaryEntitySet, MeshError> {
        Ok(free_entities(self.entities(level)?, opts))
    }

    /// Free entities one level below the element dimension.
    pub fn border(&self, opts: &BorderOpts) -> Result<BoundaryEntitySet, MeshError> {
        self.free_entities(-1, opts)
    }

    /// The border as a mesh sharing this mesh's points.
    pub fn border_mesh(&self) -> Result<Mesh, MeshError> {
        let set = self.border(&BorderOpts {
            provenance: false,
            ..BorderOpts::default()
        })?;
        Mesh::new(self.points.clone(), set.entities)
    }

    pub fn non_manifold_nodes(&self) -> Result<Vec<usize>, MeshError> {
        manifold::non_manifold_nodes(&self.elements)
    }
}

impl InvalidateCache for Mesh {
    fn invalidate_cache(&mut self) {
        self.cache.invalidate_cache();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Mesh {
        let pts = PointArray::from_rows(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]);
        let els = ElementTable::from_rows(ElementType::Tri3, &[[0, 1, 2], [0, 2, 3]]).unwrap();
        Mesh::new(pts, els).unwrap()
    }

    #[test]
    fn rejects_out_of_range_nodes() {
        let els = ElementTable::from_rows(ElementType::Line2, &[[0, 2]]).unwrap();
        assert!(matches!(
            Mesh::new(PointArray::from_rows(vec![[0.0; 3]; 2]), els),
            Err(MeshError::IndexOutOfRange { index: 2, .. })
        ));
    }

    #[test]
    fn border_of_a_square() {
        let m = square();
        assert_eq!(m.border(&BorderOpts::default()).unwrap().len(), 4);
        let b = m.border_mesh().unwrap();
        assert_eq!(b.eltype(), ElementType::Line2);
        assert_eq!(b.nelems(), 4);
    }

    #[test]
    fn replacing_elements_resets_cache() {
        let mut m = square();
        assert_eq!(m.entities(1).unwrap().nentities(), 5);
        let doubled = ElementTable::from_rows(ElementType::Tri3, &[[0, 1, 2], [2, 1, 0]]).unwrap();
        m.set_elements(Arc::new(doubled)).unwrap();
        assert_eq!(m.entities(1).unwrap().nentities(), 3);
        assert_eq!(m.adjacency(1).unwrap().neighbors(0), &[1]);
    }
}
