//! Node renumbering: compaction and point fusing of a mesh.

use crate::algs::fuse::{fuse, FuseOpts, FuseResult};
use crate::data::coordinates::PointArray;
use crate::data::elements::ElementTable;
use crate::mesh_error::MeshError;

/// Renumber the nodes of `elements` to `0..k` in order of first use.
///
/// Returns the renumbered table and, for every new number, the old one.
pub fn renumber_nodes(elements: &ElementTable) -> (ElementTable, Vec<usize>) {
    let mut new_of = vec![usize::MAX; elements.nnodes()];
    let mut old_of = Vec::new();
    let mut map = |n: usize| {
        if new_of[n] == usize::MAX {
            new_of[n] = old_of.len();
            old_of.push(n);
        }
        new_of[n]
    };
    let nodes: Vec<usize> = elements.as_flat().iter().map(|&n| map(n)).collect();
    let table = ElementTable::from_parts(elements.eltype(), nodes);
    (table, old_of)
}

/// Drop the points not used by any element and renumber the rest in order
/// of first use.
pub fn compact(
    points: &PointArray,
    elements: &ElementTable,
) -> Result<(PointArray, ElementTable), MeshError> {
    elements.validate(points.len())?;
    let (table, old_of) = renumber_nodes(elements);
    if old_of.len() < points.len() {
        log::debug!("compact: dropped {} unused points", points.len() - old_of.len());
    }
    Ok((points.take(&old_of), table))
}

/// Fuse the points of a mesh and renumber its elements accordingly.
///
/// Elements that collapse are kept; check them with
/// [`ElementTable::test_degenerate`].
pub fn fuse_mesh(
    points: &PointArray,
    elements: &ElementTable,
    opts: &FuseOpts,
) -> Result<(FuseResult, ElementTable), MeshError> {
    elements.validate(points.len())?;
    let fused = fuse(points, opts)?;
    let table = elements.remap(&fused.index)?;
    Ok((fused, table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::cell_type::ElementType;

    #[test]
    fn renumber_in_order_of_first_use() {
        let t = ElementTable::from_rows(ElementType::Line2, &[[7, 3], [3, 5]]).unwrap();
        let (r, old) = renumber_nodes(&t);
        assert_eq!(r.as_flat(), &[0, 1, 1, 2]);
        assert_eq!(old, vec![7, 3, 5]);
    }

    #[test]
    fn compact_drops_unused_points() {
        let pts = PointArray::from_rows(vec![[0.0; 3], [1.0; 3], [2.0; 3], [3.0; 3]]);
        let t = ElementTable::from_rows(ElementType::Line2, &[[3, 1]]).unwrap();
        let (p, e) = compact(&pts, &t).unwrap();
        assert_eq!(p.as_rows(), &[[3.0; 3], [1.0; 3]]);
        assert_eq!(e.as_flat(), &[0, 1]);
        let bad = ElementTable::from_rows(ElementType::Line2, &[[0, 4]]).unwrap();
        assert!(compact(&pts, &bad).is_err());
    }

    #[test]
    fn fused_mesh_shares_nodes() {
        // two segments generated separately, meeting at x = 1
        let pts = PointArray::from_rows(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0 + 1e-7, 0.0, 0.0],
            [2.0, 0.0, 0.0],
        ]);
        let t = ElementTable::from_rows(ElementType::Line2, &[[0, 1], [2, 3]]).unwrap();
        let (fused, e) = fuse_mesh(&pts, &t, &FuseOpts::default()).unwrap();
        assert_eq!(fused.points.len(), 3);
        assert_eq!(e.as_flat(), &[0, 1, 1, 2]);
    }
}
