mod util;

use proptest::prelude::*;
use topomesh::algs::boundary::{
    border, border_elements, border_nodes, classify_entities, free_entities, BorderOpts,
};
use topomesh::algs::entities::extract_entities;
use topomesh::algs::manifold::{non_manifold_edges, non_manifold_nodes};
use topomesh::data::elements::ElementTable;
use topomesh::topology::cell_type::ElementType;
use util::*;

fn fan() -> ElementTable {
    ElementTable::from_rows(ElementType::Tri3, &[[0, 1, 2], [0, 2, 3], [0, 3, 4]]).unwrap()
}

#[test]
fn fan_border_skips_inner_edges() {
    let set = border(&fan(), &BorderOpts::default()).unwrap();
    assert_eq!(set.len(), 5);
    let mut edges: Vec<Vec<usize>> = set.entities.rows().map(sorted).collect();
    edges.sort();
    assert_eq!(
        edges,
        vec![vec![0, 1], vec![0, 4], vec![1, 2], vec![2, 3], vec![3, 4]]
    );
    assert!(!edges.contains(&vec![0, 2]));
    assert!(!edges.contains(&vec![0, 3]));
}

#[test]
fn provenance_points_back_at_the_owner() {
    let els = fan();
    let ent = extract_entities(&els, 1).unwrap();
    let set = free_entities(&ent, &BorderOpts::default());
    let prov = set.provenance.as_ref().unwrap();
    assert_eq!(prov.len(), set.len());
    for (k, &(e, slot)) in prov.iter().enumerate() {
        assert_eq!(ent.incidence.row(e)[slot], set.entity_ids[k]);
    }
    let bare = free_entities(
        &ent,
        &BorderOpts {
            provenance: false,
            ..BorderOpts::default()
        },
    );
    assert!(bare.provenance.is_none());
    assert_eq!(bare.entity_ids, set.entity_ids);
}

#[test]
fn cube_of_hexes_has_six_n_squared_faces() {
    for n in 1..=3 {
        let (_, els) = hex_grid(n);
        let set = border(&els, &BorderOpts::default()).unwrap();
        assert_eq!(set.len(), 6 * n * n);
        assert_eq!(set.entities.eltype(), ElementType::Quad4);
    }
    let (_, els) = hex_grid(3);
    // every hex but the centre one touches the border
    assert_eq!(border_elements(&els).unwrap().len(), 26);
    assert_eq!(border_nodes(&els).unwrap().len(), 64 - 8);
}

#[test]
fn raising_max_owners_selects_shared_entities() {
    let (_, els) = quad_grid(2, 2);
    let ent = extract_entities(&els, 1).unwrap();
    let all = free_entities(
        &ent,
        &BorderOpts {
            max_owners: 2,
            ..BorderOpts::default()
        },
    );
    assert_eq!(all.len(), ent.nentities());
}

#[test]
fn closed_surface_has_no_border() {
    // tetrahedron surface
    let els = ElementTable::from_rows(
        ElementType::Tri3,
        &[[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]],
    )
    .unwrap();
    assert!(border(&els, &BorderOpts::default()).unwrap().is_empty());
    assert!(non_manifold_nodes(&els).unwrap().is_empty());
}

#[test]
fn bowtie_is_non_manifold_at_the_knot() {
    let els = ElementTable::from_rows(ElementType::Tri3, &[[0, 1, 2], [0, 3, 4]]).unwrap();
    assert_eq!(non_manifold_nodes(&els).unwrap(), vec![0]);
    let (_, grid) = quad_grid(3, 3);
    assert!(non_manifold_nodes(&grid).unwrap().is_empty());
}

#[test]
fn tets_hinged_on_an_edge() {
    let els = ElementTable::from_rows(ElementType::Tet4, &[[0, 1, 2, 3], [0, 1, 4, 5]]).unwrap();
    let bad = non_manifold_edges(&els).unwrap();
    assert_eq!(bad.len(), 1);
    let edges = extract_entities(&els, 1).unwrap();
    assert_eq!(sorted(edges.entities.row(bad[0])), vec![0, 1]);
    // surface tables have no non-manifold edges to report
    assert!(non_manifold_edges(&fan()).unwrap().is_empty());
}

proptest! {
    #[test]
    fn boundary_and_interior_partition_the_entities(
        els in tri_table_strategy(10, 30),
        max_owners in 0usize..4,
    ) {
        let ent = extract_entities(&els, 1).unwrap();
        let split = classify_entities(&ent, max_owners);
        let mut all: Vec<usize> = split.boundary.iter().chain(&split.interior).copied().collect();
        all.sort_unstable();
        prop_assert_eq!(all, (0..ent.nentities()).collect::<Vec<_>>());
        let counts = ent.incidence.owner_counts();
        for &t in &split.boundary {
            prop_assert!(counts[t] <= max_owners);
        }
        let set = free_entities(&ent, &BorderOpts { max_owners, provenance: false });
        prop_assert_eq!(set.entity_ids, split.boundary);
    }
}
