mod util;

use topomesh::prelude::*;
use util::*;

#[test]
fn soup_fuses_into_a_connected_grid() {
    let (pts, els) = triangle_soup(3, 2);
    let soup = Mesh::new(pts, els).unwrap();
    // before welding every triangle stands alone
    assert_eq!(soup.border(&BorderOpts::default()).unwrap().len(), 36);
    assert_eq!(
        soup.partition_by_connection(0, false).unwrap().iter().max(),
        Some(&11)
    );

    let mesh = soup.fuse(&FuseOpts::default()).unwrap();
    assert_eq!(mesh.npoints(), 12);
    assert_eq!(mesh.nelems(), 12);
    assert_eq!(mesh.border(&BorderOpts::default()).unwrap().len(), 10);
    assert!(mesh.partition_by_connection(1, true).unwrap().iter().all(|&l| l == 0));

    let border = mesh.border_mesh().unwrap();
    assert_eq!(border.eltype(), ElementType::Line2);
    assert_eq!(border.compact().unwrap().npoints(), 10);
}

#[test]
fn cached_topology_is_reused_until_invalidated() {
    let (pts, els) = hex_grid(2);
    let mut mesh = Mesh::new(pts, els).unwrap();
    let a = mesh.entities(2).unwrap() as *const EntityIncidence;
    let b = mesh.entities(-1).unwrap() as *const EntityIncidence;
    assert_eq!(a, b);
    assert_eq!(mesh.adjacency(2).unwrap().degree(0), 3);
    mesh.invalidate_cache();
    assert_eq!(mesh.entities(2).unwrap().nentities(), 36);
}

#[test]
fn front_walk_through_the_mesh() {
    let (pts, els) = quad_grid(4, 1);
    let mesh = Mesh::new(pts, els).unwrap();
    let labels = mesh.front_walk(1, &[0], &FrontWalkOpts::default()).unwrap();
    assert_eq!(labels, vec![0, 1, 2, 3]);
    let corner_only = mesh.adjacency_excluding(0, 1).unwrap();
    assert_eq!(corner_only.nedges(), 0);
    assert_eq!(mesh.grow_selection(&[0], 1, Some(1)).unwrap(), vec![0, 1]);
}

#[test]
fn options_deserialize_with_defaults() {
    let border: BorderOpts = serde_json::from_str(r#"{"max_owners": 2}"#).unwrap();
    assert_eq!(border.max_owners, 2);
    assert!(border.provenance);

    let walk: FrontWalkOpts = serde_json::from_str(r#"{"max_level": 3}"#).unwrap();
    assert_eq!(
        walk,
        FrontWalkOpts {
            max_level: Some(3),
            ..FrontWalkOpts::default()
        }
    );

    let adj: AdjacencyOpts = serde_json::from_str(r#"{"level": -1, "exclude_level": null}"#).unwrap();
    assert_eq!(adj.level, -1);

    let et: ElementType = serde_json::from_str(r#""hex8""#).unwrap();
    assert_eq!(et, ElementType::Hex8);
    assert_eq!("Tri3".parse::<ElementType>().unwrap(), ElementType::Tri3);
}

#[test]
fn non_manifold_nodes_of_a_bowtie_mesh() {
    let pts = PointArray::from_rows(vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [-1.0, 0.0, 0.0],
        [-1.0, -1.0, 0.0],
    ]);
    let els = ElementTable::from_rows(ElementType::Tri3, &[[0, 1, 2], [0, 3, 4]]).unwrap();
    let mesh = Mesh::new(pts, els).unwrap();
    assert_eq!(mesh.non_manifold_nodes().unwrap(), vec![0]);
}

#[test]
fn errors_surface_through_the_mesh() {
    let (pts, els) = line_mesh(2);
    let mesh = Mesh::new(pts, els).unwrap();
    assert!(matches!(mesh.entities(2), Err(MeshError::InvalidLevel { .. })));
    assert!(matches!(
        mesh.front_walk(0, &[9], &FrontWalkOpts::default()),
        Err(MeshError::InvalidSeed { .. })
    ));
    let bad = FuseOpts {
        points_per_bucket: 0,
        ..FuseOpts::default()
    };
    assert_eq!(mesh.fuse(&bad).unwrap_err().kind(), ErrorKind::InvalidArgument);
}
