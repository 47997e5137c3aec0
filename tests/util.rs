#![allow(dead_code)]
use std::collections::VecDeque;

use proptest::prelude::*;
use topomesh::algs::adjacency_graph::AdjacencyList;
use topomesh::data::coordinates::PointArray;
use topomesh::data::elements::ElementTable;
use topomesh::topology::cell_type::ElementType;

/// `n` unit segments laid end to end along x.
pub fn line_mesh(n: usize) -> (PointArray, ElementTable) {
    let pts = (0..=n).map(|i| [i as f64, 0.0, 0.0]).collect::<Vec<_>>();
    let rows: Vec<[usize; 2]> = (0..n).map(|i| [i, i + 1]).collect();
    (
        PointArray::from_rows(pts),
        ElementTable::from_rows(ElementType::Line2, &rows).unwrap(),
    )
}

/// Structured `nx` x `ny` grid of unit quads in the xy plane.
pub fn quad_grid(nx: usize, ny: usize) -> (PointArray, ElementTable) {
    let mut pts = Vec::new();
    for j in 0..=ny {
        for i in 0..=nx {
            pts.push([i as f64, j as f64, 0.0]);
        }
    }
    let id = |i: usize, j: usize| j * (nx + 1) + i;
    let mut rows = Vec::new();
    for j in 0..ny {
        for i in 0..nx {
            rows.push([id(i, j), id(i + 1, j), id(i + 1, j + 1), id(i, j + 1)]);
        }
    }
    (
        PointArray::from_rows(pts),
        ElementTable::from_rows(ElementType::Quad4, &rows).unwrap(),
    )
}

/// Structured `n` x `n` x `n` grid of unit hexahedra.
pub fn hex_grid(n: usize) -> (PointArray, ElementTable) {
    let m = n + 1;
    let mut pts = Vec::new();
    for k in 0..m {
        for j in 0..m {
            for i in 0..m {
                pts.push([i as f64, j as f64, k as f64]);
            }
        }
    }
    let id = |i: usize, j: usize, k: usize| (k * m + j) * m + i;
    let mut rows = Vec::new();
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                rows.push([
                    id(i, j, k),
                    id(i + 1, j, k),
                    id(i + 1, j + 1, k),
                    id(i, j + 1, k),
                    id(i, j, k + 1),
                    id(i + 1, j, k + 1),
                    id(i + 1, j + 1, k + 1),
                    id(i, j + 1, k + 1),
                ]);
            }
        }
    }
    (
        PointArray::from_rows(pts),
        ElementTable::from_rows(ElementType::Hex8, &rows).unwrap(),
    )
}

/// Triangulated grid where every triangle owns private copies of its three
/// corner points, the way independently generated elements come out.
pub fn triangle_soup(nx: usize, ny: usize) -> (PointArray, ElementTable) {
    let mut pts = Vec::new();
    let mut rows = Vec::new();
    for j in 0..ny {
        for i in 0..nx {
            let (x, y) = (i as f64, j as f64);
            for tri in [
                [[x, y, 0.0], [x + 1.0, y, 0.0], [x + 1.0, y + 1.0, 0.0]],
                [[x, y, 0.0], [x + 1.0, y + 1.0, 0.0], [x, y + 1.0, 0.0]],
            ] {
                let base = pts.len();
                pts.extend(tri);
                rows.push([base, base + 1, base + 2]);
            }
        }
    }
    (
        PointArray::from_rows(pts),
        ElementTable::from_rows(ElementType::Tri3, &rows).unwrap(),
    )
}

/// Reference multi-source BFS distances (`-1` when unreachable).
pub fn bfs_distances(adj: &AdjacencyList, seeds: &[usize]) -> Vec<i32> {
    let mut dist = vec![-1; adj.len()];
    let mut q = VecDeque::new();
    for &s in seeds {
        if dist[s] < 0 {
            dist[s] = 0;
            q.push_back(s);
        }
    }
    while let Some(u) = q.pop_front() {
        for &v in adj.neighbors(u) {
            if dist[v] < 0 {
                dist[v] = dist[u] + 1;
                q.push_back(v);
            }
        }
    }
    dist
}

/// Sorted copy of a row.
pub fn sorted(row: &[usize]) -> Vec<usize> {
    let mut r = row.to_vec();
    r.sort_unstable();
    r
}

/// Assert vec is a permutation of another vec (order-agnostic).
pub fn assert_permutation<T: Ord + Copy + std::fmt::Debug>(got: &[T], want: &[T]) {
    let mut a = got.to_vec();
    a.sort_unstable();
    let mut b = want.to_vec();
    b.sort_unstable();
    assert_eq!(a, b, "not a permutation\n got={:?}\nwant={:?}", got, want);
}

/// Random finite point clouds.
pub fn points_strategy(max_len: usize) -> impl Strategy<Value = Vec<[f64; 3]>> {
    prop::collection::vec(prop::array::uniform3(-100.0f64..100.0), 0..max_len)
}

/// Random triangle tables over a small node range, so that edges repeat.
pub fn tri_table_strategy(nnodes: usize, max_len: usize) -> impl Strategy<Value = ElementTable> {
    prop::collection::vec(prop::array::uniform3(0..nnodes), 0..max_len)
        .prop_map(|rows| ElementTable::from_rows(ElementType::Tri3, &rows).unwrap())
}
