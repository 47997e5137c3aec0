//! Point coordinate storage.
//!
//! [`PointArray`] is an owned, immutable-by-convention `N x 3` buffer of
//! `f64` coordinates. Points have no identity beyond their position in the
//! array; every kernel operation that changes the point set returns a new
//! `PointArray` together with an index map.

use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshError;

/// Ordered sequence of 3D points.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointArray {
    coords: Vec<[f64; 3]>,
}

impl PointArray {
    /// Creates an empty point array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a point array from rows of three coordinates.
    pub fn from_rows(rows: impl Into<Vec<[f64; 3]>>) -> Self {
        Self {
            coords: rows.into(),
        }
    }

    /// Builds a point array from a flat buffer of `x, y, z` triples.
    ///
    /// Accepts any primitive numeric type (`f32`, `f64`, integers).
    pub fn from_flat<T>(flat: &[T]) -> Result<Self, MeshError>
    where
        T: AsPrimitive<f64>,
    {
        if flat.len() % 3 != 0 {
            return Err(MeshError::ShapeMismatch {
                len: flat.len(),
                width: 3,
            });
        }
        let coords = flat
            .chunks_exact(3)
            .map(|c| [c[0].as_(), c[1].as_(), c[2].as_()])
            .collect();
        Ok(Self { coords })
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// True if there are no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Coordinates of point `i`.
    #[inline]
    pub fn point(&self, i: usize) -> &[f64; 3] {
        &self.coords[i]
    }

    /// All points as rows.
    #[inline]
    pub fn as_rows(&self) -> &[[f64; 3]] {
        &self.coords
    }

    /// All coordinates as one flat slice (`3 * len()` values).
    #[inline]
    pub fn as_flat(&self) -> &[f64] {
        bytemuck::cast_slice(&self.coords)
    }

    /// Iterates over the points.
    pub fn iter(&self) -> std::slice::Iter<'_, [f64; 3]> {
        self.coords.iter()
    }

    /// Consumes the array, returning its rows.
    pub fn into_rows(self) -> Vec<[f64; 3]> {
        self.coords
    }

    /// Index of the first point holding a NaN or infinite coordinate.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.coords
            .iter()
            .position(|p| p.iter().any(|c| !c.is_finite()))
    }

    /// Axis-aligned bounding box `(min, max)`, or `None` when empty.
    pub fn bbox(&self) -> Option<([f64; 3], [f64; 3])> {
        let first = *self.coords.first()?;
        let mut lo = first;
        let mut hi = first;
        for p in &self.coords[1..] {
            for k in 0..3 {
                lo[k] = lo[k].min(p[k]);
                hi[k] = hi[k].max(p[k]);
            }
        }
        Some((lo, hi))
    }

    /// Extent of the bounding box along each axis (zeros when empty).
    pub fn sizes(&self) -> [f64; 3] {
        match self.bbox() {
            Some((lo, hi)) => [hi[0] - lo[0], hi[1] - lo[1], hi[2] - lo[2]],
            None => [0.0; 3],
        }
    }

    /// Largest bounding box extent.
    pub fn max_size(&self) -> f64 {
        self.sizes().into_iter().fold(0.0, f64::max)
    }

    /// New array holding the points at `indices`, in that order.
    ///
    /// Panics if an index is out of range; callers pass maps produced by the
    /// kernel itself.
    pub fn take(&self, indices: &[usize]) -> PointArray {
        PointArray {
            coords: indices.iter().map(|&i| self.coords[i]).collect(),
        }
    }

    /// Concatenates several point arrays.
    pub fn concat(parts: &[&PointArray]) -> PointArray {
        let total = parts.iter().map(|p| p.len()).sum();
        let mut coords = Vec::with_capacity(total);
        for p in parts {
            coords.extend_from_slice(&p.coords);
        }
        PointArray { coords }
    }
}

impl From<Vec<[f64; 3]>> for PointArray {
    fn from(coords: Vec<[f64; 3]>) -> Self {
        Self { coords }
    }
}

impl<'a> IntoIterator for &'a PointArray {
    type Item = &'a [f64; 3];
    type IntoIter = std::slice::Iter<'a, [f64; 3]>;
    fn into_iter(self) -> Self::IntoIter {
        self.coords.iter()
    }
}
