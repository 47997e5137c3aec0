//! Tolerance-based point welding ("fuse").
//!
//! Points are sorted into a regular 3D grid of boxes sized for a target
//! population per box. Only points in the same box are compared; two points
//! are merged when they are within `abs_tol + rel_tol * scale` on *every*
//! axis, `scale` being the largest bounding-box extent of the input. The
//! first point of a box (in input order) that a later point matches becomes
//! that point's representative.
//!
//! # Known limitation
//!
//! Two close points can fall on different sides of a box boundary. With
//! `repeat = true` the whole procedure runs a second time on the fused set
//! with the grid shifted by another quarter box, which catches almost all of
//! those pairs. It is still best effort: a pair split by a box boundary in
//! *both* passes stays unfused. Also, since pass two fuses representatives,
//! an original point can end up up to twice the tolerance away from its
//! final representative.

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::algs::progress::{report, ProgressHook, Stage, REPORT_EVERY};
use crate::data::coordinates::PointArray;
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshError;

/// Hard ceiling on the number of grid boxes along one axis.
pub const MAX_BOXES_PER_AXIS: u64 = 1 << 42;

/// Extra grid shift (in box widths) applied by the second pass.
pub const REPEAT_SHIFT: f64 = 0.25;

/// Options for [`fuse`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuseOpts {
    /// Tolerance relative to the largest bounding-box extent.
    pub rel_tol: f64,
    /// Absolute tolerance; also the minimum box size.
    pub abs_tol: f64,
    /// Targeted mean number of points per box.
    pub points_per_bucket: usize,
    /// Grid origin shift in box widths.
    pub shift: f64,
    /// Run a second pass with the grid shifted by [`REPEAT_SHIFT`].
    pub repeat: bool,
}

impl Default for FuseOpts {
    fn default() -> Self {
        Self {
            rel_tol: 1e-5,
            abs_tol: 1e-5,
            points_per_bucket: 1,
            shift: 0.5,
            repeat: true,
        }
    }
}

impl FuseOpts {
    /// Options with the given absolute tolerance and defaults otherwise.
    pub fn with_abs_tol(abs_tol: f64) -> Self {
        Self {
            abs_tol,
            ..Self::default()
        }
    }

    /// Reject malformed options before any work is done.
    pub fn validate(&self) -> Result<(), MeshError> {
        for (name, value) in [("rel_tol", self.rel_tol), ("abs_tol", self.abs_tol)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(MeshError::InvalidTolerance { name, value });
            }
        }
        if self.points_per_bucket == 0 {
            return Err(MeshError::InvalidBucketSize(0));
        }
        if !self.shift.is_finite() {
            return Err(MeshError::InvalidShift(self.shift));
        }
        Ok(())
    }

    /// Componentwise merge tolerance for a point set of extent `scale`.
    #[inline]
    pub fn tolerance(&self, scale: f64) -> f64 {
        self.abs_tol + self.rel_tol * scale
    }
}

/// Fused points plus the forward index map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FuseResult {
    /// Unique points, in order of first appearance in the input.
    pub points: PointArray,
    /// For every input point, the index of its representative in `points`.
    pub index: Vec<usize>,
}

impl DebugInvariants for FuseResult {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "FuseResult");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        let n = self.points.len();
        if let Some(i) = self.index.iter().position(|&u| u >= n) {
            return Err(MeshError::InvariantViolation(format!(
                "index[{i}] = {} but only {n} unique points",
                self.index[i]
            )));
        }
        // every unique point is used, first uses in increasing order
        let mut next = 0;
        for &u in &self.index {
            if u == next {
                next += 1;
            } else if u > next {
                return Err(MeshError::InvariantViolation(format!(
                    "unique point {u} used before {next}"
                )));
            }
        }
        if next != n {
            return Err(MeshError::InvariantViolation(format!(
                "{} of {n} unique points are never used",
                n - next
            )));
        }
        Ok(())
    }
}

/// Regular box grid spanning a point set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxGrid {
    /// Minimal corner of the grid.
    pub origin: [f64; 3],
    /// Box size along each axis.
    pub size: [f64; 3],
    /// Number of boxes along each axis.
    pub count: [u64; 3],
}

impl BoxGrid {
    /// Build a grid of boxes holding about `points_per_bucket` points each.
    ///
    /// Boxes are never smaller than `min_size`. The origin is moved `shift`
    /// box widths below the lowest coordinates; a shift of 0.5 puts the lowest
    /// coordinates in the middle of the outer boxes. When all points coincide
    /// a single unit box is used.
    pub fn new(
        points: &PointArray,
        points_per_bucket: usize,
        shift: f64,
        min_size: f64,
    ) -> Result<Self, MeshError> {
        let Some((lo, hi)) = points.bbox() else {
            return Ok(Self {
                origin: [0.0; 3],
                size: [1.0; 3],
                count: [1; 3],
            });
        };
        let sz = [hi[0] - lo[0], hi[1] - lo[1], hi[2] - lo[2]];
        let nonzero: Vec<f64> = sz.iter().copied().filter(|&s| s > 0.0).collect();

        let mut size = [1.0f64; 3];
        let mut count = [1u64; 3];
        if !nonzero.is_empty() {
            let nboxes = (points.len() / points_per_bucket.max(1)).max(1) as f64;
            let vol: f64 = nonzero.iter().product();
            let ideal = (vol / nboxes).powf(1.0 / nonzero.len() as f64);
            let boxsz = ideal.max(min_size);
            for k in 0..3 {
                let n = (sz[k] / boxsz).floor();
                count[k] = checked_box_count(n)?;
                size[k] = if count[k] > 0 {
                    sz[k] / count[k] as f64
                } else {
                    boxsz
                };
            }
        } else {
            count = [0; 3];
        }

        let mut origin = [0.0; 3];
        for k in 0..3 {
            origin[k] = lo[k] - size[k] * shift;
            let end = origin[k] + size[k] * count[k] as f64;
            let extra = ((hi[k] - end) / size[k]).ceil().max(0.0);
            count[k] = checked_box_count(count[k] as f64 + extra)?;
            // points exactly on the upper face still need a box
            count[k] = count[k].max(1);
        }
        Ok(Self {
            origin,
            size,
            count,
        })
    }

    /// Box coordinates of `p`, clamped into the grid.
    #[inline]
    pub fn cell(&self, p: &[f64; 3]) -> [u64; 3] {
        let mut c = [0u64; 3];
        for k in 0..3 {
            let f = ((p[k] - self.origin[k]) / self.size[k]).floor();
            c[k] = if f <= 0.0 {
                0
            } else {
                (f as u64).min(self.count[k] - 1)
            };
        }
        c
    }

    /// Mixed-radix key of a box; equal keys mean the same box.
    #[inline]
    pub fn key(&self, c: [u64; 3]) -> u128 {
        let [nx, ny, nz] = self.count.map(u128::from);
        debug_assert!(nx * ny * nz > 0);
        (u128::from(c[0]) * ny + u128::from(c[1])) * nz + u128::from(c[2])
    }

    /// Total number of boxes.
    pub fn nboxes(&self) -> u128 {
        self.count.iter().map(|&c| u128::from(c)).product()
    }
}

fn checked_box_count(n: f64) -> Result<u64, MeshError> {
    if !(n <= MAX_BOXES_PER_AXIS as f64) {
        return Err(MeshError::Overflow {
            what: "boxes per axis",
            value: if n.is_finite() { n as u128 } else { u128::MAX },
            limit: u128::from(MAX_BOXES_PER_AXIS),
        });
    }
    Ok(n.max(0.0) as u64)
}

/// Fuse (almost) coincident points.
///
/// Returns the unique points and, for every input point, the index of its
/// representative. An empty input returns empty outputs.
///
/// ```
/// use topomesh::algs::fuse::{fuse, FuseOpts};
/// use topomesh::data::coordinates::PointArray;
///
/// let x = PointArray::from_rows(vec![[1.0, 1.0, 0.0], [1.001, 1.0, 0.0], [1.1, 1.0, 0.0]]);
/// let r = fuse(&x, &FuseOpts::with_abs_tol(0.01)).unwrap();
/// assert_eq!(r.points.as_rows(), &[[1.0, 1.0, 0.0], [1.1, 1.0, 0.0]]);
/// assert_eq!(r.index, vec![0, 0, 1]);
/// ```
pub fn fuse(points: &PointArray, opts: &FuseOpts) -> Result<FuseResult, MeshError> {
    fuse_with_progress(points, opts, None)
}

/// [`fuse`] with a cooperative progress/cancellation hook.
pub fn fuse_with_progress(
    points: &PointArray,
    opts: &FuseOpts,
    hook: Option<ProgressHook<'_>>,
) -> Result<FuseResult, MeshError> {
    opts.validate()?;
    if let Some(point) = points.first_non_finite() {
        return Err(MeshError::NonFiniteCoordinate { point });
    }
    if points.is_empty() {
        return Ok(FuseResult::default());
    }

    let tol = opts.tolerance(points.max_size());
    let first = fuse_pass(points, opts, opts.shift, tol, hook)?;
    if !opts.repeat {
        return Ok(first);
    }

    let second = fuse_pass(&first.points, opts, opts.shift + REPEAT_SHIFT, tol, hook)?;
    if second.points.len() < first.points.len() {
        log::warn!(
            "fuse: second pass merged {} box-straddling points",
            first.points.len() - second.points.len()
        );
    }
    let index = first.index.iter().map(|&i| second.index[i]).collect();
    let out = FuseResult {
        points: second.points,
        index,
    };
    crate::debug_invariants!(out.validate_invariants(), "fuse");
    Ok(out)
}

/// One grid pass.
fn fuse_pass(
    points: &PointArray,
    opts: &FuseOpts,
    shift: f64,
    tol: f64,
    hook: Option<ProgressHook<'_>>,
) -> Result<FuseResult, MeshError> {
    let n = points.len();
    if points.max_size() == 0.0 {
        // all points coincide
        return Ok(FuseResult {
            points: points.take(&[0]),
            index: vec![0; n],
        });
    }

    let grid = BoxGrid::new(points, opts.points_per_bucket, shift, opts.abs_tol)?;
    log::trace!(
        "fuse pass: {n} points, {:?} boxes of size {:?}, tol {tol:e}",
        grid.count,
        grid.size
    );

    report(hook, Stage::FuseSort, 0, n)?;
    let rows = points.as_rows();
    let mut keyed: Vec<(u128, usize)> = (0..n).map(|i| (grid.key(grid.cell(&rows[i])), i)).collect();
    // stable: ties keep input order, so the first point of a box comes first
    #[cfg(feature = "rayon")]
    keyed.par_sort_by_key(|&(k, _)| k);
    #[cfg(not(feature = "rayon"))]
    keyed.sort_by_key(|&(k, _)| k);
    report(hook, Stage::FuseSort, n, n)?;

    let mut rep = vec![usize::MAX; n];
    let mut done = 0usize;
    let mut reps: Vec<usize> = Vec::new();
    for run in keyed.chunk_by(|a, b| a.0 == b.0) {
        reps.clear();
        for &(_, i) in run {
            let p = &rows[i];
            match reps.iter().copied().find(|&j| close(p, &rows[j], tol)) {
                Some(j) => rep[i] = j,
                None => {
                    rep[i] = i;
                    reps.push(i);
                }
            }
        }
        let before = done / REPORT_EVERY;
        done += run.len();
        if done / REPORT_EVERY != before {
            report(hook, Stage::FuseScan, done, n)?;
        }
    }

    // compact in order of first appearance
    let mut new_id = vec![usize::MAX; n];
    let mut unique = Vec::new();
    for i in 0..n {
        if rep[i] == i {
            new_id[i] = unique.len();
            unique.push(i);
        }
    }
    let index: Vec<usize> = rep.iter().map(|&r| new_id[r]).collect();
    log::debug!("fuse pass: {n} points -> {} unique", unique.len());
    Ok(FuseResult {
        points: points.take(&unique),
        index,
    })
}

#[inline]
fn close(a: &[f64; 3], b: &[f64; 3], tol: f64) -> bool {
    (a[0] - b[0]).abs() <= tol && (a[1] - b[1]).abs() <= tol && (a[2] - b[2]).abs() <= tol
}

/// Replace every point with its fused representative, keeping the shape.
pub fn adjust(points: &PointArray, opts: &FuseOpts) -> Result<PointArray, MeshError> {
    let fused = fuse(points, opts)?;
    Ok(fused.points.take(&fused.index))
}

/// For every point of `other`, find a coinciding point of `base`.
///
/// Works by fusing the concatenation of both sets. Returns the index of a
/// matching point in `base`, or `None`. When several points of `base` fuse
/// together the lowest index is reported; fuse `base` first if that matters.
pub fn match_points(
    base: &PointArray,
    other: &PointArray,
    opts: &FuseOpts,
) -> Result<Vec<Option<usize>>, MeshError> {
    let (first_base, other_ids) = fuse_joint(base, other, opts)?;
    Ok(other_ids.iter().map(|&u| first_base[u]).collect())
}

/// Sorted indices of the points of `base` that have a match in `other`.
///
/// Points of `base` that fuse together are reported once, by their lowest
/// index.
pub fn has_match(
    base: &PointArray,
    other: &PointArray,
    opts: &FuseOpts,
) -> Result<Vec<usize>, MeshError> {
    let (first_base, other_ids) = fuse_joint(base, other, opts)?;
    let mut hits: Vec<usize> = other_ids.iter().filter_map(|&u| first_base[u]).collect();
    hits.sort_unstable();
    hits.dedup();
    Ok(hits)
}

/// Fuse `base ++ other`; return, per fused point, the lowest base index
/// fused into it, and the fused ids of `other`'s points.
fn fuse_joint(
    base: &PointArray,
    other: &PointArray,
    opts: &FuseOpts,
) -> Result<(Vec<Option<usize>>, Vec<usize>), MeshError> {
    let joint = PointArray::concat(&[base, other]);
    let fused = fuse(&joint, opts)?;
    let (base_ids, other_ids) = fused.index.split_at(base.len());
    let mut first_base = vec![None; fused.points.len()];
    for (i, &u) in base_ids.iter().enumerate() {
        first_base[u].get_or_insert(i);
    }
    Ok((first_base, other_ids.to_vec()))
}
