//! Cooperative progress reporting and cancellation.
//!
//! Long-running kernel calls accept an optional [`ProgressHook`]. The hook is
//! called between chunks of work; returning `false` aborts the call with
//! [`MeshError::Cancelled`]. Hooks must be cheap: they run on the worker's
//! thread.

use crate::mesh_error::MeshError;

/// Phase of a kernel call being reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Sorting points into grid boxes.
    FuseSort,
    /// Comparing points within boxes.
    FuseScan,
    /// Deduplicating candidate entities.
    EntityDedup,
    /// Expanding a front.
    FrontWalk,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::FuseSort => "fuse sort",
            Stage::FuseScan => "fuse scan",
            Stage::EntityDedup => "entity dedup",
            Stage::FrontWalk => "front walk",
        }
    }
}

/// One progress report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub stage: Stage,
    pub done: usize,
    pub total: usize,
}

/// Progress callback; return `false` to cancel.
pub type ProgressHook<'a> = &'a (dyn Fn(Progress) -> bool + Sync);

/// Work items processed between two hook calls.
pub(crate) const REPORT_EVERY: usize = 1 << 16;

/// Invoke `hook` (if any) and turn a cancellation request into an error.
#[inline]
pub(crate) fn report(
    hook: Option<ProgressHook<'_>>,
    stage: Stage,
    done: usize,
    total: usize,
) -> Result<(), MeshError> {
    match hook {
        Some(f) if !f(Progress { stage, done, total }) => {
            log::debug!("{} cancelled at {done}/{total}", stage.name());
            Err(MeshError::Cancelled(stage.name()))
        }
        _ => Ok(()),
    }
}
