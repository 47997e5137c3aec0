//! Level-synchronous front walks over an adjacency graph.
//!
//! A front walk is a multi-source breadth-first traversal that labels every
//! reached element. Seeds are labelled `partition_increment * rank`, every
//! newly reached element gets its predecessor's label plus
//! `front_increment`. With `front_increment = 1, partition_increment = 0`
//! the labels are BFS distances; with `front_increment = 0` they number the
//! connected parts.
//!
//! Determinism: each front is processed in ascending element order and an
//! unvisited neighbor is claimed by the first front element that reaches it.
//! The result does not depend on the `rayon` feature.

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::algs::adjacency_graph::AdjacencyList;
use crate::algs::progress::{report, ProgressHook, Stage};
use crate::mesh_error::MeshError;

/// Label of an element that was never reached.
pub const UNVISITED: i32 = -1;

/// Options for a [`FrontWalk`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontWalkOpts {
    /// Added to the predecessor's label for every newly reached element.
    pub front_increment: i32,
    /// Seed `r` (after removing repeats) starts at `partition_increment * r`;
    /// also added when a walk restarts on an unreached part.
    pub partition_increment: i32,
    /// Labels above this value are never assigned.
    pub max_level: Option<i32>,
    /// When the front dies out, restart at the lowest unvisited element.
    pub continue_unreached: bool,
}

impl Default for FrontWalkOpts {
    fn default() -> Self {
        Self {
            front_increment: 1,
            partition_increment: 1,
            max_level: None,
            continue_unreached: false,
        }
    }
}

impl FrontWalkOpts {
    pub fn validate(&self) -> Result<(), MeshError> {
        for (name, value) in [
            ("front_increment", self.front_increment),
            ("partition_increment", self.partition_increment),
        ] {
            if value < 0 {
                return Err(MeshError::InvalidIncrement { name, value });
            }
        }
        Ok(())
    }

    #[inline]
    fn allows(&self, label: i32) -> bool {
        self.max_level.is_none_or(|m| label <= m)
    }
}

/// Builder for a front walk.
///
/// ```
/// use topomesh::algs::adjacency_graph::AdjacencyList;
/// use topomesh::algs::traversal::FrontWalk;
///
/// // path 0 - 1 - 2 - 3
/// let adj = AdjacencyList::from_lists(vec![vec![1], vec![0, 2], vec![1, 3], vec![2]]);
/// let labels = FrontWalk::new(&adj).seeds([0]).run().unwrap();
/// assert_eq!(labels, vec![0, 1, 2, 3]);
/// ```
pub struct FrontWalk<'a> {
    adj: &'a AdjacencyList,
    seeds: Vec<usize>,
    opts: FrontWalkOpts,
    progress: Option<ProgressHook<'a>>,
}

impl<'a> FrontWalk<'a> {
    pub fn new(adj: &'a AdjacencyList) -> Self {
        Self {
            adj,
            seeds: Vec::new(),
            opts: FrontWalkOpts::default(),
            progress: None,
        }
    }
    pub fn seeds<I: IntoIterator<Item = usize>>(mut self, it: I) -> Self {
        self.seeds = it.into_iter().collect();
        self
    }
    pub fn opts(mut self, opts: FrontWalkOpts) -> Self {
        self.opts = opts;
        self
    }
    pub fn front_increment(mut self, inc: i32) -> Self {
        self.opts.front_increment = inc;
        self
    }
    pub fn partition_increment(mut self, inc: i32) -> Self {
        self.opts.partition_increment = inc;
        self
    }
    pub fn max_level(mut self, m: Option<i32>) -> Self {
        self.opts.max_level = m;
        self
    }
    pub fn continue_unreached(mut self, yes: bool) -> Self {
        self.opts.continue_unreached = yes;
        self
    }
    /// Called after every front; returning `false` cancels the walk.
    pub fn progress(mut self, hook: ProgressHook<'a>) -> Self {
        self.progress = Some(hook);
        self
    }

    /// Run the walk to completion and return one label per element.
    pub fn run(self) -> Result<Vec<i32>, MeshError> {
        let mut steps = self.steps()?;
        for front in steps.by_ref() {
            front?;
        }
        Ok(steps.into_labels())
    }

    /// Walk one front at a time.
    pub fn steps(self) -> Result<FrontSteps<'a>, MeshError> {
        self.opts.validate()?;
        let n = self.adj.len();
        let mut labels = vec![UNVISITED; n];
        let mut frontier = Vec::new();
        let mut max_label = UNVISITED;
        let mut rank = 0i32;
        let mut seen = vec![false; n];
        for &s in &self.seeds {
            if s >= n {
                return Err(MeshError::InvalidSeed { seed: s, nelems: n });
            }
            if std::mem::replace(&mut seen[s], true) {
                continue;
            }
            let label = self
                .opts
                .partition_increment
                .checked_mul(rank)
                .ok_or_else(|| label_overflow(self.opts.partition_increment as i64 * rank as i64))?;
            rank = rank
                .checked_add(1)
                .ok_or_else(|| label_overflow(rank as i64 + 1))?;
            // seeds above max_level keep their rank but stay unvisited
            if self.opts.allows(label) {
                labels[s] = label;
                max_label = max_label.max(label);
                frontier.push(s);
            }
        }
        frontier.sort_unstable();
        let mut steps = FrontSteps {
            adj: self.adj,
            opts: self.opts,
            progress: self.progress,
            nvisited: frontier.len(),
            labels,
            frontier,
            max_label,
            cursor: 0,
            started: false,
            done: false,
        };
        if steps.frontier.is_empty() && self.seeds.is_empty() && steps.opts.continue_unreached {
            steps.frontier = steps.restart(0);
        }
        Ok(steps)
    }
}

/// An in-progress front walk.
///
/// Iterating yields the elements labelled by each successive front, the
/// seeds first. A restart on an unreached part counts as a front.
pub struct FrontSteps<'a> {
    adj: &'a AdjacencyList,
    opts: FrontWalkOpts,
    progress: Option<ProgressHook<'a>>,
    labels: Vec<i32>,
    frontier: Vec<usize>,
    nvisited: usize,
    max_label: i32,
    cursor: usize,
    started: bool,
    done: bool,
}

impl FrontSteps<'_> {
    /// Labels assigned so far.
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    pub fn into_labels(self) -> Vec<i32> {
        self.labels
    }

    /// Number of labelled elements.
    pub fn nvisited(&self) -> usize {
        self.nvisited
    }

    fn advance(&mut self) -> Result<Option<Vec<usize>>, MeshError> {
        if !self.started {
            self.started = true;
        } else {
            let mut next = self.expand()?;
            if next.is_empty() && self.opts.continue_unreached {
                let label = self
                    .max_label
                    .checked_add(self.opts.front_increment)
                    .and_then(|l| l.checked_add(self.opts.partition_increment))
                    .ok_or_else(|| {
                        label_overflow(
                            self.max_label as i64
                                + self.opts.front_increment as i64
                                + self.opts.partition_increment as i64,
                        )
                    })?;
                next = self.restart(label);
            }
            self.frontier = next;
        }
        if self.frontier.is_empty() {
            return Ok(None);
        }
        report(self.progress, Stage::FrontWalk, self.nvisited, self.labels.len())?;
        Ok(Some(self.frontier.clone()))
    }

    /// Label the unvisited neighbors of the current front.
    fn expand(&mut self) -> Result<Vec<usize>, MeshError> {
        let adj = self.adj;
        let labels = &self.labels;
        let gather = |&f: &usize| -> (usize, Vec<usize>) {
            let fresh = adj
                .neighbors(f)
                .iter()
                .copied()
                .filter(|&n| labels[n] == UNVISITED)
                .collect();
            (f, fresh)
        };
        #[cfg(feature = "rayon")]
        let candidates: Vec<(usize, Vec<usize>)> = self.frontier.par_iter().map(gather).collect();
        #[cfg(not(feature = "rayon"))]
        let candidates: Vec<(usize, Vec<usize>)> = self.frontier.iter().map(gather).collect();

        let inc = self.opts.front_increment;
        let mut next = Vec::new();
        for (f, fresh) in candidates {
            if fresh.is_empty() {
                continue;
            }
            let from = self.labels[f];
            let label = from
                .checked_add(inc)
                .ok_or_else(|| label_overflow(from as i64 + inc as i64))?;
            if !self.opts.allows(label) {
                continue;
            }
            for n in fresh {
                if self.labels[n] == UNVISITED {
                    self.labels[n] = label;
                    next.push(n);
                }
            }
            self.max_label = self.max_label.max(label);
        }
        next.sort_unstable();
        self.nvisited += next.len();
        Ok(next)
    }

    /// Seed the lowest unvisited element with `label`.
    fn restart(&mut self, label: i32) -> Vec<usize> {
        if !self.opts.allows(label) {
            return Vec::new();
        }
        while self.cursor < self.labels.len() && self.labels[self.cursor] != UNVISITED {
            self.cursor += 1;
        }
        if self.cursor == self.labels.len() {
            return Vec::new();
        }
        let e = self.cursor;
        self.labels[e] = label;
        self.max_label = self.max_label.max(label);
        self.nvisited += 1;
        log::trace!("front walk restarts at element {e} with label {label}");
        vec![e]
    }
}

impl Iterator for FrontSteps<'_> {
    type Item = Result<Vec<usize>, MeshError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(front)) => Some(Ok(front)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn label_overflow(value: i64) -> MeshError {
    MeshError::Overflow {
        what: "front label",
        value: value.max(0) as u128,
        limit: i32::MAX as u128,
    }
}

/// Label the elements of `adj` by a front walk from `seeds`.
///
/// Unreached elements keep [`UNVISITED`].
pub fn front_walk(
    adj: &AdjacencyList,
    seeds: &[usize],
    front_increment: i32,
    partition_increment: i32,
    max_level: Option<i32>,
) -> Result<Vec<i32>, MeshError> {
    FrontWalk::new(adj)
        .seeds(seeds.iter().copied())
        .front_increment(front_increment)
        .partition_increment(partition_increment)
        .max_level(max_level)
        .run()
}

/// One front step: the elements adjacent to `seeds`, sorted.
///
/// With `add` the seeds themselves are included; otherwise they are left
/// out even when adjacent to another seed.
pub fn front(adj: &AdjacencyList, seeds: &[usize], add: bool) -> Result<Vec<usize>, MeshError> {
    let n = adj.len();
    if let Some(&s) = seeds.iter().find(|&&s| s >= n) {
        return Err(MeshError::InvalidSeed { seed: s, nelems: n });
    }
    let mut out: Vec<usize> = seeds
        .iter()
        .flat_map(|&s| adj.neighbors(s).iter().copied())
        .collect();
    if add {
        out.extend_from_slice(seeds);
    }
    out.sort_unstable();
    out.dedup();
    if !add {
        let mut own = seeds.to_vec();
        own.sort_unstable();
        out.retain(|e| own.binary_search(e).is_err());
    }
    Ok(out)
}
