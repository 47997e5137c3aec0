//! Element types and their compiled-in entity templates.
//!
//! An [`EntityTemplate`] tells how to read the lower-level entities
//! (vertices, edges, faces) out of one element row: each template row is a
//! tuple of *local* node positions. Templates are static tables; they are
//! never mutated at runtime.
//!
//! Local node numbering follows the usual FE conventions: for `quad4` and
//! `hex8` the bottom face is numbered counter-clockwise, `hex8`/`wedge6` top
//! nodes follow the bottom ones in the same order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

use crate::mesh_error::MeshError;

/// Largest plexitude of any compiled-in element type.
pub const MAX_PLEX: usize = 8;

/// Supported element types.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// 0D single point.
    Point1,
    /// 1D two-node segment.
    Line2,
    /// 2D three-node triangle.
    Tri3,
    /// 2D four-node quadrilateral.
    Quad4,
    /// 3D four-node tetrahedron.
    Tet4,
    /// 3D six-node wedge/prism.
    Wedge6,
    /// 3D eight-node hexahedron.
    Hex8,
}

const ALL: [ElementType; 7] = [
    ElementType::Point1,
    ElementType::Line2,
    ElementType::Tri3,
    ElementType::Quad4,
    ElementType::Tet4,
    ElementType::Wedge6,
    ElementType::Hex8,
];

impl ElementType {
    /// All compiled-in element types.
    pub fn all() -> &'static [ElementType] {
        &ALL
    }

    /// Canonical lower-case name (`"tri3"`, `"hex8"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            ElementType::Point1 => "point1",
            ElementType::Line2 => "line2",
            ElementType::Tri3 => "tri3",
            ElementType::Quad4 => "quad4",
            ElementType::Tet4 => "tet4",
            ElementType::Wedge6 => "wedge6",
            ElementType::Hex8 => "hex8",
        }
    }

    /// Number of nodes per element (plexitude).
    pub const fn nplex(self) -> usize {
        match self {
            ElementType::Point1 => 1,
            ElementType::Line2 => 2,
            ElementType::Tri3 => 3,
            ElementType::Quad4 | ElementType::Tet4 => 4,
            ElementType::Wedge6 => 6,
            ElementType::Hex8 => 8,
        }
    }

    /// Topological dimension of the element.
    pub fn dimension(self) -> u8 {
        match self {
            ElementType::Point1 => 0,
            ElementType::Line2 => 1,
            ElementType::Tri3 | ElementType::Quad4 => 2,
            ElementType::Tet4 | ElementType::Wedge6 | ElementType::Hex8 => 3,
        }
    }

    /// Resolve a possibly negative level against this element's dimension.
    ///
    /// Negative levels count down from the element itself: `-1` is the
    /// border level (faces of a volume, edges of a surface).
    pub fn resolve_level(self, level: i32) -> Result<u8, MeshError> {
        let dim = i32::from(self.dimension());
        let resolved = if level < 0 { dim + level } else { level };
        if !(0..=dim).contains(&resolved) {
            return Err(MeshError::InvalidLevel {
                eltype: self.name(),
                level,
                dimension: self.dimension(),
            });
        }
        Ok(resolved as u8)
    }

    /// Entity template for the given level (`0` = vertices, `1` = edges,
    /// `2` = faces; negative values count from the element dimension).
    pub fn entities(self, level: i32) -> Result<EntityTemplate, MeshError> {
        let lvl = self.resolve_level(level)?;
        if lvl == self.dimension() {
            return Ok(EntityTemplate {
                parent: self,
                eltype: self,
                nodes: identity_nodes(self.nplex()),
            });
        }
        if lvl == 0 {
            return Ok(EntityTemplate {
                parent: self,
                eltype: ElementType::Point1,
                nodes: identity_nodes(self.nplex()),
            });
        }
        let (eltype, nodes): (ElementType, &'static [usize]) = match (self, lvl) {
            (ElementType::Tri3, 1) => (ElementType::Line2, &TRI3_EDGES),
            (ElementType::Quad4, 1) => (ElementType::Line2, &QUAD4_EDGES),
            (ElementType::Tet4, 1) => (ElementType::Line2, &TET4_EDGES),
            (ElementType::Tet4, 2) => (ElementType::Tri3, &TET4_FACES),
            (ElementType::Wedge6, 1) => (ElementType::Line2, &WEDGE6_EDGES),
            (ElementType::Wedge6, 2) => (ElementType::Quad4, &WEDGE6_FACES),
            (ElementType::Hex8, 1) => (ElementType::Line2, &HEX8_EDGES),
            (ElementType::Hex8, 2) => (ElementType::Quad4, &HEX8_FACES),
            _ => {
                return Err(MeshError::NoEntities {
                    eltype: self.name(),
                    level,
                })
            }
        };
        Ok(EntityTemplate {
            parent: self,
            eltype,
            nodes,
        })
    }
}

impl Default for ElementType {
    fn default() -> Self {
        ElementType::Point1
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementType {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        ALL.iter()
            .copied()
            .find(|t| t.name() == lower)
            .ok_or(MeshError::UnknownElementType(s.to_string()))
    }
}

/// How to read one level of lower entities out of an element row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityTemplate {
    /// Element type the template applies to.
    pub parent: ElementType,
    /// Element type of the produced entities.
    pub eltype: ElementType,
    nodes: &'static [usize],
}

impl EntityTemplate {
    /// Number of nodes per produced entity.
    #[inline]
    pub fn nplex(&self) -> usize {
        self.eltype.nplex()
    }

    /// Number of entities read from one element.
    #[inline]
    pub fn nentities(&self) -> usize {
        self.nodes.len() / self.nplex()
    }

    /// Local node positions of entity `k`.
    #[inline]
    pub fn row(&self, k: usize) -> &'static [usize] {
        let w = self.nplex();
        &self.nodes[k * w..(k + 1) * w]
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'static, usize> {
        self.nodes.chunks_exact(self.nplex())
    }

    /// True if some template row repeats a local node (e.g. the triangular
    /// faces of a wedge written as quads).
    pub fn has_degenerate_rows(&self) -> bool {
        self.rows().any(has_repeats)
    }

    /// Copy the global nodes of entity `k` into `out`, skipping positions
    /// whose local node already appeared in the template row. Returns the
    /// number of nodes written.
    ///
    /// `row` holds the entity's global nodes in template order.
    pub(crate) fn gather_distinct(&self, k: usize, row: &[usize], out: &mut [usize; MAX_PLEX]) -> usize {
        let local = self.row(k);
        let mut n = 0;
        for (i, &l) in local.iter().enumerate() {
            if !local[..i].contains(&l) {
                out[n] = row[i];
                n += 1;
            }
        }
        n
    }
}

/// True if the slice contains a repeated value.
pub(crate) fn has_repeats(row: &[usize]) -> bool {
    row.iter()
        .enumerate()
        .any(|(i, a)| row[i + 1..].contains(a))
}

fn identity_nodes(n: usize) -> &'static [usize] {
    &IDENTITY[..n]
}

static IDENTITY: [usize; MAX_PLEX] = [0, 1, 2, 3, 4, 5, 6, 7];

const TRI3_EDGES: [usize; 6] = [0, 1, 1, 2, 2, 0];

const QUAD4_EDGES: [usize; 8] = [0, 1, 1, 2, 2, 3, 3, 0];

const TET4_EDGES: [usize; 12] = [0, 1, 1, 2, 2, 0, 0, 3, 1, 3, 2, 3];
const TET4_FACES: [usize; 12] = [0, 2, 1, 0, 1, 3, 1, 2, 3, 2, 0, 3];

const WEDGE6_EDGES: [usize; 18] = [0, 1, 1, 2, 2, 0, 0, 3, 1, 4, 2, 5, 3, 4, 4, 5, 5, 3];
// Triangular end faces are stored as quads with a repeated last node.
const WEDGE6_FACES: [usize; 20] = [
    0, 2, 1, 1, //
    3, 4, 5, 5, //
    0, 1, 4, 3, //
    1, 2, 5, 4, //
    0, 3, 5, 2,
];

const HEX8_EDGES: [usize; 24] = [
    0, 1, 1, 2, 2, 3, 3, 0, //
    4, 5, 5, 6, 6, 7, 7, 4, //
    0, 4, 1, 5, 2, 6, 3, 7,
];
const HEX8_FACES: [usize; 24] = [
    0, 4, 7, 3, //
    1, 2, 6, 5, //
    0, 1, 5, 4, //
    3, 7, 6, 2, //
    0, 3, 2, 1, //
    4, 5, 6, 7,
];

/// True if `rows` holds `count` rows of `width` local nodes, each below `nplex`.
const fn template_fits(rows: &[usize], width: usize, count: usize, nplex: usize) -> bool {
    if rows.len() != width * count {
        return false;
    }
    let mut i = 0;
    while i < rows.len() {
        if rows[i] >= nplex {
            return false;
        }
        i += 1;
    }
    true
}

const fn max_nplex() -> usize {
    let mut m = 0;
    let mut i = 0;
    while i < ALL.len() {
        if ALL[i].nplex() > m {
            m = ALL[i].nplex();
        }
        i += 1;
    }
    m
}

const_assert!(max_nplex() == MAX_PLEX);
const_assert!(template_fits(&TRI3_EDGES, 2, 3, ElementType::Tri3.nplex()));
const_assert!(template_fits(&QUAD4_EDGES, 2, 4, ElementType::Quad4.nplex()));
const_assert!(template_fits(&TET4_EDGES, 2, 6, ElementType::Tet4.nplex()));
const_assert!(template_fits(&TET4_FACES, 3, 4, ElementType::Tet4.nplex()));
const_assert!(template_fits(&WEDGE6_EDGES, 2, 9, ElementType::Wedge6.nplex()));
const_assert!(template_fits(&WEDGE6_FACES, 4, 5, ElementType::Wedge6.nplex()));
const_assert!(template_fits(&HEX8_EDGES, 2, 12, ElementType::Hex8.nplex()));
const_assert!(template_fits(&HEX8_FACES, 4, 6, ElementType::Hex8.nplex()));
