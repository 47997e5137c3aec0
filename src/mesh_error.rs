//! MeshError: Unified error type for topomesh public APIs
//!
//! Every kernel entry point validates its inputs eagerly and returns one of
//! these variants instead of producing silently wrong output. Degenerate
//! elements and empty inputs are *not* errors; they are reported through flag
//! vectors and empty results respectively.

use thiserror::Error;

/// Coarse classification of [`MeshError`] variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed tolerances, bucket sizes, tags, shapes or indices.
    InvalidArgument,
    /// A count exceeded the addressable key space of an encoding.
    Overflow,
    /// A progress hook requested cancellation.
    Cancelled,
    /// An internal invariant did not hold.
    Internal,
}

/// Unified error type for topomesh operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    /// A tolerance was negative or not a number.
    #[error("Invalid tolerance `{name}` = {value} (must be finite and >= 0)")]
    InvalidTolerance { name: &'static str, value: f64 },
    /// The targeted bucket population must be at least one point.
    #[error("Invalid points-per-bucket value {0} (must be >= 1)")]
    InvalidBucketSize(usize),
    /// The grid shift must be a finite number.
    #[error("Invalid grid shift {0} (must be finite)")]
    InvalidShift(f64),
    /// A coordinate is NaN or infinite.
    #[error("Point {point} has a non-finite coordinate")]
    NonFiniteCoordinate { point: usize },
    /// A front increment was negative.
    #[error("Invalid increment `{name}` = {value} (must be >= 0)")]
    InvalidIncrement { name: &'static str, value: i32 },
    /// The element type name is not known.
    #[error("Unknown element type `{0}`")]
    UnknownElementType(String),
    /// Row width does not match the plexitude required by the element type.
    #[error("Element type `{eltype}` needs plexitude {expected}, got {found}")]
    PlexitudeMismatch {
        eltype: &'static str,
        expected: usize,
        found: usize,
    },
    /// A flat buffer length is not a multiple of the row width.
    #[error("Shape mismatch: {len} values cannot form rows of width {width}")]
    ShapeMismatch { len: usize, width: usize },
    /// An element references a point outside the point array.
    #[error("Element {element} slot {slot} references point {index}, but only {npoints} points exist")]
    IndexOutOfRange {
        element: usize,
        slot: usize,
        index: usize,
        npoints: usize,
    },
    /// The element type has no entity layout at the requested level.
    #[error("Element type `{eltype}` has no entities at level {level}")]
    NoEntities { eltype: &'static str, level: i32 },
    /// A level outside `-dim..=dim` was requested.
    #[error("Invalid level {level} for element type `{eltype}` of dimension {dimension}")]
    InvalidLevel {
        eltype: &'static str,
        level: i32,
        dimension: u8,
    },
    /// A seed element index is out of range.
    #[error("Seed element {seed} out of range for {nelems} elements")]
    InvalidSeed { seed: usize, nelems: usize },
    /// A connector mask does not match the number of entities.
    #[error("Mask length {found} does not match {expected} entities")]
    InvalidMask { expected: usize, found: usize },
    /// A count exceeded the addressable key space.
    #[error("Overflow: {what} ({value}) exceeds the limit of {limit}")]
    Overflow {
        what: &'static str,
        value: u128,
        limit: u128,
    },
    /// The operation was cancelled by a progress hook.
    #[error("Operation cancelled during {0}")]
    Cancelled(&'static str),
    /// An internal consistency check failed.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl MeshError {
    /// Map this error onto the coarse error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MeshError::Overflow { .. } => ErrorKind::Overflow,
            MeshError::Cancelled(_) => ErrorKind::Cancelled,
            MeshError::InvariantViolation(_) => ErrorKind::Internal,
            _ => ErrorKind::InvalidArgument,
        }
    }
}
