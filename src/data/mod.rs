//! Data module: point coordinates and element connectivity
#![warn(missing_docs)]

pub mod coordinates;
pub mod elements;

pub use coordinates::PointArray;
pub use elements::ElementTable;
