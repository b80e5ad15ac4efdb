//! Weight-proportional 2D tile layout engine.
//!
//! Quantizes a fixed area into a unit grid, places rectangular items so
//! that heavier items get proportionally more cells biased toward the top,
//! runs one placement configuration per shape-search criteria pair and
//! ranks the configurations by leftover empty space. Output is a set of
//! placed-tile records in grid units; converting them to pixels (via the
//! grid's `unit_side`) is left to rendering collaborators.

pub mod engine;
pub mod factor;
pub mod grid;
pub mod render;
pub mod solver;
pub mod types;
