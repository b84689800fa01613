//! Attractor physics: single basins and their superposition into a force field.
//!
//! Points and centers are plain `[f64]` slices of the space's dimension. The helpers
//! below are the only vector arithmetic the engine needs.

pub mod basin;
pub mod field;

pub use basin::Basin;
pub use field::ForceField;

/// Alias within crate for a point (or vector) in state space
pub type Point = Vec<f64>;

/// Euclidean norm of `v`.
pub fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Euclidean distance between `a` and `b`.
pub fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
