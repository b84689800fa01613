use crate::dynamics::{norm, Basin, Point};
use rayon::prelude::*;

/// Step size of the equilibrium search, independent of any integration `dt`.
const EQUILIBRIUM_STEP: f64 = 0.01;
/// Default iteration cap for `find_equilibrium`.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;
/// Default force magnitude below which a point counts as balanced.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Superposition of several basins, scaled by a global field strength.
///
/// The field strength is a second level of scaling on top of each basin's own
/// `strength`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceField {
    field_strength: f64,
}

impl Default for ForceField {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ForceField {
    pub fn new(field_strength: f64) -> Self {
        Self { field_strength }
    }

    pub fn field_strength(&self) -> f64 {
        self.field_strength
    }

    /// Sum of every basin's pull on `point`, each multiplied by the field strength.
    pub fn compute_force(&self, point: &[f64], basins: &[Basin]) -> Point {
        let mut total = vec![0.0; point.len()];
        for basin in basins {
            let force = basin.attraction_force(point);
            for (acc, f) in total.iter_mut().zip(force) {
                *acc += f * self.field_strength;
            }
        }
        total
    }

    /// Total potential at `point`, scaled once by the field strength.
    pub fn potential_energy(&self, point: &[f64], basins: &[Basin]) -> f64 {
        basins
            .iter()
            .map(|basin| basin.basin_potential(point))
            .sum::<f64>()
            * self.field_strength
    }

    /// Evaluates `compute_force` at every point of a grid, in grid order.
    pub fn compute_field(&self, grid_points: &[Point], basins: &[Basin]) -> Vec<Point> {
        grid_points
            .par_iter()
            .map(|point| self.compute_force(point, basins))
            .collect()
    }

    /// Walks `initial_point` along the combined force until it balances.
    ///
    /// Each iteration moves the point by `0.01 * force`. The search stops once the
    /// force magnitude falls under `tolerance` or after `max_iterations` steps, and
    /// returns the point it reached either way. Callers decide for themselves whether
    /// that point is meaningful (e.g. with `Basin::contains`).
    ///
    /// # Arguments
    /// * `initial_point` - Starting location
    /// * `basins` - The attractors making up the field
    /// * `max_iterations` - Iteration cap, `DEFAULT_MAX_ITERATIONS` in the usual case
    /// * `tolerance` - Convergence threshold, `DEFAULT_TOLERANCE` in the usual case
    pub fn find_equilibrium(
        &self,
        initial_point: &[f64],
        basins: &[Basin],
        max_iterations: usize,
        tolerance: f64,
    ) -> Point {
        let mut point = initial_point.to_vec();

        for _ in 0..max_iterations {
            let force = self.compute_force(&point, basins);
            if norm(&force) < tolerance {
                break;
            }
            for (p, f) in point.iter_mut().zip(force) {
                *p += EQUILIBRIUM_STEP * f;
            }
        }
        point
    }
}
