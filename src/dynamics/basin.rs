use crate::dynamics::{distance, norm, Point};
use serde::{Deserialize, Serialize};

/// Below this displacement a point is considered to sit on the center itself.
const CENTER_EPSILON: f64 = 1e-10;
/// Softening term that keeps the inverse-square law finite near the center.
const SOFTENING: f64 = 0.1;
/// Default integration step for `evolve_thought`.
pub const DEFAULT_DT: f64 = 0.01;

/// A single point-attractor with an inverse-square pull and a potential well.
///
/// Basins are never modified after construction; the genetic operators build new
/// ones instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basin {
    center: Point,
    strength: f64,
    name: String,
}

impl Basin {
    /// Creates a new `Basin`
    ///
    /// # Arguments
    /// * `center` - Location of the attractor, its length defines the dimension
    /// * `strength` - Scale of the pull, expected to be positive
    /// * `name` - Identifier of the basin within a `Topology`
    pub fn new(center: Point, strength: f64, name: impl Into<String>) -> Self {
        Self {
            center,
            strength,
            name: name.into(),
        }
    }

    pub fn center(&self) -> &[f64] {
        &self.center
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension(&self) -> usize {
        self.center.len()
    }

    /// Force exerted on `point`, pointing toward the center.
    ///
    /// The magnitude is `strength / (distance² + 0.1)`. A point sitting on the center
    /// receives exactly the zero vector.
    pub fn attraction_force(&self, point: &[f64]) -> Point {
        let displacement: Point = self
            .center
            .iter()
            .zip(point)
            .map(|(c, p)| c - p)
            .collect();
        let dist = norm(&displacement);

        if dist < CENTER_EPSILON {
            return vec![0.0; displacement.len()];
        }

        let magnitude = self.strength / (dist * dist + SOFTENING);
        displacement
            .into_iter()
            .map(|d| magnitude * d / dist)
            .collect()
    }

    /// Potential of the well at `point`, always negative for a positive strength.
    pub fn basin_potential(&self, point: &[f64]) -> f64 {
        -self.strength / (distance(&self.center, point) + SOFTENING)
    }

    /// Whether `point` lies strictly within `threshold` of the center.
    pub fn contains(&self, point: &[f64], threshold: f64) -> bool {
        distance(&self.center, point) < threshold
    }

    /// Integrates a trajectory under this basin's pull alone.
    ///
    /// The flow is overdamped: velocity equals force, so each step is
    /// `p[i] = p[i-1] + force(p[i-1]) * dt`. The returned trajectory holds `steps`
    /// points, the first being `initial_point` itself.
    ///
    /// # Arguments
    /// * `initial_point` - Where the trajectory starts
    /// * `steps` - Number of points in the returned trajectory
    /// * `dt` - Integration step, `DEFAULT_DT` in the usual case
    pub fn evolve_thought(&self, initial_point: &[f64], steps: usize, dt: f64) -> Vec<Point> {
        let mut trajectory: Vec<Point> = Vec::with_capacity(steps);
        if steps == 0 {
            return trajectory;
        }

        trajectory.push(initial_point.to_vec());
        for _ in 1..steps {
            let previous = &trajectory[trajectory.len() - 1];
            let force = self.attraction_force(previous);
            let next: Point = previous
                .iter()
                .zip(&force)
                .map(|(p, f)| p + f * dt)
                .collect();
            trajectory.push(next);
        }
        trajectory
    }
}
