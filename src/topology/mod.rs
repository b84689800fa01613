//! Constrained basin graphs.
//!
//! A `Topology` is a directed graph whose nodes are named basins and whose edges are
//! typed, weighted constraints. Validity is checked on demand, never enforced while
//! building: a graph is invalid when some cycle is closed entirely by `Requires`
//! edges.

use crate::dynamics::{distance, Basin, Point};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum TopologyError {
    #[error("Relationship references unknown basin: '{0}'")]
    UnknownBasin(String),
    #[error("Basin '{name}' has dimension {found}, topology expects {expected}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Kind of constraint carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintType {
    /// Cooperative link
    Supports,
    /// Dependency, cycles made only of these are contradictory
    Requires,
    /// Antagonistic link
    Opposes,
}

impl ConstraintType {
    /// Cumulative draw table used when seeding random relationships.
    const SAMPLING_TABLE: [(f64, ConstraintType); 3] = [
        (0.6, ConstraintType::Supports),
        (0.9, ConstraintType::Requires),
        (1.0, ConstraintType::Opposes),
    ];

    /// Draws a constraint type with probabilities supports 0.6, requires 0.3,
    /// opposes 0.1.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let roll = rng.random::<f64>();
        Self::SAMPLING_TABLE
            .iter()
            .find(|(cumulative, _)| roll < *cumulative)
            .map(|(_, kind)| *kind)
            .unwrap_or(ConstraintType::Opposes)
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConstraintType::Supports => "supports",
            ConstraintType::Requires => "requires",
            ConstraintType::Opposes => "opposes",
        };
        f.write_str(label)
    }
}

/// A directed, typed and weighted edge between two basins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub from: String,
    pub to: String,
    pub weight: f64,
    pub constraint_type: ConstraintType,
}

/// Directed graph of named basins sharing one state-space dimension.
///
/// Basins keep their registration order, which is also the order every projection
/// (`get_basin_list`, `get_virtue_strengths`) and every genetic operator walks them
/// in. There is at most one edge per ordered `(from, to)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    dimension: usize,
    basins: Vec<Basin>,
    relationships: Vec<Relationship>,
}

impl Topology {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            basins: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.basins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.basins.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter()
    }

    pub fn basin(&self, name: &str) -> Option<&Basin> {
        self.basins.iter().find(|b| b.name() == name)
    }

    pub fn contains_basin(&self, name: &str) -> bool {
        self.basin(name).is_some()
    }

    /// Registers a basin under `name`.
    ///
    /// A basin already registered under the same name is replaced in place and keeps
    /// its position in the registration order.
    ///
    /// # Returns
    /// * `Result<(), TopologyError>` - `DimensionMismatch` if `center` does not match
    /// the topology's dimension
    pub fn add_virtue(
        &mut self,
        name: &str,
        center: Point,
        strength: f64,
    ) -> Result<(), TopologyError> {
        if center.len() != self.dimension {
            return Err(TopologyError::DimensionMismatch {
                name: name.to_string(),
                expected: self.dimension,
                found: center.len(),
            });
        }

        let basin = Basin::new(center, strength, name);
        match self.basins.iter_mut().find(|b| b.name() == name) {
            Some(existing) => *existing = basin,
            None => self.basins.push(basin),
        }
        Ok(())
    }

    /// Adds a directed constraint edge, overwriting any edge already going from
    /// `from` to `to`. Self-loops are allowed.
    ///
    /// # Returns
    /// * `Result<(), TopologyError>` - `UnknownBasin` if either endpoint is not registered
    pub fn add_relationship(
        &mut self,
        from: &str,
        to: &str,
        weight: f64,
        constraint_type: ConstraintType,
    ) -> Result<(), TopologyError> {
        for endpoint in [from, to] {
            if !self.contains_basin(endpoint) {
                return Err(TopologyError::UnknownBasin(endpoint.to_string()));
            }
        }

        let relationship = Relationship {
            from: from.to_string(),
            to: to.to_string(),
            weight,
            constraint_type,
        };
        match self
            .relationships
            .iter_mut()
            .find(|r| r.from == from && r.to == to)
        {
            Some(existing) => *existing = relationship,
            None => self.relationships.push(relationship),
        }
        Ok(())
    }

    /// Rebuilds every basin from the `(center, strength)` that `f` returns for it.
    /// Names, registration order and edges are kept as they are.
    pub(crate) fn map_basins<F>(&mut self, mut f: F)
    where
        F: FnMut(&Basin) -> (Point, f64),
    {
        self.basins = self
            .basins
            .iter()
            .map(|basin| {
                let (center, strength) = f(basin);
                Basin::new(center, strength, basin.name())
            })
            .collect();
    }

    /// The registered basins, in registration order.
    pub fn get_basin_list(&self) -> &[Basin] {
        &self.basins
    }

    /// `(name, strength)` for every basin, in registration order.
    pub fn get_virtue_strengths(&self) -> Vec<(&str, f64)> {
        self.basins
            .iter()
            .map(|b| (b.name(), b.strength()))
            .collect()
    }

    /// `1 / (1 + mean distance from point to every basin center)`.
    ///
    /// Uses the mean over all basins, not the nearest one, so a point only scores well
    /// when it is close to all of them at once. An empty topology scores 0.0.
    pub fn compute_alignment_score(&self, point: &[f64]) -> f64 {
        if self.basins.is_empty() {
            return 0.0;
        }
        let mean_distance = self
            .basins
            .iter()
            .map(|b| distance(point, b.center()))
            .sum::<f64>()
            / self.basins.len() as f64;
        1.0 / (1.0 + mean_distance)
    }

    /// Whether no cycle of the graph is made entirely of `Requires` edges.
    ///
    /// Any cycle built only from `Requires` edges is a cycle of the `Requires`
    /// subgraph, so it is enough to look for a cycle there (self-loops included).
    /// An edge whose endpoint cannot be resolved makes the topology invalid.
    pub fn validate_constraints(&self) -> bool {
        let index: HashMap<&str, usize> = self
            .basins
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name(), i))
            .collect();

        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); self.basins.len()];
        for relationship in &self.relationships {
            if relationship.constraint_type != ConstraintType::Requires {
                continue;
            }
            let (Some(&from), Some(&to)) = (
                index.get(relationship.from.as_str()),
                index.get(relationship.to.as_str()),
            ) else {
                return false;
            };
            adjacency[from].push(to);
        }

        !has_cycle(&adjacency)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum VisitState {
    Unvisited,
    OnStack,
    Done,
}

/// Iterative three-colour DFS over an adjacency list.
fn has_cycle(adjacency: &[Vec<usize>]) -> bool {
    let mut state = vec![VisitState::Unvisited; adjacency.len()];

    for root in 0..adjacency.len() {
        if state[root] != VisitState::Unvisited {
            continue;
        }
        // (node, index of the next neighbour to explore)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        state[root] = VisitState::OnStack;

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            if let Some(&neighbour) = adjacency[node].get(frame.1) {
                frame.1 += 1;
                match state[neighbour] {
                    VisitState::OnStack => return true,
                    VisitState::Unvisited => {
                        state[neighbour] = VisitState::OnStack;
                        stack.push((neighbour, 0));
                    }
                    VisitState::Done => {}
                }
            } else {
                state[node] = VisitState::Done;
                stack.pop();
            }
        }
    }
    false
}
