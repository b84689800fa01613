use crate::topology::Topology;
use log::warn;
use rand::Rng;
use rand_distr::StandardNormal;
use std::sync::Arc;

/// Mutation never lets a basin's strength drop below this floor.
const MIN_STRENGTH: f64 = 0.1;

/// A genome: one basin topology plus the bookkeeping the simulator writes onto it.
///
/// The topology sits behind an `Arc` and is never modified once the template exists.
/// Cloning a template (as elitism does) therefore shares an immutable genome, and the
/// only per-copy state is `fitness` and `generation`.
#[derive(Debug, Clone)]
pub struct Template {
    topology: Arc<Topology>,
    /// Score assigned by the last evaluation pass, 0.0 until evaluated
    pub fitness: f64,
    /// Generation in which the simulator last evaluated this template
    pub generation: usize,
}

impl Template {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology: Arc::new(topology),
            fitness: 0.0,
            generation: 0,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Whether two templates carry the very same genome allocation.
    pub fn shares_genome_with(&self, other: &Template) -> bool {
        Arc::ptr_eq(&self.topology, &other.topology)
    }

    /// Produces a drifted copy of this template.
    ///
    /// Each basin independently has its center shifted by isotropic Gaussian noise of
    /// scale `rate` with probability `rate`, then, independently, its strength scaled by
    /// `1 + N(0, 1) * rate` with probability `rate` (floored at 0.1). Edges are carried
    /// over untouched. The child's fitness is 0.0.
    ///
    /// # Arguments
    /// * `rate` - Both the per-basin mutation probability and the noise scale
    /// * `rng` - Random source to draw from
    pub fn mutate<R: Rng + ?Sized>(&self, rate: f64, rng: &mut R) -> Template {
        let mut topology = Topology::clone(&self.topology);

        topology.map_basins(|basin| {
            let mut center = basin.center().to_vec();
            let mut strength = basin.strength();

            if rng.random::<f64>() < rate {
                center
                    .iter_mut()
                    .for_each(|c| *c += rng.sample::<f64, _>(StandardNormal) * rate);
            }
            if rng.random::<f64>() < rate {
                let factor = 1.0 + rng.sample::<f64, _>(StandardNormal) * rate;
                strength = (strength * factor).max(MIN_STRENGTH);
            }
            (center, strength)
        });

        Template::new(topology)
    }

    /// Recombines two templates into a new one.
    ///
    /// The child holds the union of both parents' basins. A basin present in both gets
    /// the mean center and mean strength of the pair; a basin present in one parent is
    /// copied unchanged. The child starts with no edges at all, so relationship
    /// structure is only ever inherited through `mutate`.
    pub fn crossover(&self, other: &Template) -> Template {
        let mut topology = Topology::new(self.topology.dimension());

        for basin in self.topology.get_basin_list() {
            let (center, strength) = match other.topology.basin(basin.name()) {
                Some(partner) => (
                    basin
                        .center()
                        .iter()
                        .zip(partner.center())
                        .map(|(a, b)| (a + b) / 2.0)
                        .collect(),
                    (basin.strength() + partner.strength()) / 2.0,
                ),
                None => (basin.center().to_vec(), basin.strength()),
            };
            if let Err(e) = topology.add_virtue(basin.name(), center, strength) {
                warn!("crossover dropped basin: {}", e);
            }
        }

        for basin in other.topology.get_basin_list() {
            if topology.contains_basin(basin.name()) {
                continue;
            }
            if let Err(e) =
                topology.add_virtue(basin.name(), basin.center().to_vec(), basin.strength())
            {
                warn!("crossover dropped basin: {}", e);
            }
        }

        Template::new(topology)
    }

    pub fn is_valid(&self) -> bool {
        self.topology.validate_constraints()
    }
}
