pub mod template;

pub use template::Template;

use crate::config::SimulatorConfig;
use crate::dynamics::{distance, field, ForceField, Point};
use crate::topology::{ConstraintType, Topology};
use log::{debug, info, warn};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Largest tournament used by parent selection
const TOURNAMENT_SIZE: usize = 5;
/// Probability that a child is bred by crossover rather than by mutation
const CROSSOVER_PROBABILITY: f64 = 0.7;
/// Random points drawn per template when estimating convergence
const CONVERGENCE_SAMPLES: usize = 20;
/// Scale of the Gaussian used to draw convergence sample points
const SAMPLE_SPREAD: f64 = 2.0;
/// Iteration cap of the equilibrium search during fitness evaluation
const CONVERGENCE_ITERATIONS: usize = 100;
/// Radius within which an equilibrium counts as captured by a basin
const CAPTURE_THRESHOLD: f64 = 1.0;
/// Range of initial basin strengths
const STRENGTH_RANGE: std::ops::Range<f64> = 0.5..2.0;
/// Range of initial relationship weights
const WEIGHT_RANGE: std::ops::Range<f64> = 0.5..1.5;
/// Every generation is logged at info level when `run` is verbose and
/// `generation % LOG_INTERVAL == 0`
const LOG_INTERVAL: usize = 10;

#[derive(Error, Debug, PartialEq)]
pub enum SimulationError {
    #[error("Population is empty, call initialize_population before run")]
    EmptyPopulation,
    #[error("Cannot initialize a population without virtue names")]
    NoVirtueNames,
}

/// Summary of the current population, see `Simulator::get_statistics`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationStatistics {
    pub generation: usize,
    pub best_fitness: f64,
    pub avg_fitness: f64,
    pub std_fitness: f64,
    pub population_size: usize,
}

/// Breakdown of one fitness evaluation, kept for debug logging.
#[derive(Debug, Copy, Clone)]
struct FitnessEvaluationReport {
    separation: f64,
    balance: f64,
    convergence: f64,
    connectivity: f64,
}

impl FitnessEvaluationReport {
    fn total(&self) -> f64 {
        1.0 + self.separation + self.balance + self.convergence + self.connectivity
    }
}

/// Drives the evolutionary search over basin topologies.
///
/// Owns the population, the generation counter and the random source every operator
/// draws from. A fixed seed reproduces a run exactly, whatever the number of threads
/// used for evaluation.
#[derive(Debug, Clone)]
pub struct Simulator {
    dimension: usize,
    population_size: usize,
    mutation_rate: f64,
    elite_size: usize,
    force_field: ForceField,
    population: Vec<Template>,
    generation: usize,
    /// Snapshot of the best template seen in any generation. Tracking only, it never
    /// takes part in breeding.
    best_template: Option<Template>,
    rng: StdRng,
}

impl Simulator {
    /// Creates a new Simulator seeded from OS entropy
    ///
    /// # Arguments
    /// * `dimension` - Dimension of the state space every basin lives in
    /// * `population_size` - Number of templates kept in each generation
    /// * `mutation_rate` - Probability and scale of basin mutation
    /// * `elite_size` - Number of top templates carried unchanged into the next generation
    pub fn new(
        dimension: usize,
        population_size: usize,
        mutation_rate: f64,
        elite_size: usize,
    ) -> Self {
        if elite_size > population_size {
            warn!(
                "elite size {} exceeds population size {}, every template will be an elite",
                elite_size, population_size
            );
        }
        Self {
            dimension,
            population_size,
            mutation_rate,
            elite_size,
            force_field: ForceField::default(),
            population: Vec::with_capacity(population_size),
            generation: 0,
            best_template: None,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Builds a Simulator from a `SimulatorConfig`, honouring its seed and field strength.
    pub fn from_config(config: &SimulatorConfig) -> Self {
        let simulator = Self::new(
            config.dimension,
            config.population_size,
            config.mutation_rate,
            config.elite_size,
        )
        .with_field_strength(config.field_strength);

        match config.seed {
            Some(seed) => simulator.with_seed(seed),
            None => simulator,
        }
    }

    /// Reseeds the random source so that the run becomes reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Sets the global multiplier of the force field used during fitness evaluation.
    pub fn with_field_strength(mut self, field_strength: f64) -> Self {
        self.force_field = ForceField::new(field_strength);
        self
    }

    pub fn population(&self) -> &[Template] {
        &self.population
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn best_template(&self) -> Option<&Template> {
        self.best_template.as_ref()
    }

    /// Fills the population with random templates.
    ///
    /// Every template draws `min(n_virtues, virtue_names.len())` distinct names, places
    /// each at a standard Gaussian center with a strength uniform in `[0.5, 2.0)`, then
    /// attempts a number of random relationships uniform in `[n, 2n)`. Attempts that
    /// cannot be satisfied are discarded, so a template may end up with fewer edges.
    ///
    /// # Arguments
    /// * `virtue_names` - Candidate basin names
    /// * `n_virtues` - Basins per template, all of `virtue_names` when `None`
    ///
    /// # Returns
    /// * `Result<(), SimulationError>` - `NoVirtueNames` if `virtue_names` is empty
    pub fn initialize_population<S: AsRef<str>>(
        &mut self,
        virtue_names: &[S],
        n_virtues: Option<usize>,
    ) -> Result<(), SimulationError> {
        if virtue_names.is_empty() {
            return Err(SimulationError::NoVirtueNames);
        }
        let names: Vec<&str> = virtue_names.iter().map(AsRef::as_ref).collect();
        // Zero basins per template means "every name", like an absent count
        let n = n_virtues
            .filter(|&count| count > 0)
            .unwrap_or(names.len())
            .min(names.len());

        self.population = (0..self.population_size)
            .map(|_| random_template(self.dimension, &names, n, &mut self.rng))
            .collect();
        self.generation = 0;
        self.best_template = None;
        Ok(())
    }

    /// Scores a template. Higher is better.
    ///
    /// Invalid topologies and empty ones score exactly 0.0. Otherwise the score is
    /// `1.0` plus:
    /// * separation: mean `tanh` of pairwise center distances (1.0 for a single basin)
    /// * balance: `0.5 / (1 + variance of strengths)`
    /// * convergence: `2.0 ×` the fraction of 20 random points whose equilibrium lands
    ///   within 1.0 of some basin
    /// * connectivity: `0.5 × edges / (n·(n−1))` when there are at least two basins
    ///
    /// # Arguments
    /// * `template` - The template to evaluate
    /// * `rng` - Random source for the convergence sample points
    pub fn fitness_function<R: Rng + ?Sized>(&self, template: &Template, rng: &mut R) -> f64 {
        let topology = template.topology();
        if topology.is_empty() || !template.is_valid() {
            return 0.0;
        }

        let basins = topology.get_basin_list();
        let n = basins.len();
        let separation = if n > 1 {
            let mut total = 0.0;
            let mut pairs = 0usize;
            for i in 0..n {
                for j in (i + 1)..n {
                    total += distance(basins[i].center(), basins[j].center()).tanh();
                    pairs += 1;
                }
            }
            total / pairs as f64
        } else {
            1.0
        };

        let strengths: Vec<f64> = basins.iter().map(|b| b.strength()).collect();
        let balance = 0.5 / (1.0 + variance(&strengths));

        let dimension = topology.dimension();
        let captured = (0..CONVERGENCE_SAMPLES)
            .filter(|_| {
                let start: Point = (0..dimension)
                    .map(|_| rng.sample::<f64, _>(StandardNormal) * SAMPLE_SPREAD)
                    .collect();
                let equilibrium = self.force_field.find_equilibrium(
                    &start,
                    basins,
                    CONVERGENCE_ITERATIONS,
                    field::DEFAULT_TOLERANCE,
                );
                basins
                    .iter()
                    .any(|b| b.contains(&equilibrium, CAPTURE_THRESHOLD))
            })
            .count();
        let convergence = 2.0 * captured as f64 / CONVERGENCE_SAMPLES as f64;

        let connectivity = if n > 1 {
            0.5 * topology.edge_count() as f64 / (n * (n - 1)) as f64
        } else {
            0.0
        };

        let report = FitnessEvaluationReport {
            separation,
            balance,
            convergence,
            connectivity,
        };

        debug!(
            "Fitness: separation={:.4}, balance={:.4}, convergence={:.4}, connectivity={:.4}, final={:.4}",
            report.separation,
            report.balance,
            report.convergence,
            report.connectivity,
            report.total()
        );
        report.total()
    }

    /// Evaluates the population
    ///
    /// Recomputes the fitness of every template and stamps it with the current
    /// generation. Nothing is cached: elites are re-scored with fresh sample points.
    /// Templates are scored in parallel, each with its own random stream seeded from
    /// the simulator's source in population order.
    pub fn evaluate_population(&mut self) {
        let seeds: Vec<u64> = (0..self.population.len())
            .map(|_| self.rng.random())
            .collect();

        let scores: Vec<f64> = self
            .population
            .par_iter()
            .zip(seeds.par_iter())
            .map(|(template, seed)| {
                let mut rng = StdRng::seed_from_u64(*seed);
                self.fitness_function(template, &mut rng)
            })
            .collect();

        let generation = self.generation;
        for (template, fitness) in self.population.iter_mut().zip(scores) {
            template.fitness = fitness;
            template.generation = generation;
        }
    }

    /// Selects two parents by independent tournaments of up to five distinct templates.
    /// The same template may win both tournaments.
    ///
    /// # Returns
    /// * `Result<(&Template, &Template), SimulationError>` - `EmptyPopulation` if there is
    /// nobody to select from
    pub fn select_parents(&mut self) -> Result<(&Template, &Template), SimulationError> {
        if self.population.is_empty() {
            return Err(SimulationError::EmptyPopulation);
        }
        let first = tournament(&self.population, &mut self.rng);
        let second = tournament(&self.population, &mut self.rng);
        Ok((&self.population[first], &self.population[second]))
    }

    /// Replaces the population with the next generation.
    ///
    /// The population is sorted best first and the best template is remembered if it
    /// beats every earlier one. The top `elite_size` templates move on as they are
    /// (sharing their genome), the remaining slots are bred: with probability 0.7 by
    /// crossover of two tournament winners, otherwise by mutating one of them picked
    /// by a coin flip. Any child, crossover children included, is then mutated once
    /// more with probability `mutation_rate`.
    pub fn evolve_generation(&mut self) {
        sort_by_fitness(&mut self.population);

        if let Some(top) = self.population.first() {
            let improved = self
                .best_template
                .as_ref()
                .map_or(true, |best| top.fitness > best.fitness);
            if improved {
                self.best_template = Some(top.clone());
            }
        }

        let mut next_generation: Vec<Template> = self
            .population
            .iter()
            .take(self.elite_size)
            .cloned()
            .collect();

        if !self.population.is_empty() {
            let rng = &mut self.rng;
            while next_generation.len() < self.population_size {
                let parent1 = &self.population[tournament(&self.population, rng)];
                let parent2 = &self.population[tournament(&self.population, rng)];

                let mut child = if rng.random::<f64>() < CROSSOVER_PROBABILITY {
                    parent1.crossover(parent2)
                } else {
                    let parent = if rng.random_bool(0.5) { parent1 } else { parent2 };
                    parent.mutate(self.mutation_rate, rng)
                };

                if rng.random::<f64>() < self.mutation_rate {
                    child = child.mutate(self.mutation_rate, rng);
                }
                next_generation.push(child);
            }
        }

        self.population = next_generation;
        self.generation += 1;
    }

    /// Runs the evolution process
    ///
    /// Evaluates the current population once, then performs `generations` rounds of
    /// `evolve_generation` followed by `evaluate_population`.
    ///
    /// # Arguments
    /// * `generations` - Number of generations to breed
    /// * `verbose` - Log statistics every tenth generation
    ///
    /// # Returns
    /// * `Result<Template, SimulationError>` - The fittest template of the final
    /// population, which is not necessarily `best_template`. `EmptyPopulation` if the
    /// population was never initialized.
    pub fn run(&mut self, generations: usize, verbose: bool) -> Result<Template, SimulationError> {
        if self.population.is_empty() {
            return Err(SimulationError::EmptyPopulation);
        }

        self.evaluate_population();

        for round in 0..generations {
            self.evolve_generation();
            self.evaluate_population();

            if verbose && round % LOG_INTERVAL == 0 {
                let stats = self.get_statistics();
                info!(
                    "Gen {}: Best Fitness={:.4} | Avg Fitness={:.4} | Std={:.4}",
                    stats.generation, stats.best_fitness, stats.avg_fitness, stats.std_fitness
                );
            }
        }

        sort_by_fitness(&mut self.population);
        self.population
            .first()
            .cloned()
            .ok_or(SimulationError::EmptyPopulation)
    }

    /// Fitness statistics of the current population. All zero when it is empty.
    pub fn get_statistics(&self) -> PopulationStatistics {
        let fitnesses: Vec<f64> = self.population.iter().map(|t| t.fitness).collect();
        if fitnesses.is_empty() {
            return PopulationStatistics {
                generation: self.generation,
                best_fitness: 0.0,
                avg_fitness: 0.0,
                std_fitness: 0.0,
                population_size: 0,
            };
        }

        PopulationStatistics {
            generation: self.generation,
            best_fitness: fitnesses.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            avg_fitness: mean(&fitnesses),
            std_fitness: variance(&fitnesses).sqrt(),
            population_size: fitnesses.len(),
        }
    }
}

/// Builds one random template for `initialize_population`.
fn random_template(dimension: usize, names: &[&str], n: usize, rng: &mut StdRng) -> Template {
    let mut topology = Topology::new(dimension);
    let chosen: Vec<&str> = names.choose_multiple(rng, n).copied().collect();

    for name in &chosen {
        let center: Point = (0..dimension)
            .map(|_| rng.sample::<f64, _>(StandardNormal))
            .collect();
        let strength = rng.random_range(STRENGTH_RANGE);
        if let Err(e) = topology.add_virtue(name, center, strength) {
            warn!("Skipping basin during initialization: {}", e);
        }
    }

    if n > 0 {
        let attempts = rng.random_range(n..2 * n);
        for _ in 0..attempts {
            let endpoints: Vec<&str> = chosen.choose_multiple(rng, 2).copied().collect();
            let weight = rng.random_range(WEIGHT_RANGE);
            let constraint_type = ConstraintType::sample(rng);

            let &[from, to] = endpoints.as_slice() else {
                debug!("Discarding relationship attempt: fewer than two basins to connect");
                continue;
            };
            if let Err(e) = topology.add_relationship(from, to, weight, constraint_type) {
                debug!("Discarding relationship attempt: {}", e);
            }
        }
    }

    Template::new(topology)
}

/// Index of the fittest of up to `TOURNAMENT_SIZE` distinct contestants. Ties go to
/// the contestant drawn first. `population` must not be empty.
fn tournament<R: Rng + ?Sized>(population: &[Template], rng: &mut R) -> usize {
    let size = TOURNAMENT_SIZE.min(population.len());
    rand::seq::index::sample(rng, population.len(), size)
        .into_iter()
        .reduce(|best, contestant| {
            if population[contestant].fitness > population[best].fitness {
                contestant
            } else {
                best
            }
        })
        .unwrap_or(0)
}

/// Sorts best first. NaN fitness compares as equal.
fn sort_by_fitness(population: &mut [Template]) {
    population.sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap_or(Ordering::Equal));
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance, 0.0 for an empty slice.
fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIRTUES: [&str; 3] = ["honesty", "compassion", "courage"];

    // Helper to create a small, seeded simulator for testing
    fn get_test_simulator() -> Simulator {
        Simulator::new(3, 10, 0.1, 2).with_seed(42)
    }

    fn template_from(
        basins: &[(&str, Point, f64)],
        edges: &[(&str, &str, ConstraintType)],
    ) -> Template {
        let dimension = basins.first().map_or(2, |(_, c, _)| c.len());
        let mut topology = Topology::new(dimension);
        for (name, center, strength) in basins {
            topology.add_virtue(name, center.clone(), *strength).unwrap();
        }
        for (from, to, kind) in edges {
            topology.add_relationship(from, to, 1.0, *kind).unwrap();
        }
        Template::new(topology)
    }

    #[test]
    fn test_initialize_population() {
        let mut simulator = get_test_simulator();
        simulator.initialize_population(&VIRTUES, Some(2)).unwrap();

        assert_eq!(simulator.population().len(), 10);
        for template in simulator.population() {
            let topology = template.topology();
            assert_eq!(topology.len(), 2);
            assert_eq!(topology.dimension(), 3);
            assert_eq!(template.fitness, 0.0);
            for basin in topology.get_basin_list() {
                assert!(VIRTUES.contains(&basin.name()));
                assert!(STRENGTH_RANGE.contains(&basin.strength()));
            }
            // Two basins allow at most two ordered pairs
            assert!(topology.edge_count() <= 2);
            for edge in topology.relationships() {
                assert_ne!(edge.from, edge.to);
                assert!(WEIGHT_RANGE.contains(&edge.weight));
            }
        }
    }

    #[test]
    fn test_initialize_population_clamps_virtue_count() {
        let mut simulator = get_test_simulator();
        simulator.initialize_population(&VIRTUES, Some(10)).unwrap();
        assert!(simulator.population().iter().all(|t| t.topology().len() == 3));

        simulator.initialize_population(&VIRTUES, None).unwrap();
        assert!(simulator.population().iter().all(|t| t.topology().len() == 3));
    }

    #[test]
    fn test_initialize_population_zero_virtues_uses_every_name() {
        let mut simulator = Simulator::new(3, 4, 0.1, 1).with_seed(1);
        simulator.initialize_population(&VIRTUES, Some(0)).unwrap();
        assert!(simulator.population().iter().all(|t| t.topology().len() == 3));

        let champion = simulator.run(2, false).unwrap();
        assert!(champion.fitness > 0.0);
    }

    #[test]
    fn test_initialize_population_single_virtue_has_no_edges() {
        let mut simulator = get_test_simulator();
        simulator.initialize_population(&VIRTUES, Some(1)).unwrap();
        for template in simulator.population() {
            assert_eq!(template.topology().len(), 1);
            assert_eq!(template.topology().edge_count(), 0);
        }
    }

    #[test]
    fn test_initialize_population_without_names() {
        let mut simulator = get_test_simulator();
        let empty: [&str; 0] = [];
        assert_eq!(
            simulator.initialize_population(&empty, None),
            Err(SimulationError::NoVirtueNames)
        );
    }

    #[test]
    fn test_fitness_zero_for_empty_topology() {
        let simulator = get_test_simulator();
        let mut rng = StdRng::seed_from_u64(1);
        let empty = Template::new(Topology::new(3));
        assert_eq!(simulator.fitness_function(&empty, &mut rng), 0.0);
    }

    #[test]
    fn test_fitness_zero_for_requires_cycle() {
        let simulator = get_test_simulator();
        let mut rng = StdRng::seed_from_u64(1);
        let cyclic = template_from(
            &[
                ("honesty", vec![0.0, 0.0, 0.0], 1.0),
                ("courage", vec![3.0, 0.0, 0.0], 1.0),
            ],
            &[
                ("honesty", "courage", ConstraintType::Requires),
                ("courage", "honesty", ConstraintType::Requires),
            ],
        );
        assert_eq!(simulator.fitness_function(&cyclic, &mut rng), 0.0);
    }

    #[test]
    fn test_fitness_components_bounds() {
        let simulator = get_test_simulator();
        let mut rng = StdRng::seed_from_u64(9);

        // Single basin: separation 1.0, balance 0.5, no connectivity term
        let single = template_from(&[("honesty", vec![0.0, 0.0, 0.0], 1.0)], &[]);
        let fitness = simulator.fitness_function(&single, &mut rng);
        assert!((2.5..=4.5).contains(&fitness));

        // Fully connected pair: connectivity contributes 0.5
        let pair = template_from(
            &[
                ("honesty", vec![0.0, 0.0, 0.0], 1.0),
                ("courage", vec![0.0, 0.0, 50.0], 1.0),
            ],
            &[
                ("honesty", "courage", ConstraintType::Supports),
                ("courage", "honesty", ConstraintType::Opposes),
            ],
        );
        let fitness = simulator.fitness_function(&pair, &mut rng);
        // 1.0 + separation ~1.0 + balance 0.5 + connectivity 0.5 + convergence in [0, 2]
        assert!(fitness > 2.99 && fitness <= 5.0);
    }

    #[test]
    fn test_fitness_is_deterministic_for_a_seed() {
        let simulator = get_test_simulator();
        let template = template_from(
            &[
                ("honesty", vec![0.0, 0.0, 0.0], 1.0),
                ("courage", vec![1.0, 1.0, 0.0], 1.5),
            ],
            &[],
        );
        let a = simulator.fitness_function(&template, &mut StdRng::seed_from_u64(5));
        let b = simulator.fitness_function(&template, &mut StdRng::seed_from_u64(5));
        assert_eq!(a, b);
    }

    #[test]
    fn test_evaluate_population_stamps_generation() {
        let mut simulator = get_test_simulator();
        simulator.initialize_population(&VIRTUES, Some(2)).unwrap();
        simulator.evolve_generation();
        simulator.evaluate_population();

        for template in simulator.population() {
            assert_eq!(template.generation, 1);
            assert!(template.fitness >= 0.0);
        }
    }

    #[test]
    fn test_tournament_selection() {
        let mut simulator = Simulator::new(2, 5, 0.1, 1).with_seed(3);
        simulator.initialize_population(&VIRTUES, Some(2)).unwrap();

        // Set different fitness values, create a clear hierarchy
        for (i, template) in simulator.population.iter_mut().enumerate() {
            template.fitness = i as f64;
        }

        // A population of five is entirely inside every tournament
        let (parent1, parent2) = simulator.select_parents().unwrap();
        assert_eq!(parent1.fitness, 4.0);
        assert_eq!(parent2.fitness, 4.0);
    }

    #[test]
    fn test_tournament_favours_fitter_templates() {
        let mut simulator = Simulator::new(2, 40, 0.1, 1).with_seed(8);
        simulator.initialize_population(&VIRTUES, Some(2)).unwrap();
        for (i, template) in simulator.population.iter_mut().enumerate() {
            template.fitness = i as f64;
        }

        let mut total = 0.0;
        for _ in 0..200 {
            let (parent1, parent2) = simulator.select_parents().unwrap();
            total += parent1.fitness + parent2.fitness;
        }
        // Uniform picking would average 19.5
        assert!(total / 400.0 > 25.0);
    }

    #[test]
    fn test_select_parents_on_empty_population() {
        let mut simulator = get_test_simulator();
        assert!(matches!(
            simulator.select_parents(),
            Err(SimulationError::EmptyPopulation)
        ));
    }

    #[test]
    fn test_evolve_generation_keeps_size_and_elites() {
        let mut simulator = get_test_simulator();
        simulator.initialize_population(&VIRTUES, Some(2)).unwrap();
        for (i, template) in simulator.population.iter_mut().enumerate() {
            template.fitness = i as f64;
        }
        let best = simulator.population[9].clone();
        let runner_up = simulator.population[8].clone();

        simulator.evolve_generation();

        assert_eq!(simulator.generation(), 1);
        assert_eq!(simulator.population().len(), 10);
        // Elites are carried over first and share their genome with the originals
        assert!(simulator.population()[0].shares_genome_with(&best));
        assert!(simulator.population()[1].shares_genome_with(&runner_up));
        assert_eq!(simulator.population()[0].fitness, 9.0);

        let tracked = simulator.best_template().unwrap();
        assert!(tracked.shares_genome_with(&best));
        assert_eq!(tracked.fitness, 9.0);
    }

    // Helper filling the population with copies of a single genome
    fn get_uniform_simulator(mutation_rate: f64) -> (Simulator, Template) {
        let ancestor = template_from(
            &[
                ("honesty", vec![0.0, 0.0, 0.0], 1.0),
                ("courage", vec![2.0, 1.0, 0.0], 1.5),
            ],
            &[("honesty", "courage", ConstraintType::Supports)],
        );
        let mut simulator = Simulator::new(3, 10, mutation_rate, 2).with_seed(21);
        simulator.population = vec![ancestor.clone(); 10];
        (simulator, ancestor)
    }

    #[test]
    fn test_every_bred_child_is_mutated_at_full_rate() {
        let (mut simulator, ancestor) = get_uniform_simulator(1.0);
        simulator.evolve_generation();

        // Crossover of identical parents reproduces them exactly, so a changed
        // center on every child means the second mutation ran on crossover children too
        for child in &simulator.population()[2..] {
            for (original, bred) in ancestor
                .topology()
                .get_basin_list()
                .iter()
                .zip(child.topology().get_basin_list())
            {
                assert_eq!(original.name(), bred.name());
                assert_ne!(original.center(), bred.center());
            }
        }
    }

    #[test]
    fn test_bred_children_own_fresh_genomes() {
        let (mut simulator, ancestor) = get_uniform_simulator(0.1);
        simulator.evolve_generation();

        let population = simulator.population();
        assert!(population[..2].iter().all(|t| t.shares_genome_with(&ancestor)));
        for child in &population[2..] {
            assert!(!child.shares_genome_with(&ancestor));
            assert_eq!(child.fitness, 0.0);
        }
    }

    #[test]
    fn test_best_template_only_improves() {
        let mut simulator = get_test_simulator();
        simulator.initialize_population(&VIRTUES, Some(2)).unwrap();
        for template in simulator.population.iter_mut() {
            template.fitness = 5.0;
        }
        simulator.evolve_generation();

        for template in simulator.population.iter_mut() {
            template.fitness = 1.0;
        }
        simulator.evolve_generation();

        assert_eq!(simulator.best_template().unwrap().fitness, 5.0);
    }

    #[test]
    fn test_run_requires_population() {
        let mut simulator = get_test_simulator();
        assert!(matches!(
            simulator.run(5, false),
            Err(SimulationError::EmptyPopulation)
        ));
    }

    #[test]
    fn test_full_evolution_run_completes() {
        let mut simulator = get_test_simulator();
        simulator.initialize_population(&VIRTUES, Some(2)).unwrap();

        let champion = simulator.run(5, false).unwrap();

        assert_eq!(simulator.generation(), 5);
        assert_eq!(simulator.population().len(), 10);
        assert!(champion.fitness > 0.0);

        // Population is left sorted by fitness (descending)
        for pair in simulator.population().windows(2) {
            assert!(pair[0].fitness >= pair[1].fitness);
        }
        assert_eq!(champion.fitness, simulator.population()[0].fitness);
    }

    #[test]
    fn test_run_is_reproducible_with_seed() {
        let run = || {
            let mut simulator = Simulator::new(2, 8, 0.2, 1).with_seed(1234);
            simulator.initialize_population(&VIRTUES, Some(3)).unwrap();
            simulator.run(3, false).unwrap();
            simulator.get_statistics()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_statistics() {
        let mut simulator = get_test_simulator();
        assert_eq!(simulator.get_statistics().population_size, 0);
        assert_eq!(simulator.get_statistics().best_fitness, 0.0);

        simulator.initialize_population(&VIRTUES, Some(2)).unwrap();
        for (i, template) in simulator.population.iter_mut().enumerate() {
            template.fitness = if i % 2 == 0 { 1.0 } else { 3.0 };
        }
        let stats = simulator.get_statistics();
        assert_eq!(stats.generation, 0);
        assert_eq!(stats.population_size, 10);
        assert_eq!(stats.best_fitness, 3.0);
        assert_eq!(stats.avg_fitness, 2.0);
        assert_eq!(stats.std_fitness, 1.0);
    }
}
