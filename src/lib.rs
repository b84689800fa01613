//! # virtue_basin
//!
//! Evolutionary search for stable multi-attractor configurations.
//!
//! A configuration is a `Topology`: a small directed graph of named basins, each
//! pulling points of a continuous state space toward its center with an
//! inverse-square force, connected by typed constraint edges. The `Simulator` runs a
//! generational genetic algorithm over `Template`s (topology genomes), rewarding
//! configurations that are free of contradictory `requires` cycles and that capture
//! randomly sampled points into some basin.

pub mod config;
pub mod dynamics;
pub mod evolution;
pub mod export;
pub mod topology;
