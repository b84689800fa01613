//! Plain-data export of an evolved template.
//!
//! The snapshot carries everything needed to rebuild the winning topology (basin
//! centers and strengths, typed edges) together with its score and the settings of
//! the run that produced it.

use crate::config::SimulatorConfig;
use crate::evolution::{PopulationStatistics, Template};
use crate::topology::{Relationship, Topology, TopologyError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to access export file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to (de)serialize export: {0}")]
    Json(#[from] serde_json::Error),
}

/// Export of one template with run metadata.
#[derive(Serialize, Deserialize, Debug)]
pub struct TemplateExport {
    /// Schema version for forward/backward compatibility
    pub schema_version: String,
    /// Unix timestamp when export was generated
    pub generated_at: u64,
    /// Settings of the simulator that produced the template
    pub simulator_config: SimulatorConfig,
    /// Statistics of the final population
    pub statistics: PopulationStatistics,
    pub fitness: f64,
    pub generation: usize,
    pub dimension: usize,
    pub basins: Vec<BasinData>,
    pub relationships: Vec<Relationship>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BasinData {
    pub name: String,
    pub center: Vec<f64>,
    pub strength: f64,
}

impl TemplateExport {
    /// Creates a new export of `template`.
    ///
    /// # Arguments
    /// * `template` - The template to export, usually the champion returned by `run`
    /// * `statistics` - Statistics of the population it came from
    /// * `simulator_config` - Configuration of the run
    pub fn new(
        template: &Template,
        statistics: &PopulationStatistics,
        simulator_config: &SimulatorConfig,
    ) -> Self {
        let topology = template.topology();
        let basins = topology
            .get_basin_list()
            .iter()
            .map(|b| BasinData {
                name: b.name().to_string(),
                center: b.center().to_vec(),
                strength: b.strength(),
            })
            .collect();

        Self {
            schema_version: "1.0.0".to_string(),
            generated_at: chrono::Utc::now().timestamp() as u64,
            simulator_config: simulator_config.clone(),
            statistics: *statistics,
            fitness: template.fitness,
            generation: template.generation,
            dimension: topology.dimension(),
            basins,
            relationships: topology.relationships().cloned().collect(),
        }
    }

    /// Rebuilds the exported topology.
    ///
    /// # Returns
    /// * `Result<Topology, TopologyError>` - Fails if a basin has the wrong dimension or
    /// an edge names an unknown basin
    pub fn to_topology(&self) -> Result<Topology, TopologyError> {
        let mut topology = Topology::new(self.dimension);
        for basin in &self.basins {
            topology.add_virtue(&basin.name, basin.center.clone(), basin.strength)?;
        }
        for edge in &self.relationships {
            topology.add_relationship(&edge.from, &edge.to, edge.weight, edge.constraint_type)?;
        }
        Ok(topology)
    }
}

/// Writes a template export to a JSON file.
pub fn write_export_to_json(export: &TemplateExport, output_path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(export)?;
    std::fs::write(output_path, json)?;
    Ok(())
}

/// Reads a template export from a JSON file.
pub fn read_export_from_json(input_path: &Path) -> Result<TemplateExport, ExportError> {
    let content = std::fs::read_to_string(input_path)?;
    let export: TemplateExport = serde_json::from_str(&content)?;
    Ok(export)
}
