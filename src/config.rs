//! Module implementing the input configuration, i.e., how a simulation declares the spike sources of its virtual
//! populations.
//!
//! ```json
//! {
//!     "population": "lgn",
//!     "input_file": "inputs/lgn_spikes.csv",
//!     "node_ids": [0, 1, 2],
//!     "sim": {"tstop": 3000.0, "seed": 100}
//! }
//! ```

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::error::SNNError;
use super::generator::{GeneratorRegistry, SimContext};
use super::node::Node;
use super::spike_train::{SpikeInput, SpikeTrains};
use super::vecstim::PlaybackEngine;
use super::virtual_cell::VirtualCell;

/// The spike source of a virtual population.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// The name of the virtual population.
    pub population: String,
    /// The spike-train dataset, if any (JSON or space-separated spike report).
    #[serde(default)]
    pub input_file: Option<PathBuf>,
    /// The name of the spike generator, if any. Only used without dataset.
    #[serde(default)]
    pub generator: Option<String>,
    /// The nodes to create. Defaults to every node of the population found in the dataset.
    #[serde(default)]
    pub node_ids: Option<Vec<usize>>,
    /// The simulation parameters handed to the spike generator.
    #[serde(default)]
    pub sim: Option<SimContext>,
}

impl InputConfig {
    /// Load an input configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SNNError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Create one virtual cell per configured node, stopping at the first error.
pub fn build_virtual_cells<E: PlaybackEngine>(
    config: &InputConfig,
    registry: &GeneratorRegistry,
    engine: &mut E,
) -> Result<Vec<VirtualCell<E::Handle>>, SNNError> {
    let dataset = config
        .input_file
        .as_ref()
        .map(SpikeTrains::load)
        .transpose()?;

    let node_ids = match (&config.node_ids, &dataset) {
        (Some(node_ids), _) => node_ids.clone(),
        (None, Some(dataset)) => {
            let node_ids = dataset.node_ids(&config.population);
            if node_ids.is_empty() {
                warn!(
                    "No spikes found for population {} in the dataset (populations found: {:?})",
                    config.population,
                    dataset.populations()
                );
            }
            node_ids
        }
        (None, None) => {
            return Err(SNNError::InvalidParameter(format!(
                "Node IDs of population {} must be given when spikes are not read from a file",
                config.population
            )))
        }
    };

    let cells = node_ids
        .into_iter()
        .map(|node_id| {
            VirtualCell::build(
                Node::new(node_id, &config.population),
                dataset
                    .as_ref()
                    .map(|dataset| SpikeInput::Dataset(dataset)),
                config.generator.as_deref(),
                registry,
                config.sim.as_ref(),
                &mut *engine,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        "{} virtual cells created for population {}",
        cells.len(),
        config.population
    );
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vecstim::VecStimEngine;
    use tempfile::tempdir;

    #[test]
    fn test_input_config_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inputs.json");
        std::fs::write(
            &path,
            r#"{"population": "lgn", "generator": "poisson", "node_ids": [0, 2], "sim": {"tstop": 200.0}}"#,
        )
        .unwrap();

        let config = InputConfig::load(&path).unwrap();
        assert_eq!(
            config,
            InputConfig {
                population: "lgn".to_string(),
                input_file: None,
                generator: Some("poisson".to_string()),
                node_ids: Some(vec![0, 2]),
                sim: Some(SimContext {
                    tstop: 200.0,
                    ..SimContext::default()
                }),
            }
        );

        std::fs::write(&path, r#"{"generator": "poisson"}"#).unwrap();
        assert!(matches!(
            InputConfig::load(&path),
            Err(SNNError::ParseError(_))
        ));
    }

    #[test]
    fn test_build_virtual_cells_from_file() {
        let dir = tempdir().unwrap();
        let spikes_path = dir.path().join("spikes.csv");
        std::fs::write(
            &spikes_path,
            "timestamps population node_ids\n3.0 lgn 1\n1.0 lgn 1\n2.0 lgn 0\n4.0 tw 5\n",
        )
        .unwrap();

        let config = InputConfig {
            population: "lgn".to_string(),
            input_file: Some(spikes_path),
            generator: None,
            node_ids: None,
            sim: None,
        };
        let mut engine = VecStimEngine::new();
        let cells =
            build_virtual_cells(&config, &GeneratorRegistry::new(), &mut engine).unwrap();

        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].node_id(), 0);
        assert_eq!(cells[0].train(), &[2.0]);
        assert_eq!(cells[1].node_id(), 1);
        assert_eq!(cells[1].train(), &[1.0, 3.0]);
    }

    #[test]
    fn test_build_virtual_cells_from_generator() {
        let config = InputConfig {
            population: "bg".to_string(),
            input_file: None,
            generator: Some("regular".to_string()),
            node_ids: Some(vec![0, 1, 2]),
            sim: Some(SimContext {
                tstop: 250.0,
                ..SimContext::default()
            }),
        };
        let mut engine = VecStimEngine::new();
        let cells =
            build_virtual_cells(&config, &GeneratorRegistry::with_builtins(), &mut engine)
                .unwrap();

        assert_eq!(cells.len(), 3);
        assert!(cells
            .iter()
            .all(|cell| cell.train() == &[0.0, 100.0, 200.0]));
        assert_eq!(engine.num_created(), 3);
    }

    #[test]
    fn test_build_virtual_cells_errors() {
        let mut engine = VecStimEngine::new();
        let registry = GeneratorRegistry::with_builtins();

        let config = InputConfig {
            population: "bg".to_string(),
            input_file: None,
            generator: Some("poisson".to_string()),
            node_ids: None,
            sim: None,
        };
        assert!(matches!(
            build_virtual_cells(&config, &registry, &mut engine),
            Err(SNNError::InvalidParameter(_))
        ));

        let config = InputConfig {
            node_ids: Some(vec![4]),
            generator: None,
            ..config
        };
        assert_eq!(
            build_virtual_cells(&config, &registry, &mut engine),
            Err(SNNError::MissingSpikeSource {
                node_id: 4,
                population: "bg".to_string()
            })
        );
    }

    #[test]
    fn test_build_virtual_cells_unknown_population() {
        let dir = tempdir().unwrap();
        let spikes_path = dir.path().join("spikes.csv");
        std::fs::write(&spikes_path, "timestamps population node_ids\n1.0 lgn 0\n").unwrap();

        let config = InputConfig {
            population: "v1".to_string(),
            input_file: Some(spikes_path),
            generator: None,
            node_ids: None,
            sim: None,
        };
        let mut engine = VecStimEngine::new();
        let cells =
            build_virtual_cells(&config, &GeneratorRegistry::new(), &mut engine).unwrap();
        assert!(cells.is_empty());
        assert_eq!(engine.num_created(), 0);
    }
}
