//! This module provides the `VirtualCell` structure, the representation of a virtual (external) node whose activity
//! is replayed from a spike-train dataset or a spike generator instead of being simulated.

use itertools::Itertools;
use log::{debug, error};
use serde_json::Value;

use super::error::SNNError;
use super::generator::{GeneratorRegistry, SimContext};
use super::node::Node;
use super::spike_train::SpikeInput;
use super::vecstim::PlaybackEngine;

/// Represents a virtual cell, i.e., a node replaying a fixed spike train through a playback object of the engine.
#[derive(Debug, PartialEq, Clone)]
pub struct VirtualCell<H> {
    /// The node the cell stands for.
    node: Node,
    /// The (sorted) spike train handed to the playback object.
    train: Vec<f64>,
    /// The engine-side playback object.
    hobj: H,
}

impl<H> VirtualCell<H> {
    /// Create a virtual cell replaying the spikes of the dataset if any, or else the spikes produced by the named
    /// generator.
    /// The function returns an error if neither source is provided, if the generator is unknown, or if the spike
    /// train is invalid (e.g., with negative times).
    pub fn build<E>(
        node: Node,
        dataset: Option<SpikeInput>,
        generator: Option<&str>,
        registry: &GeneratorRegistry,
        sim: Option<&SimContext>,
        engine: &mut E,
    ) -> Result<Self, SNNError>
    where
        E: PlaybackEngine<Handle = H>,
    {
        let spikes = match (dataset, generator) {
            (Some(input), _) => input.resolve(node.node_id(), node.population()),
            (None, Some(name)) => generate(&node, name, registry, sim)?,
            (None, None) => {
                let e = SNNError::MissingSpikeSource {
                    node_id: node.node_id(),
                    population: node.population().to_string(),
                };
                error!("{}", e);
                return Err(e);
            }
        };

        let (train, hobj) = playback(spikes, engine)?;
        debug!(
            "Virtual cell #{} from {} replays {} spikes",
            node.node_id(),
            node.population(),
            train.len()
        );
        Ok(VirtualCell { node, train, hobj })
    }

    /// Replace the replayed spikes by the ones of the provided input.
    /// On error, the cell is left unchanged.
    pub fn set_stim<E>(&mut self, input: SpikeInput, engine: &mut E) -> Result<(), SNNError>
    where
        E: PlaybackEngine<Handle = H>,
    {
        let spikes = input.resolve(self.node.node_id(), self.node.population());
        (self.train, self.hobj) = playback(spikes, engine)?;
        Ok(())
    }

    /// Replace the replayed spikes by the ones produced by the named generator.
    /// On error, the cell is left unchanged.
    pub fn set_stim_from_generator<E>(
        &mut self,
        name: &str,
        registry: &GeneratorRegistry,
        sim: Option<&SimContext>,
        engine: &mut E,
    ) -> Result<(), SNNError>
    where
        E: PlaybackEngine<Handle = H>,
    {
        let spikes = generate(&self.node, name, registry, sim)?;
        (self.train, self.hobj) = playback(spikes, engine)?;
        Ok(())
    }

    /// Returns the ID of the node.
    pub fn node_id(&self) -> usize {
        self.node.node_id()
    }

    /// Returns the population of the node.
    pub fn population(&self) -> &str {
        self.node.population()
    }

    /// Returns the node the cell stands for.
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Returns the engine-side playback object.
    pub fn hobj(&self) -> &H {
        &self.hobj
    }

    /// Returns a slice of the (sorted) replayed spike times.
    pub fn train(&self) -> &[f64] {
        &self.train[..]
    }

    /// Returns the node property stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.node.get(key)
    }
}

/// Returns the spikes produced by the named generator for the given node.
fn generate(
    node: &Node,
    name: &str,
    registry: &GeneratorRegistry,
    sim: Option<&SimContext>,
) -> Result<Vec<f64>, SNNError> {
    let generator = registry.get(name).ok_or_else(|| {
        let e = SNNError::UnknownGenerator {
            name: name.to_string(),
            node_id: node.node_id(),
        };
        error!("{}", e);
        e
    })?;
    generator(node, sim)
}

/// Validate and sort the spikes, then hand them to the engine.
fn playback<E: PlaybackEngine>(
    spikes: Vec<f64>,
    engine: &mut E,
) -> Result<(Vec<f64>, E::Handle), SNNError> {
    let train = sort_spikes(spikes)?;
    let hobj = engine.vecstim(&train)?;
    Ok((train, hobj))
}

/// Returns the spikes sorted in ascending order, as expected by a playback object.
/// The function returns an error if some spike time is negative, NaN or infinite.
pub fn sort_spikes(spikes: Vec<f64>) -> Result<Vec<f64>, SNNError> {
    if spikes.iter().any(|t| *t < 0.0) {
        let e = SNNError::NegativeSpikeTime { spikes };
        error!("{}", e);
        return Err(e);
    }

    if let Some(t) = spikes.iter().find(|t| !t.is_finite()) {
        let e = SNNError::InvalidSpikeTime(format!("spike times must be finite, got {}", t));
        error!("{}", e);
        return Err(e);
    }

    Ok(spikes.into_iter().sorted_by(f64::total_cmp).collect())
}
