//! Module implementing the registry of named spike generators.
//!
//! A spike generator computes the firing times of a virtual node on the fly, from the node properties and the
//! simulation parameters. Generators are registered under a name, which is how input configurations refer to them.

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::SNNError;
use super::node::Node;

/// The node property read by the built-in generators, in Hz.
pub const FIRING_RATE_KEY: &str = "firing_rate";
/// The firing rate used by the built-in generators when the node does not specify one, in Hz.
pub const DEFAULT_FIRING_RATE: f64 = 10.0;

/// A function computing the firing times of a node.
pub type SpikeGenerator = dyn Fn(&Node, Option<&SimContext>) -> Result<Vec<f64>, SNNError>;

/// The simulation parameters visible to spike generators. Times are in ms.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimContext {
    /// Start of the simulation.
    pub tstart: f64,
    /// End of the simulation.
    pub tstop: f64,
    /// Integration time step.
    pub dt: f64,
    /// Seed for the random generators.
    pub seed: u64,
}

impl Default for SimContext {
    fn default() -> Self {
        SimContext {
            tstart: 0.0,
            tstop: 1000.0,
            dt: 0.025,
            seed: 0,
        }
    }
}

impl SimContext {
    /// Check the simulation parameters: finite bounds with `tstart <= tstop` and a positive time step.
    pub fn validate(&self) -> Result<(), SNNError> {
        if !self.tstart.is_finite() || !self.tstop.is_finite() || self.tstop < self.tstart {
            return Err(SNNError::InvalidParameter(format!(
                "Simulation interval must be finite and ordered, got [{}, {})",
                self.tstart, self.tstop
            )));
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SNNError::InvalidParameter(format!(
                "Simulation time step must be positive, got {}",
                self.dt
            )));
        }
        Ok(())
    }
}

/// Registry of spike generators, indexed by name.
#[derive(Default)]
pub struct GeneratorRegistry {
    generators: HashMap<String, Box<SpikeGenerator>>,
}

impl GeneratorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        GeneratorRegistry {
            generators: HashMap::new(),
        }
    }

    /// Create a registry with the built-in generators: `poisson`, `regular` and `silent`.
    pub fn with_builtins() -> Self {
        let mut registry = GeneratorRegistry::new();
        registry.register("poisson", poisson_generator);
        registry.register("regular", regular_generator);
        registry.register("silent", |_: &Node, _: Option<&SimContext>| Ok(vec![]));
        registry
    }

    /// Register a generator under the given name, replacing any generator with the same name.
    pub fn register<F>(&mut self, name: &str, generator: F)
    where
        F: Fn(&Node, Option<&SimContext>) -> Result<Vec<f64>, SNNError> + 'static,
    {
        if self
            .generators
            .insert(name.to_string(), Box::new(generator))
            .is_some()
        {
            warn!("Spikes generator \"{}\" was already registered and has been replaced", name);
        } else {
            debug!("Spikes generator \"{}\" registered", name);
        }
    }

    /// Returns true if a generator is registered under the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.generators.contains_key(name)
    }

    /// Returns the generator registered under the given name, if any.
    pub fn get(&self, name: &str) -> Option<&SpikeGenerator> {
        self.generators.get(name).map(|g| g.as_ref())
    }

    /// Returns the names of the registered generators, in lexicographic order.
    pub fn names(&self) -> Vec<&str> {
        let mut names = self.generators.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("generators", &self.names())
            .finish()
    }
}

/// Returns the firing rate (in Hz) of the node, or the default one if the node has none.
/// The rate must be non-negative and its inter-spike interval no shorter than the simulation time step.
fn firing_rate(node: &Node, sim: &SimContext) -> Result<f64, SNNError> {
    let rate = match node.get(FIRING_RATE_KEY) {
        None => DEFAULT_FIRING_RATE,
        Some(value) => value.as_f64().ok_or_else(|| {
            SNNError::InvalidParameter(format!(
                "Firing rate of node {} must be a number, got {}",
                node.node_id(),
                value
            ))
        })?,
    };
    if !rate.is_finite() || rate < 0.0 {
        return Err(SNNError::InvalidParameter(format!(
            "Firing rate of node {} must be non-negative, got {}",
            node.node_id(),
            rate
        )));
    }
    if rate > 0.0 && 1000.0 / rate < sim.dt {
        return Err(SNNError::InvalidParameter(format!(
            "Firing rate of node {} is too high for the time step: {} Hz with dt = {} ms",
            node.node_id(),
            rate,
            sim.dt
        )));
    }
    Ok(rate)
}

/// Samples a homogeneous Poisson spike train with the given rate (in Hz) on the interval [start, end) (in ms).
/// The returned times are sorted.
pub fn poisson_train<R: Rng>(
    rate: f64,
    start: f64,
    end: f64,
    rng: &mut R,
) -> Result<Vec<f64>, SNNError> {
    if !start.is_finite() || !end.is_finite() {
        return Err(SNNError::InvalidParameter(format!(
            "Spike train interval must be finite, got [{}, {})",
            start, end
        )));
    }
    if rate <= 0.0 || end <= start {
        return Ok(vec![]);
    }
    if end + 1000.0 / rate <= end {
        return Err(SNNError::InvalidParameter(format!(
            "Firing rate {} Hz is too high to advance time up to {} ms",
            rate, end
        )));
    }

    // inter-spike intervals in ms
    let isi = Exp::new(rate / 1000.0).map_err(|e| SNNError::InvalidParameter(e.to_string()))?;

    let mut times = vec![];
    let mut t = start + isi.sample(rng);
    while t < end {
        times.push(t);
        t += isi.sample(rng);
    }
    Ok(times)
}

/// Generates a Poisson spike train over the simulation interval, seeded by the simulation seed and the node ID.
fn poisson_generator(node: &Node, sim: Option<&SimContext>) -> Result<Vec<f64>, SNNError> {
    let default = SimContext::default();
    let sim = sim.unwrap_or(&default);
    sim.validate()?;
    let rate = firing_rate(node, sim)?;

    let seed = sim
        .seed
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(node.node_id() as u64);
    let mut rng = StdRng::seed_from_u64(seed);
    poisson_train(rate, sim.tstart, sim.tstop, &mut rng)
}

/// Generates evenly spaced spikes over the simulation interval, the first one at its start.
fn regular_generator(node: &Node, sim: Option<&SimContext>) -> Result<Vec<f64>, SNNError> {
    let default = SimContext::default();
    let sim = sim.unwrap_or(&default);
    sim.validate()?;
    let rate = firing_rate(node, sim)?;
    if rate == 0.0 {
        return Ok(vec![]);
    }

    let isi = 1000.0 / rate;
    Ok((0_usize..)
        .map(|n| sim.tstart + n as f64 * isi)
        .take_while(|t| *t < sim.tstop)
        .collect())
}
