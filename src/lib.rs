//! This crate provides tools for replaying spike trains through virtual cells, i.e., the external nodes feeding a
//! spiking neural network simulation with precomputed activity.
//!
//! # Replaying a Dataset
//!
//! ```rust
//! use rusty_vstim::node::Node;
//! use rusty_vstim::generator::GeneratorRegistry;
//! use rusty_vstim::spike_train::{SpikeInput, SpikeTrains};
//! use rusty_vstim::vecstim::VecStimEngine;
//! use rusty_vstim::virtual_cell::VirtualCell;
//!
//! // Init a dataset with the (unsorted) firing times of a node
//! let mut spike_trains = SpikeTrains::new();
//! spike_trains.add_spikes(0, "lgn", &[12.5, 3.0, 7.25]);
//!
//! // Create the virtual cell replaying them
//! let registry = GeneratorRegistry::new();
//! let mut engine = VecStimEngine::new();
//! let cell = VirtualCell::build(
//!     Node::new(0, "lgn"),
//!     Some(SpikeInput::Dataset(&spike_trains)),
//!     None,
//!     &registry,
//!     None,
//!     &mut engine,
//! )
//! .unwrap();
//!
//! assert_eq!(cell.train(), &[3.0, 7.25, 12.5]);
//! assert_eq!(cell.hobj().next_event(5.0), Some(7.25));
//! ```
//!
//! # Replaying a Generator
//!
//! ```rust
//! use rusty_vstim::node::Node;
//! use rusty_vstim::generator::{GeneratorRegistry, SimContext};
//! use rusty_vstim::vecstim::VecStimEngine;
//! use rusty_vstim::virtual_cell::VirtualCell;
//!
//! let registry = GeneratorRegistry::with_builtins();
//! let sim = SimContext { tstop: 500.0, seed: 42, ..SimContext::default() };
//! let mut engine = VecStimEngine::new();
//!
//! // A 20 Hz Poisson train over [0, 500) ms
//! let node = Node::new(3, "bg").with_property("firing_rate", 20.0);
//! let cell = VirtualCell::build(node, None, Some("poisson"), &registry, Some(&sim), &mut engine).unwrap();
//!
//! assert!(cell.train().windows(2).all(|ts| ts[0] <= ts[1]));
//! assert!(cell.train().iter().all(|t| (0.0..500.0).contains(t)));
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod node;
pub mod spike_train;
pub mod vecstim;
pub mod virtual_cell;
