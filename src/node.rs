//! Module implementing the description of an external (virtual) node.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Represents a node of an external population, i.e., a node whose activity is replayed rather than simulated.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Node {
    /// The ID of the node within its population.
    node_id: usize,
    /// The name of the population the node belongs to.
    population: String,
    /// Arbitrary node attributes, e.g., the firing rate used by spike generators.
    #[serde(default)]
    properties: Map<String, Value>,
}

impl Node {
    /// Create a new node without properties.
    pub fn new(node_id: usize, population: &str) -> Self {
        Node {
            node_id,
            population: population.to_string(),
            properties: Map::new(),
        }
    }

    /// Returns the node with an additional property.
    pub fn with_property<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Returns the ID of the node.
    pub fn node_id(&self) -> usize {
        self.node_id
    }

    /// Returns the population of the node.
    pub fn population(&self) -> &str {
        &self.population
    }

    /// Returns the property stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Returns the property stored under `key` as a float, if it is a number.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }
}
