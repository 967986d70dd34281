//! Module implementing spike-train datasets, i.e., the recorded or precomputed activity of external nodes.
//!
//! A dataset maps every `(population, node_id)` pair to a sequence of firing times (in ms).
//! Datasets can be loaded from (and saved to) JSON files or space-separated spike reports.

use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use super::error::SNNError;

/// Column names of a spike report.
const CSV_TIMESTAMPS: &str = "timestamps";
const CSV_POPULATION: &str = "population";
const CSV_NODE_IDS: &str = "node_ids";

/// Anything able to provide the firing times of a node.
pub trait SpikeTrainSource {
    /// Returns the firing times of the node with the given ID.
    /// If no population is given, the source may fall back on a default one.
    /// Unknown nodes have no spikes.
    fn get_times(&self, node_id: usize, population: Option<&str>) -> Vec<f64>;
}

/// The spike-train argument accepted by a virtual cell.
#[derive(Clone, Copy)]
pub enum SpikeInput<'a> {
    /// A dataset in which the times of the cell's node are looked up.
    Dataset(&'a dyn SpikeTrainSource),
    /// A plain sequence of firing times.
    Times(&'a [f64]),
    /// No spikes at all.
    Empty,
}

impl<'a> SpikeInput<'a> {
    /// Returns the firing times for the given node, in the order provided by the source.
    pub fn resolve(&self, node_id: usize, population: &str) -> Vec<f64> {
        match self {
            SpikeInput::Dataset(source) => source.get_times(node_id, Some(population)),
            SpikeInput::Times(times) => times.to_vec(),
            SpikeInput::Empty => vec![],
        }
    }
}

impl<'a> std::fmt::Debug for SpikeInput<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SpikeInput::Dataset(_) => write!(f, "Dataset(..)"),
            SpikeInput::Times(times) => f.debug_tuple("Times").field(times).finish(),
            SpikeInput::Empty => write!(f, "Empty"),
        }
    }
}

/// A record of the JSON file format, i.e., all the firing times of a node.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
struct SpikeRecord {
    node_id: usize,
    population: String,
    timestamps: Vec<f64>,
}

/// In-memory spike-train dataset.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct SpikeTrains {
    /// Firing times, per population and per node.
    trains: BTreeMap<String, BTreeMap<usize, Vec<f64>>>,
}

impl SpikeTrains {
    /// Create a new empty dataset.
    pub fn new() -> Self {
        SpikeTrains {
            trains: BTreeMap::new(),
        }
    }

    /// Add a spike to the dataset.
    pub fn add_spike(&mut self, node_id: usize, population: &str, time: f64) {
        self.trains
            .entry(population.to_string())
            .or_default()
            .entry(node_id)
            .or_default()
            .push(time);
    }

    /// Add several spikes of the same node to the dataset.
    pub fn add_spikes(&mut self, node_id: usize, population: &str, times: &[f64]) {
        self.trains
            .entry(population.to_string())
            .or_default()
            .entry(node_id)
            .or_default()
            .extend_from_slice(times);
    }

    /// Returns the names of the populations in the dataset, in lexicographic order.
    pub fn populations(&self) -> Vec<&str> {
        self.trains.keys().map(String::as_str).collect()
    }

    /// Returns the IDs of the nodes of a population having (at least one entry in) a spike train, in increasing order.
    pub fn node_ids(&self, population: &str) -> Vec<usize> {
        self.trains
            .get(population)
            .map(|nodes| nodes.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the total number of spikes in the dataset.
    pub fn num_spikes(&self) -> usize {
        self.trains
            .values()
            .flat_map(|nodes| nodes.values())
            .map(Vec::len)
            .sum()
    }

    /// Load a dataset, the format being deduced from the file extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SNNError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::load_json(path),
            Some("csv") | Some("txt") => Self::load_csv(path),
            _ => Err(SNNError::InvalidParameter(format!(
                "Unsupported spike-train file format: {}",
                path.display()
            ))),
        }
    }

    /// Load a dataset from a JSON file with a list of `{node_id, population, timestamps}` records.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, SNNError> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let records: Vec<SpikeRecord> = serde_json::from_reader(reader)?;

        let mut spike_trains = SpikeTrains::new();
        for record in records {
            spike_trains.add_spikes(record.node_id, &record.population, &record.timestamps);
        }
        info!(
            "Loaded {} spikes from {}",
            spike_trains.num_spikes(),
            path.as_ref().display()
        );
        Ok(spike_trains)
    }

    /// Save the dataset to a JSON file, one record per node.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), SNNError> {
        let records = self
            .trains
            .iter()
            .flat_map(|(population, nodes)| {
                nodes.iter().map(move |(node_id, times)| SpikeRecord {
                    node_id: *node_id,
                    population: population.clone(),
                    timestamps: times.clone(),
                })
            })
            .collect::<Vec<_>>();

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &records)?;
        writer.flush()?;
        Ok(())
    }

    /// Load a dataset from a space-separated spike report with header `timestamps population node_ids`.
    /// The columns may come in any order and the rows are not required to be sorted.
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self, SNNError> {
        let file = File::open(path.as_ref())?;
        let mut lines = BufReader::new(file).lines().enumerate();

        let header = match lines.next() {
            Some((_, line)) => line?,
            None => return Err(SNNError::ParseError("Empty spike report".to_string())),
        };
        let columns = header.split_whitespace().collect::<Vec<_>>();
        let position = |name: &str| {
            columns.iter().position(|c| *c == name).ok_or_else(|| {
                SNNError::ParseError(format!("Missing column \"{}\" in spike report header", name))
            })
        };
        let (col_time, col_pop, col_id) = (
            position(CSV_TIMESTAMPS)?,
            position(CSV_POPULATION)?,
            position(CSV_NODE_IDS)?,
        );

        let mut spike_trains = SpikeTrains::new();
        for (n, line) in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fields = line.split_whitespace().collect::<Vec<_>>();
            if fields.len() != columns.len() {
                return Err(SNNError::ParseError(format!(
                    "Line {}: expected {} fields, found {}",
                    n + 1,
                    columns.len(),
                    fields.len()
                )));
            }
            let time = fields[col_time].parse::<f64>().map_err(|e| {
                SNNError::ParseError(format!("Line {}: invalid timestamp: {}", n + 1, e))
            })?;
            let node_id = fields[col_id].parse::<usize>().map_err(|e| {
                SNNError::ParseError(format!("Line {}: invalid node id: {}", n + 1, e))
            })?;
            spike_trains.add_spike(node_id, fields[col_pop], time);
        }
        info!(
            "Loaded {} spikes from {}",
            spike_trains.num_spikes(),
            path.as_ref().display()
        );
        Ok(spike_trains)
    }

    /// Save the dataset as a space-separated spike report, sorted by time.
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), SNNError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{} {} {}", CSV_TIMESTAMPS, CSV_POPULATION, CSV_NODE_IDS)?;

        let rows = self
            .trains
            .iter()
            .flat_map(|(population, nodes)| {
                nodes.iter().flat_map(move |(node_id, times)| {
                    times.iter().map(move |t| (*t, population.as_str(), *node_id))
                })
            })
            .sorted_by(|a, b| a.0.total_cmp(&b.0));
        for (time, population, node_id) in rows {
            writeln!(writer, "{} {} {}", time, population, node_id)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl SpikeTrainSource for SpikeTrains {
    fn get_times(&self, node_id: usize, population: Option<&str>) -> Vec<f64> {
        let nodes = match population {
            Some(population) => self.trains.get(population),
            None if self.trains.len() == 1 => self.trains.values().next(),
            None => {
                warn!(
                    "No population given for node {} and the dataset has {} populations",
                    node_id,
                    self.trains.len()
                );
                None
            }
        };

        match nodes.and_then(|nodes| nodes.get(&node_id)) {
            Some(times) => times.iter().copied().sorted_by(f64::total_cmp).collect(),
            None => {
                debug!("No spikes found for node {} ({:?})", node_id, population);
                vec![]
            }
        }
    }
}
