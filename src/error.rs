//! Error module for the Rusty VStim library.
use thiserror::Error;

/// Error types for the library.
#[derive(Debug, PartialEq, Error)]
pub enum SNNError {
    /// Error for a virtual cell with neither a spike-train dataset nor a generator.
    #[error("Could not find source of spike trains (e.g., file or generator function) for virtual cell #{node_id} from {population}")]
    MissingSpikeSource { node_id: usize, population: String },
    /// Error for a spike train containing at least one negative time.
    #[error("Spike train {spikes:?} contains negative number, unable to play it back")]
    NegativeSpikeTime { spikes: Vec<f64> },
    /// Error for a spike train containing NaN or infinite times.
    #[error("Invalid spike time: {0}")]
    InvalidSpikeTime(String),
    /// Error for a generator name missing from the registry.
    #[error("Could not find spikes generator function \"{name}\". Unable to load spikes for virtual cell {node_id}")]
    UnknownGenerator { name: String, node_id: usize },
    /// Error for a train rejected by the playback primitive, e.g., unsorted times.
    #[error("Invalid playback train: {0}")]
    InvalidTrain(String),
    /// Error for invalid parameters.
    #[error("Invalid parameters: {0}")]
    InvalidParameter(String),
    /// Error while parsing a dataset or configuration file.
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Error for I/O operations.
    #[error("I/O error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for SNNError {
    fn from(e: std::io::Error) -> Self {
        SNNError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for SNNError {
    fn from(e: serde_json::Error) -> Self {
        SNNError::ParseError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = SNNError::MissingSpikeSource {
            node_id: 3,
            population: "lgn".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Could not find source of spike trains (e.g., file or generator function) for virtual cell #3 from lgn"
        );

        let e = SNNError::NegativeSpikeTime {
            spikes: vec![1.0, -2.0],
        };
        assert!(e.to_string().contains("[1.0, -2.0]"));

        let e = SNNError::UnknownGenerator {
            name: "bursty".to_string(),
            node_id: 7,
        };
        assert!(e.to_string().contains("\"bursty\""));
        assert!(e.to_string().ends_with("virtual cell 7"));
    }

    #[test]
    fn test_error_from_io() {
        let e: SNNError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert_eq!(e, SNNError::IOError("missing".to_string()));
    }
}
