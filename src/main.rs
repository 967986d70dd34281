use clap::Parser;
use log::{error, info};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use rusty_vstim::config::{build_virtual_cells, InputConfig};
use rusty_vstim::error::SNNError;
use rusty_vstim::generator::{GeneratorRegistry, SimContext};
use rusty_vstim::vecstim::VecStimEngine;
use rusty_vstim::virtual_cell::VirtualCell;

#[derive(Parser, Debug)]
#[command(about = "Build the virtual cells of a population and dump the spike trains they replay")]
struct Args {
    /// The input configuration (JSON), overriding all other input flags
    #[arg(long)]
    config: Option<PathBuf>,
    /// The spike-train dataset (JSON or space-separated spike report)
    #[arg(long)]
    spikes: Option<PathBuf>,
    /// The virtual population
    #[arg(long, default_value = "virtual")]
    population: String,
    /// The spike generator, used when no dataset is given
    #[arg(long)]
    generator: Option<String>,
    /// The node IDs, comma separated (default: all nodes of the dataset)
    #[arg(long, value_delimiter = ',')]
    node_ids: Option<Vec<usize>>,
    /// The simulation end time in ms
    #[arg(long, default_value = "1000.0")]
    tstop: f64,
    /// The seed used by the spike generators
    #[arg(long, default_value = "0")]
    seed: u64,
    /// The output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    fn input_config(&self) -> Result<InputConfig, SNNError> {
        if let Some(path) = &self.config {
            return InputConfig::load(path);
        }
        Ok(InputConfig {
            population: self.population.clone(),
            input_file: self.spikes.clone(),
            generator: self.generator.clone(),
            node_ids: self.node_ids.clone(),
            sim: Some(SimContext {
                tstop: self.tstop,
                seed: self.seed,
                ..SimContext::default()
            }),
        })
    }
}

#[derive(Serialize)]
struct PlaybackRecord<'a> {
    population: &'a str,
    node_id: usize,
    timestamps: &'a [f64],
}

/// Write the replayed trains of the cells as a JSON list of `{population, node_id, timestamps}` records.
fn write_records<H, W: Write>(cells: &[VirtualCell<H>], writer: &mut W) -> Result<(), SNNError> {
    let records = cells
        .iter()
        .map(|cell| PlaybackRecord {
            population: cell.population(),
            node_id: cell.node_id(),
            timestamps: cell.train(),
        })
        .collect::<Vec<_>>();

    serde_json::to_writer_pretty(&mut *writer, &records)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn run(args: &Args) -> Result<(), SNNError> {
    let config = args.input_config()?;
    let registry = GeneratorRegistry::with_builtins();
    let mut engine = VecStimEngine::new();

    let cells = build_virtual_cells(&config, &registry, &mut engine)?;
    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout())),
    };
    write_records(&cells, &mut writer)?;

    info!(
        "{} spike trains written ({} playback objects)",
        cells.len(),
        engine.num_created()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args = Args::parse();
    info!("{:?}", args);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusty_vstim::node::Node;
    use rusty_vstim::spike_train::SpikeInput;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_args_input_config_from_flags() {
        let args = Args::parse_from([
            "rusty_vstim",
            "--population",
            "bg",
            "--generator",
            "poisson",
            "--node-ids",
            "0,2,5",
            "--tstop",
            "250.0",
            "--seed",
            "7",
        ]);
        assert_eq!(
            args.input_config(),
            Ok(InputConfig {
                population: "bg".to_string(),
                input_file: None,
                generator: Some("poisson".to_string()),
                node_ids: Some(vec![0, 2, 5]),
                sim: Some(SimContext {
                    tstop: 250.0,
                    seed: 7,
                    ..SimContext::default()
                }),
            })
        );
    }

    #[test]
    fn test_args_input_config_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inputs.json");
        std::fs::write(&path, r#"{"population": "lgn", "generator": "silent", "node_ids": [1]}"#)
            .unwrap();

        // the configuration file overrides the other flags
        let args = Args::parse_from([
            "rusty_vstim",
            "--config",
            path.to_str().unwrap(),
            "--population",
            "bg",
        ]);
        let config = args.input_config().unwrap();
        assert_eq!(config.population, "lgn");
        assert_eq!(config.node_ids, Some(vec![1]));
        assert_eq!(config.sim, None);
    }

    #[test]
    fn test_write_records() {
        let registry = GeneratorRegistry::new();
        let mut engine = VecStimEngine::new();
        let times = [5.0, 1.5];
        let cells = vec![
            VirtualCell::build(
                Node::new(3, "lgn"),
                Some(SpikeInput::Times(&times)),
                None,
                &registry,
                None,
                &mut engine,
            )
            .unwrap(),
            VirtualCell::build(
                Node::new(4, "lgn"),
                Some(SpikeInput::Empty),
                None,
                &registry,
                None,
                &mut engine,
            )
            .unwrap(),
        ];

        let mut buffer = Vec::new();
        write_records(&cells, &mut buffer).unwrap();
        let output: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(
            output,
            json!([
                {"population": "lgn", "node_id": 3, "timestamps": [1.5, 5.0]},
                {"population": "lgn", "node_id": 4, "timestamps": []}
            ])
        );
        assert!(buffer.ends_with(b"\n"));
    }
}
