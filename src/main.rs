// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use midisplit::midi::{list_sources, open_input, print_sources, resolve_inputs};
use midisplit::recording::{spawn_session, MidiFileSink};
use midisplit::timing::WallClock;
use midisplit::RecorderConfig;

fn print_usage() {
    println!("midisplit - MIDI recorder that saves each take to its own file");
    println!();
    println!("Usage: midisplit [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --list-sources          List available MIDI sources (inputs)");
    println!("  --record                Record until Enter or Ctrl+C");
    println!("    --config <FILE>       YAML configuration file");
    println!("    --input <X>           Input by index or name fragment (repeatable)");
    println!("    --delay <MS>          Silence before a take is saved (default 5000)");
    println!("    --timeout <MS>        Held note/pedal timeout (default 30000)");
    println!("    --output <FORMAT>     File name template");
    println!("    --resolution <PPQN>   Ticks per quarter note (default 480)");
    println!("  --help                  Show this help message");
    println!();
    println!("Templates: {{now}}, {{now:<strftime>}}, {{events}}, {{notes}}, {{guid}}");
    println!("Environment overrides: MIDISPLIT_MIDI_INPUTS, MIDISPLIT_DELAY_TO_SAVE_MS,");
    println!("  MIDISPLIT_TIMEOUT_TO_SAVE_MS, MIDISPLIT_PATH_FORMAT, MIDISPLIT_MIDI_RESOLUTION");
}

/// Flags accepted after `--record`
#[derive(Debug, Default, PartialEq, Eq)]
struct RecordArgs {
    config: Option<PathBuf>,
    inputs: Vec<String>,
    delay: Option<u64>,
    timeout: Option<u64>,
    output: Option<String>,
    resolution: Option<u16>,
}

impl RecordArgs {
    fn parse(args: &[String]) -> Result<Self> {
        let mut parsed = Self::default();
        let mut iter = args.iter();

        while let Some(flag) = iter.next() {
            let mut value = || {
                iter.next()
                    .cloned()
                    .ok_or_else(|| anyhow!("{} requires a value", flag))
            };
            match flag.as_str() {
                "--config" => parsed.config = Some(PathBuf::from(value()?)),
                "--input" => parsed.inputs.push(value()?),
                "--delay" => parsed.delay = Some(parse_flag(flag, &value()?)?),
                "--timeout" => parsed.timeout = Some(parse_flag(flag, &value()?)?),
                "--output" => parsed.output = Some(value()?),
                "--resolution" => parsed.resolution = Some(parse_flag(flag, &value()?)?),
                _ => return Err(anyhow!("Unknown option: {}", flag)),
            }
        }

        Ok(parsed)
    }

    /// Command line settings win over file and environment
    fn apply(&self, config: &mut RecorderConfig) {
        if !self.inputs.is_empty() {
            config.midi_inputs = self.inputs.clone();
        }
        if let Some(delay) = self.delay {
            config.delay_to_save_ms = delay;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_to_save_ms = timeout;
        }
        if let Some(output) = &self.output {
            config.path_format = output.clone();
        }
        if let Some(resolution) = self.resolution {
            config.midi_resolution = resolution;
        }
    }
}

fn parse_flag<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("Invalid value for {}: {}", flag, value))
}

fn load_config(args: &RecordArgs) -> Result<RecorderConfig> {
    let mut config = match &args.config {
        Some(path) => RecorderConfig::load(path)?,
        None => RecorderConfig::default(),
    };
    config.apply_env()?;
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Resolve on Enter, end of stdin, or Ctrl+C
async fn wait_for_stop() {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = lines.next_line() => {}
    }
}

async fn record(args: RecordArgs) -> Result<()> {
    let config = load_config(&args)?;
    let sources = resolve_inputs(&config.midi_inputs, &list_sources())
        .context("Use --list-sources to see available sources")?;

    let sink = MidiFileSink::new(config.template()?, config.midi_resolution);
    let session = spawn_session(config.split_config(), Arc::new(WallClock::new()), Arc::new(sink))?;

    let mut connections = Vec::with_capacity(sources.len());
    for source in &sources {
        let connection = open_input(source, session.sender())
            .with_context(|| format!("Failed to open MIDI input '{}'", source.name))?;
        connections.push(connection);
    }
    for connection in &connections {
        let source = connection.source();
        info!(port = source.port, index = source.index, name = %source.name, "Listening");
    }

    println!("Recording from {} input(s). Press Enter or Ctrl+C to stop.", connections.len());
    wait_for_stop().await;

    drop(connections);
    let summary = session.stop().await?;

    println!(
        "Recorded {} events in {} take(s): {} saved, {} failed",
        summary.events,
        summary.windows - summary.empty,
        summary.saved,
        summary.failed
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("midisplit - MIDI recorder that saves each take to its own file");
        println!("Run with --help for usage information");
        return Ok(());
    }

    match args[1].as_str() {
        "--list-sources" => {
            print_sources();
        }
        "--record" => {
            let record_args = RecordArgs::parse(&args[2..])?;
            record(record_args).await?;
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
