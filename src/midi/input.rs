// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI input capture.
//!
//! Device callbacks run on the backend's own thread. They decode each packet
//! and push it, tagged with the input port, into the session's capture queue.
//! The session stamps and orders everything from there.

use std::any::Any;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc::UnboundedSender;

use super::message::MidiMessage;

/// A decoded message as it leaves the device callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedMessage {
    /// Input port index
    pub port: u8,
    /// Decoded message
    pub message: MidiMessage,
}

/// Sending half of a session's capture queue
pub type CaptureSender = UnboundedSender<CapturedMessage>;

/// A configured input resolved against the system's sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSource {
    /// Index in the system source list
    pub index: usize,
    /// Source display name
    pub name: String,
    /// Port number stamped on captured events
    pub port: u8,
}

/// An open input; capture stops when dropped
pub struct InputConnection {
    source: InputSource,
    _inner: Box<dyn Any>,
}

impl InputConnection {
    /// The source this connection listens to
    pub fn source(&self) -> &InputSource {
        &self.source
    }
}

/// Resolve configured inputs (index or name fragment) to sources.
///
/// Ports are numbered in the order the inputs were requested.
pub fn resolve_inputs(
    requested: &[String],
    available: &[(usize, String)],
) -> Result<Vec<InputSource>> {
    if requested.is_empty() {
        return Err(anyhow!("No MIDI inputs configured"));
    }

    requested
        .iter()
        .enumerate()
        .map(|(port, wanted)| {
            let port = u8::try_from(port).map_err(|_| anyhow!("Too many MIDI inputs"))?;
            let (index, name) = search_source(wanted, available)
                .ok_or_else(|| anyhow!("MIDI input '{}' not found", wanted))?;
            Ok(InputSource {
                index,
                name: name.to_string(),
                port,
            })
        })
        .collect()
}

fn search_source<'a>(wanted: &str, available: &'a [(usize, String)]) -> Option<(usize, &'a str)> {
    let wanted = wanted.trim();
    if let Ok(index) = wanted.parse::<usize>() {
        if let Some((i, name)) = available.iter().find(|(i, _)| *i == index) {
            return Some((*i, name.as_str()));
        }
    }

    let lowered = wanted.to_lowercase();
    available
        .iter()
        .find(|(_, name)| name.to_lowercase().contains(&lowered))
        .map(|(i, name)| (*i, name.as_str()))
}

/// Print all available MIDI sources to stdout
pub fn print_sources() {
    let sources = list_sources();
    if sources.is_empty() {
        println!("No MIDI sources found.");
    } else {
        println!("Available MIDI sources (inputs):");
        for (i, name) in sources {
            println!("  {}: {}", i, name);
        }
    }
}

fn forward(tx: &CaptureSender, port: u8, data: &[u8]) {
    for message in MidiMessage::parse_all(data) {
        // The session may already be gone during shutdown.
        if tx.send(CapturedMessage { port, message }).is_err() {
            return;
        }
    }
}

#[cfg(target_os = "macos")]
mod backend {
    use super::*;
    use coremidi::{Client, PacketList, Source, Sources};

    pub fn list_sources() -> Vec<(usize, String)> {
        Sources
            .into_iter()
            .enumerate()
            .map(|(i, source)| {
                let name = source.display_name().unwrap_or_else(|| format!("Unknown {}", i));
                (i, name)
            })
            .collect()
    }

    pub fn open(source: &InputSource, tx: CaptureSender) -> Result<Box<dyn Any>> {
        let client = Client::new("midisplit")
            .map_err(|e| anyhow!("Failed to create MIDI client: {:?}", e))?;

        let endpoint = Source::from_index(source.index)
            .ok_or_else(|| anyhow!("MIDI source {} not found", source.index))?;

        let port = source.port;
        let input_port = client
            .input_port("midisplit input", move |packet_list: &PacketList| {
                for packet in packet_list.iter() {
                    forward(&tx, port, packet.data());
                }
            })
            .map_err(|e| anyhow!("Failed to create input port: {:?}", e))?;

        input_port
            .connect_source(&endpoint)
            .map_err(|e| anyhow!("Failed to connect to source: {:?}", e))?;

        Ok(Box::new((client, input_port)))
    }
}

#[cfg(all(not(target_os = "macos"), feature = "midir"))]
mod backend {
    use super::*;

    pub fn list_sources() -> Vec<(usize, String)> {
        let Ok(input) = midir::MidiInput::new("midisplit") else {
            return Vec::new();
        };
        input
            .ports()
            .iter()
            .enumerate()
            .map(|(i, port)| {
                let name = input
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown {}", i));
                (i, name)
            })
            .collect()
    }

    pub fn open(source: &InputSource, tx: CaptureSender) -> Result<Box<dyn Any>> {
        let mut input = midir::MidiInput::new("midisplit")
            .map_err(|e| anyhow!("Failed to create MIDI client: {}", e))?;
        input.ignore(midir::Ignore::None);

        let ports = input.ports();
        let endpoint = ports
            .get(source.index)
            .ok_or_else(|| anyhow!("MIDI source {} not found", source.index))?;

        let port = source.port;
        let connection = input
            .connect(
                endpoint,
                "midisplit input",
                move |_stamp, data, _| forward(&tx, port, data),
                (),
            )
            .map_err(|e| anyhow!("Failed to connect to source: {:?}", e.kind()))?;

        Ok(Box::new(connection))
    }
}

#[cfg(all(not(target_os = "macos"), not(feature = "midir")))]
mod backend {
    use super::*;

    pub fn list_sources() -> Vec<(usize, String)> {
        Vec::new()
    }

    pub fn open(source: &InputSource, _tx: CaptureSender) -> Result<Box<dyn Any>> {
        Err(anyhow!(
            "Cannot open MIDI source {}: no capture backend (rebuild with --features midir)",
            source.index
        ))
    }
}

/// List all available MIDI sources
pub fn list_sources() -> Vec<(usize, String)> {
    backend::list_sources()
}

/// Open a source and forward its messages into `tx`
pub fn open_input(source: &InputSource, tx: CaptureSender) -> Result<InputConnection> {
    let inner = backend::open(source, tx)?;
    Ok(InputConnection {
        source: source.clone(),
        _inner: inner,
    })
}
