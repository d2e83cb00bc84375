//! Inspection and decoding tools for the sdem demo decoder.
//!
//! This crate provides utilities for looking inside recordings:
//!
//! - Summarize a demo: header, frame counts, string tables, diagnostics
//! - Decode a demo into its full object graph for JSON or text output
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to understand what the decoder saw.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use anyhow::{Context, Result};
use codec::{decode_demo, DecodeLimits, DecodedDemo, FrameBody};
use serde::Serialize;
use wire::{DemoHeader, Limits, ProtocolSettings};

/// Summary of one recording.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub header: DemoHeader,
    pub settings: ProtocolSettings,
    /// Frame count per frame kind, by kind name.
    pub frames: BTreeMap<String, usize>,
    /// Packet and sign-on message count.
    pub messages: usize,
    /// Message streams that ended in a decode error.
    pub broken_streams: usize,
    pub tables: Vec<TableSummary>,
    pub diagnostics: Vec<String>,
    pub fatal: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub entries: usize,
    pub max_entries: u16,
    pub readable: bool,
}

/// Decodes a recording with the given limits.
pub fn decode_demo_bytes(bytes: &[u8], wire_limits: &Limits, limits: &DecodeLimits) -> Result<DecodedDemo> {
    decode_demo(bytes, wire_limits, limits).context("decode demo header")
}

/// Decodes a recording and summarizes it.
pub fn inspect_demo(bytes: &[u8], wire_limits: &Limits, limits: &DecodeLimits) -> Result<InspectReport> {
    let demo = decode_demo_bytes(bytes, wire_limits, limits)?;
    tracing::debug!(frames = demo.frames.len(), bytes = bytes.len(), "demo decoded for inspection");
    Ok(InspectReport::from_demo(&demo))
}

impl InspectReport {
    #[must_use]
    pub fn from_demo(demo: &DecodedDemo) -> Self {
        let mut frames = BTreeMap::new();
        let mut messages = 0;
        let mut broken_streams = 0;
        for frame in &demo.frames {
            *frames.entry(frame.kind.to_string()).or_insert(0) += 1;
            if let FrameBody::Packet { messages: stream, .. } = &frame.body {
                messages += stream.records.len();
                if stream.ended_in_error {
                    broken_streams += 1;
                }
            }
        }
        let tables = demo
            .tables
            .tables()
            .map(|table| TableSummary {
                name: table.name().to_string(),
                entries: table.entries.len(),
                max_entries: table.schema.max_entries,
                readable: demo.tables.is_readable(table.name()),
            })
            .collect();
        Self {
            header: demo.header.clone(),
            settings: demo.settings,
            frames,
            messages,
            broken_streams,
            tables,
            diagnostics: demo.diagnostics.iter().map(str::to_string).collect(),
            fatal: demo.fatal.as_ref().map(ToString::to_string),
        }
    }
}

/// Renders a decoded recording one line per frame and message.
#[must_use]
pub fn format_decode_pretty(demo: &DecodedDemo) -> String {
    let mut out = String::new();
    let header = &demo.header;
    let _ = writeln!(
        out,
        "{} on {} ({:?}, demo protocol {}, network protocol {})",
        header.client_name, header.map_name, demo.settings.game, header.demo_protocol, header.network_protocol
    );
    for frame in &demo.frames {
        let _ = writeln!(out, "{frame}");
        if let FrameBody::Packet { messages, .. } = &frame.body {
            for record in &messages.records {
                match &record.payload {
                    Some(payload) => {
                        let _ = writeln!(out, "  {}: {payload}", record.kind);
                    }
                    None => {
                        let _ = writeln!(out, "  {}: <unreadable>", record.kind);
                    }
                }
            }
        }
    }
    for table in demo.tables.tables() {
        let _ = writeln!(out, "table {} ({} entries)", table.name(), table.entries.len());
    }
    for diagnostic in demo.diagnostics.iter() {
        let _ = writeln!(out, "diagnostic: {diagnostic}");
    }
    if let Some(fatal) = &demo.fatal {
        let _ = writeln!(out, "fatal: {fatal}");
    }
    out
}
