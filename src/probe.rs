use std::fs;
use std::sync::mpsc::Sender;
use std::thread;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::board::BoardEvent;
use crate::http_client::fetch_text;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSummary {
    pub source: String,
    pub bytes: usize,
    /// The envelope's `count` field, when the payload has one.
    pub count: Option<u64>,
}

/// Reads the supplementary JSON once. `http(s)://` sources go over the network,
/// anything else is treated as a local path.
pub fn probe_data(source: &str) -> Result<ProbeSummary> {
    let body = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_text(source).with_context(|| format!("fetch {source}"))?
    } else {
        fs::read_to_string(source).with_context(|| format!("read {source}"))?
    };
    let value: Value = serde_json::from_str(body.trim()).context("invalid data json")?;
    let count = value
        .get("count")
        .and_then(|c| c.as_u64())
        .or_else(|| value.as_array().map(|arr| arr.len() as u64));
    Ok(ProbeSummary {
        source: source.to_string(),
        bytes: body.len(),
        count,
    })
}

/// Fire-and-forget: the result comes back once as `BoardEvent::Probe`.
pub fn spawn_data_probe(source: String, tx: Sender<BoardEvent>) {
    thread::spawn(move || {
        let result = probe_data(&source).map_err(|err| format!("{err:#}"));
        let _ = tx.send(BoardEvent::Probe(result));
    });
}
