//! JSON-lines sink for game events.
//!
//! Each record is one line: `{"at_ms":<u64>,"event":{"type":...}}`.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::game::GameEvent;

#[derive(Serialize)]
struct Record<'a> {
    at_ms: u64,
    event: &'a GameEvent,
}

pub struct EventLog {
    out: BufWriter<File>,
    buf: Vec<u8>,
}

impl EventLog {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening event log {}", path.display()))?;

        Ok(Self {
            out: BufWriter::new(file),
            buf: Vec::with_capacity(256),
        })
    }

    pub fn record(&mut self, at_ms: u64, events: &[GameEvent]) -> Result<()> {
        for event in events {
            self.buf.clear();
            serde_json::to_writer(&mut self.buf, &Record { at_ms, event })?;
            self.buf.push(b'\n');
            self.out.write_all(&self.buf)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().context("flushing event log")
    }
}
