use std::io::Write;

use anyhow::{Context, Result};

use crate::singer::messages::Message;

/// Writes one JSON message per line.
pub struct MessageWriter<W: Write> {
    out: W,
}

impl<W: Write> MessageWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write(&mut self, message: &Message) -> Result<()> {
        serde_json::to_writer(&mut self.out, message).context("failed to serialize message")?;
        self.out.write_all(b"\n").context("failed to write message")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().context("failed to flush output")
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
