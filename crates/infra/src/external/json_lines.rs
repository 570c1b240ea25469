use std::io::Write;
use std::sync::Mutex;

use thiserror::Error;

use fulfillsync_fulfillment::{DispositionRecord, StatusSink};

#[derive(Debug, Error)]
pub enum JsonLinesError {
    #[error("failed to encode disposition: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write disposition: {0}")]
    Io(#[from] std::io::Error),

    #[error("writer lock poisoned")]
    Poisoned,
}

/// Status sink writing one JSON object per disposition, newline-delimited.
#[derive(Debug)]
pub struct JsonLinesStatusSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesStatusSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> Result<W, JsonLinesError> {
        self.writer.into_inner().map_err(|_| JsonLinesError::Poisoned)
    }
}

impl<W: Write + Send> StatusSink for JsonLinesStatusSink<W> {
    type Error = JsonLinesError;

    fn propagate(&self, record: &DispositionRecord) -> Result<(), Self::Error> {
        let line = serde_json::to_string(record)?;
        let mut writer = self.writer.lock().map_err(|_| JsonLinesError::Poisoned)?;
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}
