// src/output/json.rs
//! JSON Lines (JSONL) output handler

use crate::output::{poisoned, OutputHandler, Record};
use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Mutex;

/// One JSON object per line, tagged with its record kind
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandler for JsonOutput {
    async fn emit(&self, record: Record<'_>) -> anyhow::Result<()> {
        let mut value = record.to_json()?;
        if let Some(object) = value.as_object_mut() {
            object.insert("kind".to_string(), record.kind().into());
        }

        let mut writer = self.writer.lock().map_err(poisoned)?;
        writeln!(writer, "{}", serde_json::to_string(&value)?)?;
        writer.flush()?;
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let mut writer = self.writer.lock().map_err(poisoned)?;
        writer.flush()?;
        Ok(())
    }
}
