// src/output/csv.rs
//! CSV output handler

use crate::output::{poisoned, OutputHandler, Record};
use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Mutex;

struct CsvState {
    writer: csv::Writer<Box<dyn Write + Send>>,
    /// Kind of the last header written; a new kind starts a new header
    header: Option<&'static str>,
}

pub struct CsvOutput {
    state: Mutex<CsvState>,
}

impl CsvOutput {
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            state: Mutex::new(CsvState {
                writer: csv::Writer::from_writer(writer),
                header: None,
            }),
        }
    }
}

impl Default for CsvOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandler for CsvOutput {
    async fn emit(&self, record: Record<'_>) -> anyhow::Result<()> {
        let mut state = self.state.lock().map_err(poisoned)?;

        if state.header != Some(record.kind()) {
            state.writer.write_record(record.columns())?;
            state.header = Some(record.kind());
        }
        state.writer.write_record(record.values())?;
        state.writer.flush()?;
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::SharedBuffer;
    use crate::types::NewEntry;

    #[tokio::test]
    async fn test_header_once_and_quoting() {
        let buffer = SharedBuffer::default();
        let handler = CsvOutput::with_writer(Box::new(buffer.clone()));

        handler
            .emit(Record::Planned(&NewEntry::new("Crypto, Chill", "crypto")))
            .await
            .unwrap();
        handler
            .emit(Record::Planned(&NewEntry::new("say \"hi\"", "misc")))
            .await
            .unwrap();

        assert_eq!(
            buffer.contents(),
            "title,category\n\"Crypto, Chill\",crypto\n\"say \"\"hi\"\"\",misc\n"
        );
    }
}
