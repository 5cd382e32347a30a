use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter, Stdout};
use tokio::sync::Mutex;
use tracing::debug;

use crate::destination::Destination;
use crate::docsink_error;
use crate::error::{DocSinkResult, ErrorKind};
use crate::types::WriteInstruction;

/// Destination writing each instruction as one JSON object per line.
///
/// Meant to be piped into a loader for the document store. The writer is flushed after every
/// batch, so a batch is either fully visible downstream or the write fails.
#[derive(Debug)]
pub struct JsonLinesDestination<W> {
    writer: Arc<Mutex<W>>,
}

impl<W> Clone for JsonLinesDestination<W> {
    fn clone(&self) -> Self {
        Self {
            writer: self.writer.clone(),
        }
    }
}

impl<W> JsonLinesDestination<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Creates a destination writing into `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }
}

impl JsonLinesDestination<Stdout> {
    /// Creates a destination writing to the standard output.
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl JsonLinesDestination<BufWriter<File>> {
    /// Creates a destination appending to the file at `path`, creating it if needed.
    pub async fn open(path: impl AsRef<Path>) -> DocSinkResult<Self> {
        let path = path.as_ref();
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|err| {
                docsink_error!(
                    ErrorKind::DestinationError,
                    "Failed to open the output file",
                    path.display().to_string(),
                    source: err
                )
            })?;

        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W> Destination for JsonLinesDestination<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn name() -> &'static str {
        "json_lines"
    }

    async fn shutdown(&self) -> DocSinkResult<()> {
        let mut writer = self.writer.lock().await;
        writer.flush().await.map_err(|err| {
            docsink_error!(
                ErrorKind::DestinationError,
                "Failed to flush the output",
                source: err
            )
        })
    }

    async fn write_instructions(&self, instructions: Vec<WriteInstruction>) -> DocSinkResult<()> {
        if instructions.is_empty() {
            return Ok(());
        }

        let mut buffer = Vec::new();
        for instruction in &instructions {
            serde_json::to_writer(&mut buffer, instruction).map_err(|err| {
                docsink_error!(
                    ErrorKind::SerializationError,
                    "Failed to serialize a write instruction",
                    format!("target id {}", instruction.target_id()),
                    source: err
                )
            })?;
            buffer.push(b'\n');
        }

        let mut writer = self.writer.lock().await;
        let write_error = |err: std::io::Error| {
            docsink_error!(
                ErrorKind::DestinationError,
                "Failed to write instructions to the output",
                source: err
            )
        };
        writer.write_all(&buffer).await.map_err(write_error)?;
        writer.flush().await.map_err(write_error)?;

        debug!(instructions = instructions.len(), "wrote instructions");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityId, Organization};

    #[tokio::test]
    async fn writes_one_instruction_per_line() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("instructions.jsonl");
        let destination = JsonLinesDestination::open(&path).await.unwrap();

        destination
            .write_instructions(vec![
                WriteInstruction::replace(Organization::new(EntityId(9), "Org")),
                WriteInstruction::delete(EntityId(1_000_005)),
            ])
            .await
            .unwrap();
        destination.shutdown().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(
            lines,
            vec![
                serde_json::json!({
                    "type": "replace",
                    "target_id": 9,
                    "document": {"_id": 9, "name": "Org", "divisions": []},
                    "upsert": true
                }),
                serde_json::json!({"type": "delete", "target_id": 1_000_005}),
            ]
        );
    }
}
