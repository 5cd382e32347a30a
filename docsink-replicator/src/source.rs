use docsink::error::{DocSinkError, DocSinkResult};
use docsink::types::ChangeEnvelope;
use docsink_config::shared::SourceConfig;
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tracing::info;

use crate::error::{ReplicatorError, ReplicatorResult};

/// Stream of envelopes consumed by the pipeline.
pub type EnvelopeStream = BoxStream<'static, DocSinkResult<ChangeEnvelope>>;

/// Opens the configured source of CDC envelopes.
pub async fn open_source(config: &SourceConfig) -> ReplicatorResult<EnvelopeStream> {
    match config {
        SourceConfig::JsonLines { path: Some(path) } => {
            info!(path = %path.display(), "reading change envelopes from file");
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|source| ReplicatorError::Source {
                    path: path.clone(),
                    source,
                })?;

            Ok(json_lines_stream(BufReader::new(file)))
        }
        SourceConfig::JsonLines { path: None } => {
            info!("reading change envelopes from stdin");

            Ok(json_lines_stream(BufReader::new(tokio::io::stdin())))
        }
    }
}

/// Decodes one `{"key": …, "value": …}` envelope per line, ignoring blank lines.
///
/// A line that is not valid JSON yields an error for that line only. Read failures end up in
/// the stream as I/O errors.
pub fn json_lines_stream<R>(reader: R) -> EnvelopeStream
where
    R: AsyncBufRead + Send + Unpin + 'static,
{
    LinesStream::new(reader.lines())
        .filter_map(|line| async move {
            let envelope: DocSinkResult<ChangeEnvelope> = match line {
                Ok(line) if line.trim().is_empty() => return None,
                Ok(line) => serde_json::from_str(&line).map_err(DocSinkError::from),
                Err(err) => Err(DocSinkError::from(err)),
            };

            Some(envelope)
        })
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsink::error::ErrorKind;

    #[tokio::test]
    async fn decodes_lines_and_reports_bad_ones() {
        let input = concat!(
            r#"{"key": {"id": 1}, "value": {"op": "c"}}"#,
            "\n\n",
            "not json\n",
            r#"{"key": null, "value": null}"#,
            "\n",
        );

        let items: Vec<_> = json_lines_stream(BufReader::new(input.as_bytes()))
            .collect()
            .await;

        assert_eq!(items.len(), 3);
        assert_eq!(
            items[0].as_ref().unwrap().key,
            Some(serde_json::json!({"id": 1}))
        );
        assert_eq!(
            items[1].as_ref().unwrap_err().kind(),
            ErrorKind::DeserializationError
        );
        assert!(items[2].as_ref().unwrap().is_tombstone());
    }
}
