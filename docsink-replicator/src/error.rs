use docsink::error::{DocSinkError, ErrorKind};
use docsink_telemetry::tracing::TracingError;
use std::error::Error as _;
use std::fmt::Write as _;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for replicator operations.
pub type ReplicatorResult<T> = Result<T, ReplicatorError>;

/// Failures that stop the replicator process.
#[derive(Debug, Error)]
pub enum ReplicatorError {
    /// Configuration could not be loaded or did not validate.
    #[error("invalid configuration: {0}")]
    Config(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Logging could not be installed.
    #[error("failed to initialize logging: {0}")]
    Telemetry(#[from] TracingError),
    /// The async runtime could not be built.
    #[error("failed to build the async runtime: {0}")]
    Runtime(#[source] io::Error),
    /// The envelope file could not be opened.
    #[error("failed to open change source `{}`: {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The pipeline stopped on a failure of the hierarchy, the snapshot store or the destination.
    #[error("pipeline failed")]
    Pipeline(#[from] DocSinkError),
}

impl ReplicatorError {
    /// Creates a configuration error from any error.
    pub fn config<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        ReplicatorError::Config(Box::new(err))
    }

    /// Returns what the operator should look at first.
    fn hint(&self) -> Option<&'static str> {
        match self {
            ReplicatorError::Config(_) => {
                Some("check the configuration directory and the APP_ENVIRONMENT variable")
            }
            ReplicatorError::Telemetry(_) => Some("check the RUST_LOG variable"),
            ReplicatorError::Runtime(_) => None,
            ReplicatorError::Source { .. } => Some("check that the source path exists"),
            ReplicatorError::Pipeline(err) => match err.kind() {
                ErrorKind::DestinationError => Some(
                    "the destination rejected a write, changes after the last written one must be redelivered",
                ),
                ErrorKind::IoError => Some("the change source stopped while being read"),
                ErrorKind::SnapshotError => Some("check the snapshot directory"),
                _ => None,
            },
        }
    }

    /// Renders the failure for the terminal.
    ///
    /// Pipeline failures list the kind of every aggregated error and whether it was confined to
    /// a single change. The backtrace is included when `RUST_BACKTRACE` is set.
    pub fn render_report(&self) -> String {
        let mut out = String::from("docsink-replicator failed\n");
        let _ = writeln!(out, "error: {self}");

        if let ReplicatorError::Pipeline(err) = self {
            for kind in err.kinds() {
                let scope = if kind.is_event_scoped() {
                    "single change"
                } else {
                    "whole run"
                };
                let _ = writeln!(out, "kind: {kind:?} ({scope})");
            }
            for line in err.to_string().lines() {
                let _ = writeln!(out, "  {line}");
            }
        }

        // Pipeline errors already render themselves above, only their causes follow.
        let mut source = match self {
            ReplicatorError::Pipeline(err) => err.source(),
            _ => std::error::Error::source(self),
        };
        let mut index = 1usize;
        while let Some(err) = source {
            let _ = writeln!(out, "cause {index}: {err}");
            source = err.source();
            index += 1;
        }

        if let Some(hint) = self.hint() {
            let _ = writeln!(out, "hint: {hint}");
        }

        if should_render_backtrace()
            && let ReplicatorError::Pipeline(err) = self
            && let Some(backtrace) = err.backtrace()
        {
            let _ = writeln!(out, "backtrace:\n{backtrace}");
        }

        out
    }
}

fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsink::docsink_error;

    #[test]
    fn pipeline_report_lists_kinds_causes_and_hint() {
        let io = io::Error::other("disk full");
        let err = ReplicatorError::from(docsink_error!(
            ErrorKind::DestinationError,
            "Failed to write instructions to the output",
            source: io
        ));

        let report = err.render_report();

        assert!(report.starts_with("docsink-replicator failed\nerror: pipeline failed\n"));
        assert!(report.contains("kind: DestinationError (whole run)\n"));
        assert!(report.contains("Failed to write instructions to the output"));
        assert!(report.contains("cause 1: disk full\n"));
        assert!(report.contains("hint: the destination rejected a write"));
    }

    #[test]
    fn aggregated_pipeline_failure_lists_every_kind() {
        let err = ReplicatorError::from(DocSinkError::from(vec![
            docsink_error!(ErrorKind::IoError, "Read failed"),
            docsink_error!(ErrorKind::DestinationError, "Flush failed"),
        ]));

        let report = err.render_report();

        assert!(report.contains("kind: IoError (whole run)\nkind: DestinationError (whole run)\n"));
        assert!(report.contains("hint: the change source stopped while being read"));
    }

    #[test]
    fn source_report_names_the_path() {
        let err = ReplicatorError::Source {
            path: PathBuf::from("/missing/changes.jsonl"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };

        let report = err.render_report();

        assert!(report.contains("error: failed to open change source `/missing/changes.jsonl`"));
        assert!(report.contains("cause 1: "));
        assert!(report.contains("hint: check that the source path exists\n"));
    }
}
