use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::docsink_error;
use crate::error::{DocSinkResult, ErrorKind};
use crate::store::snapshot::{HierarchySnapshot, SnapshotStore};

const ORGANIZATIONS_FILE: &str = "organizations.json";
const DIVISIONS_FILE: &str = "divisions.json";

/// Snapshot storage backed by two JSON files in a directory.
///
/// Organizations and the flat division index are written to separate files. Each file is first
/// written next to its final path and then renamed over it, so a crash in the middle of a write
/// leaves the previous version readable.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    directory: PathBuf,
}

impl FileSnapshotStore {
    /// Creates a store writing into `directory`. The directory is created on the first write.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn organizations_path(&self) -> PathBuf {
        self.directory.join(ORGANIZATIONS_FILE)
    }

    fn divisions_path(&self) -> PathBuf {
        self.directory.join(DIVISIONS_FILE)
    }
}

impl SnapshotStore for FileSnapshotStore {
    async fn load_snapshot(&self) -> DocSinkResult<Option<HierarchySnapshot>> {
        let organizations = read_json_file(&self.organizations_path()).await?;
        let divisions = read_json_file(&self.divisions_path()).await?;

        if organizations.is_none() && divisions.is_none() {
            debug!(directory = %self.directory.display(), "no snapshot files found");
            return Ok(None);
        }

        Ok(Some(HierarchySnapshot {
            organizations: organizations.unwrap_or_default(),
            divisions: divisions.unwrap_or_default(),
        }))
    }

    async fn store_snapshot(&self, snapshot: HierarchySnapshot) -> DocSinkResult<()> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|err| {
                docsink_error!(
                    ErrorKind::SnapshotError,
                    "Failed to create snapshot directory",
                    self.directory.display().to_string(),
                    source: err
                )
            })?;

        write_json_file(&self.organizations_path(), &snapshot.organizations).await?;
        write_json_file(&self.divisions_path(), &snapshot.divisions).await?;

        debug!(
            organizations = snapshot.organizations.len(),
            divisions = snapshot.divisions.len(),
            "stored hierarchy snapshot"
        );

        Ok(())
    }
}

/// Reads and parses `path`, returning [`None`] when the file does not exist.
async fn read_json_file<T: DeserializeOwned>(path: &Path) -> DocSinkResult<Option<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(docsink_error!(
                ErrorKind::SnapshotError,
                "Failed to read snapshot file",
                path.display().to_string(),
                source: err
            ));
        }
    };

    let value = serde_json::from_slice(&bytes).map_err(|err| {
        docsink_error!(
            ErrorKind::SnapshotError,
            "Snapshot file is not valid",
            path.display().to_string(),
            source: err
        )
    })?;

    Ok(Some(value))
}

async fn write_json_file<T: Serialize>(path: &Path, value: &T) -> DocSinkResult<()> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|err| {
        docsink_error!(
            ErrorKind::SerializationError,
            "Failed to serialize snapshot",
            path.display().to_string(),
            source: err
        )
    })?;

    let temporary_path = path.with_extension("json.tmp");
    let write_error = |err: io::Error| {
        docsink_error!(
            ErrorKind::SnapshotError,
            "Failed to write snapshot file",
            path.display().to_string(),
            source: err
        )
    };

    tokio::fs::write(&temporary_path, bytes)
        .await
        .map_err(write_error)?;
    tokio::fs::rename(&temporary_path, path)
        .await
        .map_err(write_error)?;

    Ok(())
}
