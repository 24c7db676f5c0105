//! Run journal: one JSON [`ArchivedIteration`] per line

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::artifacts::ArchivedIteration;
use crate::error::AdaptError;

pub const JOURNAL_FILE: &str = "adaptation.jsonl";

/// Append-only record of archived iterations
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    /// Journal inside a workspace directory
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(JOURNAL_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, record: &ArchivedIteration) -> Result<(), AdaptError> {
        debug!(iteration = record.global_iteration, "Journal::append: called");
        let line = serde_json::to_string(record).map_err(|source| AdaptError::Journal {
            path: self.path.clone(),
            source,
        })? + "\n";

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| AdaptError::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| AdaptError::io(&self.path, e))?;
        file.flush().await.map_err(|e| AdaptError::io(&self.path, e))?;
        Ok(())
    }

    /// All records in write order; a missing journal reads as empty
    pub async fn read_all(&self) -> Result<Vec<ArchivedIteration>, AdaptError> {
        debug!(path = ?self.path, "Journal::read_all: called");
        if !self.path.exists() {
            return Ok(vec![]);
        }
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| AdaptError::io(&self.path, e))?;

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|source| AdaptError::Journal {
                    path: self.path.clone(),
                    source,
                })
            })
            .collect()
    }
}
