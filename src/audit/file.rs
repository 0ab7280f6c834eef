use super::{AuditEntry, AuditFuture, AuditSink};
use crate::error::AuditError;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Appends audit entries to a JSON-lines file
///
/// The file and its parent directories are created on first write.
#[derive(Debug, Clone)]
pub struct FileAuditSink {
    path: PathBuf,
}

impl FileAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

impl AuditSink for FileAuditSink {
    fn write<'a>(&'a self, entry: &'a AuditEntry) -> AuditFuture<'a> {
        Box::pin(self.append(entry))
    }
}
