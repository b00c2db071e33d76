use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::encode_line;

/// An append-only journal of metric samples.
///
/// Each appended sample becomes one newline-terminated line in the journal
/// file. The file is opened per append, so a concurrent rotation never
/// redirects writes into the capture file: after the rename, the next append
/// recreates the journal under its original name.
///
/// Lines are never read back or rewritten here; the upload side takes over
/// via rotation.
#[derive(Clone, Debug)]
pub struct Journal {
    path: PathBuf,
    prefix: String,
}

impl Journal {
    /// Creates a journal writer for the file at `path`.
    ///
    /// `prefix` is prepended to every metric name written through this
    /// journal. The file itself is created lazily on the first append.
    pub fn new(path: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            prefix: prefix.into(),
        }
    }

    /// Returns the path of the journal file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one sample stamped with the current time.
    pub async fn append(&self, name: &str, value: f64) -> io::Result<()> {
        self.write_line(encode_line(&self.prefix, name, value, None))
            .await
    }

    /// Appends one sample with an explicit timestamp text.
    pub async fn append_at(&self, name: &str, value: f64, timestamp: &str) -> io::Result<()> {
        self.write_line(encode_line(&self.prefix, name, value, Some(timestamp)))
            .await
    }

    async fn write_line(&self, line: String) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}
