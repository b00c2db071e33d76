use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

/// The suffix appended to a journal path to form its capture path.
pub const CAPTURE_SUFFIX: &str = ".up";

/// Returns the capture path for the given journal path.
///
/// The capture file lives next to the journal: `metrics.journal` is captured
/// as `metrics.journal.up`.
pub fn capture_path(journal_path: &Path) -> PathBuf {
    let mut path = journal_path.as_os_str().to_owned();
    path.push(CAPTURE_SUFFIX);
    PathBuf::from(path)
}

/// Hands the active journal off to its capture file.
///
/// The existence of a capture file means an upload is pending or in flight.
/// A capture left over from an unfinished cycle therefore wins: it is
/// returned untouched, and the live journal keeps accumulating new samples
/// under its own name until the old snapshot has been dealt with. Renaming
/// over it would silently discard un-uploaded data.
///
/// Without a leftover capture, the journal is renamed in one atomic step;
/// the rename is the only synchronization between writer and uploader. A
/// missing journal (and no capture) surfaces as a `NotFound` error.
pub async fn rotate(journal_path: &Path) -> io::Result<PathBuf> {
    let capture = capture_path(journal_path);

    match fs::metadata(&capture).await {
        Ok(_) => {
            statline_log::debug!(
                capture = %capture.display(),
                "processing pre-existing capture file"
            );
            return Ok(capture);
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => (),
        Err(error) => return Err(error),
    }

    fs::rename(journal_path, &capture).await?;
    Ok(capture)
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_capture_path_appends_suffix() {
        assert_eq!(
            capture_path(Path::new("/var/lib/statline/metrics.journal")),
            PathBuf::from("/var/lib/statline/metrics.journal.up")
        );
    }

    #[tokio::test]
    async fn test_rotate_renames_journal() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join("metrics.journal");
        std::fs::write(&journal, "1420115696 app.hits 1\n").unwrap();

        let captured = rotate(&journal).await.unwrap();

        assert_eq!(captured, capture_path(&journal));
        assert!(!journal.exists());
        assert_eq!(
            std::fs::read_to_string(&captured).unwrap(),
            "1420115696 app.hits 1\n"
        );
    }

    #[tokio::test]
    async fn test_rotate_twice_keeps_pending_capture() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join("metrics.journal");
        std::fs::write(&journal, "old contents\n").unwrap();

        let captured = rotate(&journal).await.unwrap();

        // New samples arrive while the first capture is still pending.
        std::fs::write(&journal, "new contents\n").unwrap();

        let second = rotate(&journal).await.unwrap();

        assert_eq!(second, captured);
        assert_eq!(std::fs::read_to_string(&captured).unwrap(), "old contents\n");
        assert_eq!(std::fs::read_to_string(&journal).unwrap(), "new contents\n");
    }

    #[tokio::test]
    async fn test_rotate_missing_journal_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join("does-not-exist.journal");

        let error = rotate(&journal).await.unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
    }
}
