use std::sync::{Arc, Mutex, MutexGuard};

/// A shared, ordered collection of raw rejected journal lines.
///
/// The sink is a diagnostic output: parsing appends the verbatim text of
/// every line that fails validation, and the owner drains it at their own
/// pace. Statline never reads the lines back itself.
///
/// Handles are cheap clones of the same underlying sequence, so the parser
/// side and the draining side can hold one each.
#[derive(Clone, Debug, Default)]
pub struct RejectSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RejectSink {
    /// Creates a new, empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the raw text of a rejected line.
    pub fn push(&self, line: &str) {
        self.lock().push(line.to_owned());
    }

    /// Removes and returns all collected lines, in insertion order.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    /// Returns the number of collected lines.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no lines have been collected.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        // Pushes and drains cannot panic, so the lock cannot be poisoned.
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order_and_empties() {
        let sink = RejectSink::new();
        sink.push("first");
        sink.push("second");

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.drain(), vec!["first".to_owned(), "second".to_owned()]);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_clones_share_contents() {
        let sink = RejectSink::new();
        let handle = sink.clone();

        sink.push("shared");
        assert_eq!(handle.drain(), vec!["shared".to_owned()]);
        assert!(sink.is_empty());
    }
}
