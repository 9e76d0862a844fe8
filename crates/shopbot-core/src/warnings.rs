//! User-visible warning list threaded through one search call.

use std::sync::{Arc, Mutex, PoisonError};

/// Cloneable handle to a deduplicating, mutex-guarded warning list.
///
/// Every clone appends to the same list; identical messages are kept once.
#[derive(Debug, Clone, Default)]
pub struct WarningLog {
    inner: Arc<Mutex<Vec<String>>>,
}

impl WarningLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` unless an identical one is already present.
    /// Returns `true` when the message was added.
    pub fn push(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.contains(&message) {
            return false;
        }
        guard.push(message);
        true
    }

    /// Insert `message` at the front, removing any existing copy.
    pub fn prepend(&self, message: impl Into<String>) {
        let message = message.into();
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.retain(|m| *m != message);
        guard.insert(0, message);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_deduplicates_identical_messages() {
        let log = WarningLog::new();
        assert!(log.push("quota exhausted"));
        assert!(!log.push("quota exhausted"));
        assert!(log.push("other"));
        assert_eq!(log.snapshot(), vec!["quota exhausted", "other"]);
    }

    #[test]
    fn clones_share_the_same_list() {
        let log = WarningLog::new();
        let clone = log.clone();
        clone.push("from clone");
        assert_eq!(log.snapshot(), vec!["from clone"]);
    }

    #[test]
    fn prepend_moves_message_to_front() {
        let log = WarningLog::new();
        log.push("a");
        log.push("b");
        log.prepend("b");
        log.prepend("c");
        assert_eq!(log.snapshot(), vec!["c", "b", "a"]);
    }

    #[test]
    fn concurrent_pushes_are_all_recorded_once() {
        let log = WarningLog::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = log.clone();
                std::thread::spawn(move || {
                    log.push("shared");
                    log.push(format!("thread {i}"));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let all = log.snapshot();
        assert_eq!(all.iter().filter(|m| *m == "shared").count(), 1);
        assert_eq!(all.len(), 9);
    }
}
