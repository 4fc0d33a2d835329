use std::sync::{Mutex, MutexGuard};

/// The CSRF state of the most recently issued login URL.
///
/// A single slot: [`set`](Self::set) replaces whatever was stored before.
#[derive(Debug, Default)]
pub struct CsrfStateStore {
    value: Mutex<String>,
}

impl CsrfStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: impl Into<String>) {
        *self.lock() = value.into();
    }

    /// Returns the stored state, or `None` if no login URL has been issued.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        let value = self.lock();
        (!value.is_empty()).then(|| value.clone())
    }

    fn lock(&self) -> MutexGuard<'_, String> {
        // The guarded value is a plain string replaced in one assignment, so
        // a poisoned lock still holds a whole value.
        self.value.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn empty_until_set() {
        let store = CsrfStateStore::new();
        assert_eq!(store.get(), None);

        store.set("abc");
        assert_eq!(store.get().as_deref(), Some("abc"));
    }

    #[test]
    fn last_write_wins() {
        let store = CsrfStateStore::new();
        store.set("first");
        store.set("second");
        assert_eq!(store.get().as_deref(), Some("second"));
    }

    #[test]
    fn concurrent_writers_leave_one_whole_value() {
        let store = Arc::new(CsrfStateStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.set(format!("state-{i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread");
        }

        let value = store.get().expect("set");
        assert!((0..8).any(|i| value == format!("state-{i}")));
    }
}
