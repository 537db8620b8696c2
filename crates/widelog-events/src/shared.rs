//! Shared, lock-protected handle to one in-flight event.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::event::WideEvent;

/// Cloneable reference to the single live event of a request.
///
/// Every clone points at the same event. The lock is only ever held for the
/// duration of a synchronous mutation, never across an `.await`.
#[derive(Debug, Clone)]
pub struct SharedEvent {
    inner: Arc<Mutex<WideEvent>>,
}

impl SharedEvent {
    /// Wrap an event.
    #[must_use]
    pub fn new(event: WideEvent) -> Self {
        Self {
            inner: Arc::new(Mutex::new(event)),
        }
    }

    /// Run `f` with mutable access to the event.
    pub fn update<R>(&self, f: impl FnOnce(&mut WideEvent) -> R) -> R {
        f(&mut self.lock())
    }

    /// Run `f` with read access to the event.
    pub fn read<R>(&self, f: impl FnOnce(&WideEvent) -> R) -> R {
        f(&self.lock())
    }

    /// Clone the current state of the event.
    #[must_use]
    pub fn snapshot(&self) -> WideEvent {
        self.lock().clone()
    }

    /// Whether two handles refer to the same event.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // A panic inside an update closure must not disable instrumentation for
    // the rest of the request.
    fn lock(&self) -> MutexGuard<'_, WideEvent> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<WideEvent> for SharedEvent {
    fn from(event: WideEvent) -> Self {
        Self::new(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ServiceInfo;

    #[test]
    fn test_clones_share_state() {
        let shared = SharedEvent::new(WideEvent::new(ServiceInfo::new("svc")));
        let other = shared.clone();

        other.update(|e| e.set_status_code(404));

        assert!(shared.ptr_eq(&other));
        assert_eq!(shared.read(|e| e.request.status_code), 404);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let shared = SharedEvent::new(WideEvent::new(ServiceInfo::new("svc")));
        let before = shared.snapshot();
        shared.update(|e| e.request.path = "/changed".to_string());

        assert_eq!(before.request.path, "/");
        assert_eq!(shared.read(|e| e.request.path.clone()), "/changed");
    }

    #[test]
    fn test_survives_poisoned_lock() {
        let shared = SharedEvent::new(WideEvent::new(ServiceInfo::new("svc")));
        let clone = shared.clone();
        let result = std::thread::spawn(move || {
            clone.update(|_| panic!("handler bug"));
        })
        .join();
        assert!(result.is_err());

        shared.update(|e| e.set_status_code(500));
        assert_eq!(shared.read(|e| e.request.status_code), 500);
    }
}
