use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LoadingId(pub u64);

/// Loading indicator handle for one component tree.
///
/// The owner of the tree creates the scope and passes clones down to whatever
/// needs to report activity. There is no process-wide instance; the indicator
/// lives exactly as long as the last clone.
#[derive(Clone, Default)]
pub struct LoadingScope {
    next_id: Arc<AtomicU64>,
    active: Arc<RwLock<BTreeMap<LoadingId, String>>>,
}

impl LoadingScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the scope busy until the returned guard is dropped.
    #[must_use = "the indicator turns off as soon as the guard is dropped"]
    pub fn begin(&self, label: impl Into<String>) -> LoadingGuard {
        let id = LoadingId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let label = label.into();
        tracing::trace!(id = id.0, %label, "loading started");
        let mut active = match self.active.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        active.insert(id, label);
        LoadingGuard {
            scope: self.clone(),
            id,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.read().is_empty()
    }

    /// Labels of the operations currently in flight, oldest first.
    pub fn labels(&self) -> Vec<String> {
        self.read().values().cloned().collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<LoadingId, String>> {
        match self.active.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn finish(&self, id: LoadingId) {
        let mut active = match self.active.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        active.remove(&id);
        tracing::trace!(id = id.0, "loading finished");
    }
}

pub struct LoadingGuard {
    scope: LoadingScope,
    id: LoadingId,
}

impl LoadingGuard {
    pub fn id(&self) -> LoadingId {
        self.id
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.scope.finish(self.id);
    }
}
