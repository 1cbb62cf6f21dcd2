//! Per-save mutual exclusion.
//!
//! Every mutation of a save document runs load-mutate-write against one JSON
//! file, so two concurrent mutations of the same save would silently drop
//! one of them. Each save gets its own async mutex; different saves never
//! contend with each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct SaveLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SaveLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for one save, creating it on first use. The guard is
    /// owned so it can be held across await points.
    pub async fn lock(&self, save_id: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().expect("save lock map poisoned");
            Arc::clone(
                map.entry(save_id.to_string())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        entry.lock_owned().await
    }
}
