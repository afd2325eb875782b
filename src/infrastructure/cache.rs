//! Layout cache implementations
//!
//! The session only ever reads/writes the entry for its own device key, but
//! multiple sessions may share one store, so both implementations guard the
//! map with a mutex.

use crate::domain::layout::ButtonLayout;
use crate::domain::models::DeviceKey;
use crate::domain::session::LayoutCache;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Process-lifetime cache
#[derive(Default)]
pub struct MemoryLayoutCache {
    layouts: Mutex<HashMap<DeviceKey, ButtonLayout>>,
}

impl MemoryLayoutCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayoutCache for MemoryLayoutCache {
    fn get(&self, key: &DeviceKey) -> Option<ButtonLayout> {
        self.layouts.lock().unwrap().get(key).cloned()
    }

    fn put(&self, key: &DeviceKey, layout: &ButtonLayout) {
        self.layouts
            .lock()
            .unwrap()
            .insert(key.clone(), layout.clone());
    }
}

/// JSON-file-backed cache so layouts survive restarts and a reconnect can
/// skip the layout request entirely.
pub struct FileLayoutCache {
    layouts: Mutex<HashMap<DeviceKey, ButtonLayout>>,
    cache_path: PathBuf,
}

impl FileLayoutCache {
    /// Open the cache under the platform config directory, loading any
    /// previously persisted layouts.
    pub fn open() -> anyhow::Result<Self> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("ToeRemote");
        fs::create_dir_all(&path)?;
        path.push("layouts.json");
        Ok(Self::open_at(path))
    }

    pub fn open_at(cache_path: PathBuf) -> Self {
        let layouts = Self::load_from_file(&cache_path).unwrap_or_default();
        debug!(entries = layouts.len(), path = %cache_path.display(), "Layout cache loaded");
        Self {
            layouts: Mutex::new(layouts),
            cache_path,
        }
    }

    fn load_from_file(path: &PathBuf) -> anyhow::Result<HashMap<DeviceKey, ButtonLayout>> {
        let contents = fs::read_to_string(path)?;
        let layouts = serde_json::from_str(&contents)?;
        Ok(layouts)
    }

    fn persist(&self, layouts: &HashMap<DeviceKey, ButtonLayout>) {
        let result = serde_json::to_string_pretty(layouts)
            .map_err(anyhow::Error::from)
            .and_then(|json| fs::write(&self.cache_path, json).map_err(Into::into));
        if let Err(err) = result {
            // A stale cache only costs one extra layout request next run
            warn!(%err, "Failed to persist layout cache");
        }
    }
}

impl LayoutCache for FileLayoutCache {
    fn get(&self, key: &DeviceKey) -> Option<ButtonLayout> {
        self.layouts.lock().unwrap().get(key).cloned()
    }

    fn put(&self, key: &DeviceKey, layout: &ButtonLayout) {
        let mut layouts = self.layouts.lock().unwrap();
        layouts.insert(key.clone(), layout.clone());
        self.persist(&layouts);
    }
}
