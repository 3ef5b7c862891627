use std::{
    collections::{BTreeSet, HashMap},
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use tokio::{
    sync::{Mutex, broadcast},
    task::JoinHandle,
};

use crate::{config, error::Result, warning};

const EVENT_CAPACITY: usize = 64;

/// A key changed in storage. `value` is `None` when the key was removed.
///
/// `external` is set when the change was made by another process and only
/// noticed by polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub value: Option<String>,
    pub external: bool,
}

/// Persistent string key/value storage with change notifications.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

/// In-process storage. Several sessions sharing one instance behave like
/// several browser tabs sharing local storage.
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: Mutex::new(HashMap::new()),
            events,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let previous = self
            .entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());

        if previous.as_deref() != Some(value) {
            // no receivers is fine
            let _ = self.events.send(StorageEvent {
                key: key.to_string(),
                value: Some(value.to_string()),
                external: false,
            });
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let removed = self.entries.lock().await.remove(key);
        if removed.is_some() {
            let _ = self.events.send(StorageEvent {
                key: key.to_string(),
                value: None,
                external: false,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

/// Storage backed by a JSON object file shared between processes.
///
/// Every read goes to disk. Writes replace the file atomically. Changes made
/// by other processes are published once [`FileStorage::poll_external_changes`]
/// notices them.
pub struct FileStorage {
    path: PathBuf,
    snapshot: Mutex<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

impl FileStorage {
    pub fn default_path() -> PathBuf {
        config::data_dir().join("storage.json")
    }

    /// Opens the storage file at `path`, reading its current content as the
    /// baseline for change detection. The file does not need to exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let storage = Self {
            path: path.into(),
            snapshot: Mutex::new(HashMap::new()),
            events,
        };

        let entries = read_entries(&storage.path).await?;
        *storage.snapshot.lock().await = entries;
        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Compares the file with the last observed content and publishes an
    /// external event for every key that differs. Returns the number of
    /// changed keys.
    pub async fn poll_external_changes(&self) -> Result<usize> {
        let mut snapshot = self.snapshot.lock().await;
        let current = read_entries(&self.path).await?;
        let changed = self.publish_diff(&snapshot, &current, true);
        *snapshot = current;
        Ok(changed)
    }

    /// Polls the file for external changes every `interval` until the
    /// storage is dropped.
    pub fn spawn_watcher(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let Some(storage) = weak.upgrade() else {
                    break;
                };
                if let Err(e) = storage.poll_external_changes().await {
                    warning!("Failed to check storage file for changes: {}", e);
                }
            }
        })
    }

    async fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let mut snapshot = self.snapshot.lock().await;
        let on_disk = read_entries(&self.path).await?;
        // other processes may have written since the last poll
        self.publish_diff(&snapshot, &on_disk, true);

        let mut entries = on_disk.clone();
        apply(&mut entries);
        if entries != on_disk {
            write_entries(&self.path, &entries).await?;
            self.publish_diff(&on_disk, &entries, false);
        }

        *snapshot = entries;
        Ok(())
    }

    fn publish_diff(
        &self,
        before: &HashMap<String, String>,
        after: &HashMap<String, String>,
        external: bool,
    ) -> usize {
        let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
        let mut changed = 0;
        for key in keys {
            let value = after.get(key);
            if before.get(key) != value {
                changed += 1;
                let _ = self.events.send(StorageEvent {
                    key: key.clone(),
                    value: value.cloned(),
                    external,
                });
            }
        }
        changed
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(read_entries(&self.path).await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
        .await
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

async fn read_entries(path: &Path) -> Result<HashMap<String, String>> {
    match async_fs::read_to_string(path).await {
        Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(e.into()),
    }
}

async fn write_entries(path: &Path, entries: &HashMap<String, String>) -> Result<()> {
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(entries)?;
    let tmp_path = path.with_extension("json.tmp");
    async_fs::write(&tmp_path, json).await?;
    async_fs::rename(&tmp_path, path).await?;
    Ok(())
}
