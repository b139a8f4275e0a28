use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, error, info, warn};

use crate::{AllowList, AllowListEntries, AllowListError};

/// Owner of the allow-list file and of the current snapshot (thread-safe).
///
/// Readers call [`snapshot`](Self::snapshot) and keep the returned `Arc` for
/// as long as one evaluation lasts. Writers never touch a published snapshot;
/// they build a new one and swap the pointer.
pub struct AllowListStore {
    file_path: PathBuf,
    current: RwLock<Arc<AllowList>>,
    generation: AtomicU64,
    // load/reload/update run one at a time so an older read cannot win the swap
    writer: Mutex<()>,
}

impl AllowListStore {
    /// Creates a store for `path` holding an empty snapshot. Nothing is read
    /// until [`load`](Self::load) is called.
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            file_path: path.into(),
            current: RwLock::new(Arc::new(AllowList::empty())),
            generation: AtomicU64::new(0),
            writer: Mutex::new(()),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<AllowList> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Initial load.
    ///
    /// A missing file is bootstrapped with an empty list and written out. A
    /// file that cannot be read or parsed yields an empty list, which admits
    /// everyone.
    pub fn load(&self) -> Arc<AllowList> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        match self.read_raw() {
            Ok(Some(content)) => match parse(&content) {
                Ok(entries) => {
                    let list = self.install(entries);
                    debug!(
                        "Loaded allow-list from {} ({} entries)",
                        self.file_path.display(),
                        list.total_count()
                    );
                    list
                }
                Err(e) => {
                    error!(
                        "Failed to parse allow-list {}: {e}",
                        self.file_path.display()
                    );
                    self.install(AllowListEntries::default())
                }
            },
            Ok(None) => {
                let entries = AllowListEntries::default();
                if let Err(e) = self.persist(&entries) {
                    error!(
                        "Failed to create allow-list {}: {e}",
                        self.file_path.display()
                    );
                } else {
                    info!("Created empty allow-list at {}", self.file_path.display());
                }
                self.install(entries)
            }
            Err(e) => {
                error!(
                    "Failed to read allow-list {}: {e}",
                    self.file_path.display()
                );
                self.install(AllowListEntries::default())
            }
        }
    }

    /// Re-reads the file after an external change.
    ///
    /// Returns the new snapshot, or `None` when the previous one was kept
    /// (file missing, empty, unreadable or malformed).
    pub fn reload(&self) -> Option<Arc<AllowList>> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let content = match self.read_raw() {
            Ok(Some(content)) => content,
            Ok(None) => {
                warn!(
                    "Allow-list {} disappeared, keeping previous entries",
                    self.file_path.display()
                );
                return None;
            }
            Err(e) => {
                error!(
                    "Failed to reload allow-list {}: {e}",
                    self.file_path.display()
                );
                return None;
            }
        };

        if content.trim().is_empty() {
            debug!("Allow-list file is empty (write in progress?), keeping previous entries");
            return None;
        }

        match parse(&content) {
            Ok(entries) => {
                let list = self.install(entries);
                info!(
                    "Reloaded allow-list ({} entries, generation {})",
                    list.total_count(),
                    list.generation()
                );
                Some(list)
            }
            Err(e) => {
                error!("Failed to reload allow-list: {e}");
                None
            }
        }
    }

    /// Applies `edit` to a copy of the current entries, persists the result
    /// and publishes it.
    pub fn update<F>(&self, edit: F) -> Result<Arc<AllowList>, AllowListError>
    where
        F: FnOnce(&mut AllowListEntries),
    {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut entries = self.snapshot().entries().clone();
        edit(&mut entries);
        let entries = entries.normalized();
        self.persist(&entries)?;
        Ok(self.install(entries))
    }

    fn read_raw(&self) -> Result<Option<String>, AllowListError> {
        match fs::read_to_string(&self.file_path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes via a sibling temp file and rename so readers never see a
    /// truncated document.
    fn persist(&self, entries: &AllowListEntries) -> Result<(), AllowListError> {
        if let Some(dir) = self.file_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let file_name = self
            .file_path
            .file_name()
            .ok_or_else(|| AllowListError::InvalidPath(self.file_path.display().to_string()))?;
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.file_path.with_file_name(tmp_name);

        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.file_path)?;
        Ok(())
    }

    fn install(&self, entries: AllowListEntries) -> Arc<AllowList> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let list = Arc::new(AllowList::new(entries, generation));
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = list.clone();
        list
    }
}

fn parse(content: &str) -> Result<AllowListEntries, AllowListError> {
    if content.trim().is_empty() {
        return Ok(AllowListEntries::default());
    }
    Ok(serde_json::from_str(content)?)
}
