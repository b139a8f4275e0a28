//! Hot reload of the allow-list file.
//!
//! notify delivers raw file-system events on its own thread; they are funnelled
//! into a channel drained by one worker thread. The worker waits for the file
//! to settle, folds every event that arrived meanwhile into a single reload,
//! and only then calls back. A change that lands while a reload is running
//! stays queued and triggers exactly one follow-up reload.

use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use notify::event::{AccessKind, AccessMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace, warn};

use crate::{AllowList, AllowListError, AllowListStore};

/// Keeps the file watch alive. Dropping it stops the watch and joins the
/// reload worker.
pub struct AllowListWatcher {
    watcher: Option<RecommendedWatcher>,
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl AllowListStore {
    /// Starts watching the backing file.
    ///
    /// `on_change` runs on the worker thread after every successful reload.
    /// Failed reloads keep the previous snapshot and do not call back.
    pub fn watch<F>(
        self: &Arc<Self>,
        settle: Duration,
        on_change: F,
    ) -> Result<AllowListWatcher, AllowListError>
    where
        F: Fn(Arc<AllowList>) + Send + 'static,
    {
        let file_name = self
            .file_path()
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| AllowListError::InvalidPath(self.file_path().display().to_string()))?;
        let dir = match self.file_path().parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let (changed_tx, changed_rx) = channel::unbounded::<()>();
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if touches_file(&event, &file_name) {
                    trace!("Allow-list file event: {:?}", event.kind);
                    let _ = changed_tx.send(());
                }
            }
            Err(e) => warn!("Allow-list watcher error: {e}"),
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        let store = Arc::clone(self);
        let worker = thread::Builder::new()
            .name("allowlist-reload".into())
            .spawn(move || reload_loop(store, settle, changed_rx, stop_rx, on_change))?;

        debug!("Watching allow-list at {}", self.file_path().display());

        Ok(AllowListWatcher {
            watcher: Some(watcher),
            stop: Some(stop_tx),
            worker: Some(worker),
        })
    }
}

fn reload_loop<F>(
    store: Arc<AllowListStore>,
    settle: Duration,
    changed: Receiver<()>,
    stop: Receiver<()>,
    on_change: F,
) where
    F: Fn(Arc<AllowList>),
{
    loop {
        channel::select! {
            recv(changed) -> msg => {
                if msg.is_err() {
                    break;
                }
                thread::sleep(settle);
                let folded = changed.try_iter().count();
                if folded > 0 {
                    trace!("Folded {folded} allow-list events into one reload");
                }
                if let Some(list) = store.reload() {
                    on_change(list);
                }
            }
            recv(stop) -> _ => break,
        }
    }
    debug!("Allow-list reload worker stopped");
}

fn touches_file(event: &Event, file_name: &OsString) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Create(_)
            | EventKind::Modify(_)
            | EventKind::Remove(_)
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
    );
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

impl Drop for AllowListWatcher {
    fn drop(&mut self) {
        // stop file events first, then the worker
        self.watcher.take();
        self.stop.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Allow-list reload worker panicked");
            }
        }
    }
}
