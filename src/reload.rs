//! Reader lifecycle and debounced hot reload.
//!
//! A [`ReloadCoordinator`] owns the published generation of one reader (the
//! BIN database or a side table). Queries load the current generation with a
//! single atomic read and keep using it for the whole query; a reload builds
//! a complete new generation off to the side and swaps it in.
//!
//! Loading is split in two. [`ReloadCoordinator::stage`] loads a generation
//! without publishing it, and [`Staged::commit`] publishes it. Several
//! readers can therefore be staged together and committed only once every
//! one of them has loaded.
//!
//! With watching enabled, a background thread listens for changes to the
//! file and reloads once no further change has arrived for [`DEBOUNCE`].

use arc_swap::ArcSwapOption;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::{Mutex, MutexGuard, RwLock};
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::{Error, Result};

/// Quiet period after the last change notification before reloading.
pub const DEBOUNCE: Duration = Duration::from_millis(500);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Lifecycle state of a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ReaderState {
    NotInitialized = 0,
    Initializing = 1,
    Ready = 2,
}

impl ReaderState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ReaderState::Initializing,
            2 => ReaderState::Ready,
            _ => ReaderState::NotInitialized,
        }
    }
}

/// How a reader reacts to file changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadOptions {
    /// Watch the file and reload after it changes.
    pub watch: bool,
    /// Report [`ReaderState::Initializing`] from the first change
    /// notification until the reload completes.
    pub hold_during_reload: bool,
}

type Loader<G> = Box<dyn Fn(&Path) -> Result<G> + Send + Sync>;

/// State shared with the watcher thread.
struct Shared<G> {
    current: ArcSwapOption<G>,
    state: AtomicU8,
    generation: AtomicU64,
}

impl<G> Shared<G> {
    fn state(&self) -> ReaderState {
        ReaderState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ReaderState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Swap in a new generation and mark the reader ready.
    fn publish(&self, generation: G) -> u64 {
        self.current.store(Some(Arc::new(generation)));
        let count = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.set_state(ReaderState::Ready);
        count
    }
}

/// Publishes generations of `G` and reloads them when the file changes.
///
/// # Example
///
/// ```no_run
/// use ip2l::{ReaderState, ReloadCoordinator, ReloadOptions};
///
/// let coordinator = ReloadCoordinator::new();
/// let options = ReloadOptions { watch: true, hold_during_reload: false };
/// coordinator.init("hosts.txt", options, |path| Ok(std::fs::read_to_string(path)?))?;
///
/// assert_eq!(coordinator.state(), ReaderState::Ready);
/// let text = coordinator.current().unwrap();
/// # Ok::<(), ip2l::Error>(())
/// ```
pub struct ReloadCoordinator<G> {
    shared: Arc<Shared<G>>,
    path: RwLock<Option<PathBuf>>,
    watcher: Mutex<Option<WatcherState>>,
}

impl<G: Send + Sync + 'static> ReloadCoordinator<G> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                current: ArcSwapOption::empty(),
                state: AtomicU8::new(ReaderState::NotInitialized as u8),
                generation: AtomicU64::new(0),
            }),
            path: RwLock::new(None),
            watcher: Mutex::new(None),
        }
    }

    /// Load `path` with `load` and publish the result.
    ///
    /// On failure the previous generation, state and watcher are left in
    /// place and the error is returned. On success any previous watcher is
    /// replaced.
    pub fn init<F>(&self, path: impl AsRef<Path>, options: ReloadOptions, load: F) -> Result<()>
    where
        F: Fn(&Path) -> Result<G> + Send + Sync + 'static,
    {
        self.stage(path, options, load)?.commit();
        Ok(())
    }

    /// Load `path` with `load` without publishing it.
    ///
    /// The reader reports `Initializing` until the returned [`Staged`] is
    /// committed or dropped. Dropping it puts back the state the reader had
    /// before this call. `init` and `close` on this coordinator block until
    /// then.
    pub fn stage<F>(
        &self,
        path: impl AsRef<Path>,
        options: ReloadOptions,
        load: F,
    ) -> Result<Staged<'_, G>>
    where
        F: Fn(&Path) -> Result<G> + Send + Sync + 'static,
    {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::MissingPath);
        }

        // serializes init and close
        let slot = self.watcher.lock();

        let mut staged = Staged {
            coordinator: self,
            slot,
            previous: self.shared.state(),
            path: path.to_path_buf(),
            generation: None,
            watch: None,
            committed: false,
        };
        self.shared.set_state(ReaderState::Initializing);

        staged.generation = Some(load(path)?);
        if options.watch {
            staged.watch = Some(PendingWatch::new(path, options, Box::new(load))?);
        }
        Ok(staged)
    }

    /// Stop watching and drop the current generation.
    ///
    /// A pending debounced reload is cancelled.
    pub fn close(&self) {
        let mut watcher = self.watcher.lock();
        *watcher = None;

        self.shared.current.store(None);
        self.shared.generation.store(0, Ordering::Release);
        self.shared.set_state(ReaderState::NotInitialized);
        *self.path.write() = None;
    }
}

impl<G> ReloadCoordinator<G> {
    pub fn state(&self) -> ReaderState {
        self.shared.state()
    }

    /// The current generation, if any has been loaded.
    pub fn current(&self) -> Option<Arc<G>> {
        self.shared.current.load_full()
    }

    /// Path of the last successful `init`.
    pub fn path(&self) -> Option<PathBuf> {
        self.path.read().clone()
    }

    /// Number of successful loads since the last `close`.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.lock().is_some()
    }
}

impl<G: Send + Sync + 'static> Default for ReloadCoordinator<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G> std::fmt::Debug for ReloadCoordinator<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadCoordinator")
            .field("state", &self.state())
            .field("generation", &self.generation())
            .field("path", &self.path())
            .finish()
    }
}

/// A loaded generation that has not been published yet.
///
/// Created by [`ReloadCoordinator::stage`]. Dropping it without calling
/// [`commit`](Staged::commit) leaves the reader as it was.
pub struct Staged<'a, G> {
    coordinator: &'a ReloadCoordinator<G>,
    slot: MutexGuard<'a, Option<WatcherState>>,
    previous: ReaderState,
    path: PathBuf,
    generation: Option<G>,
    watch: Option<PendingWatch<G>>,
    committed: bool,
}

impl<G: Send + Sync + 'static> Staged<'_, G> {
    /// Publish the generation and start watching if requested.
    pub fn commit(mut self) {
        let Some(generation) = self.generation.take() else {
            return;
        };
        let coordinator = self.coordinator;
        let shared = &coordinator.shared;

        // stop the old watcher first so a stale reload cannot overwrite
        // this generation
        *self.slot = None;
        shared.publish(generation);
        *coordinator.path.write() = Some(self.path.clone());

        // started after publishing, so a change seen from here on holds
        // the Ready state rather than Initializing
        if let Some(pending) = self.watch.take() {
            *self.slot = Some(pending.start(self.path.clone(), Arc::clone(shared)));
        }
        self.committed = true;
    }
}

impl<G> Drop for Staged<'_, G> {
    fn drop(&mut self) {
        if !self.committed {
            self.coordinator.shared.set_state(self.previous);
        }
    }
}

impl<G> std::fmt::Debug for Staged<'_, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Staged")
            .field("path", &self.path)
            .field("previous", &self.previous)
            .field("watch", &self.watch.is_some())
            .finish()
    }
}

/// Watcher thread handle and shutdown channel
struct WatcherThread {
    shutdown_tx: mpsc::Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Drop for WatcherThread {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// File watcher plus the thread that debounces its events.
///
/// Field order matters: the watcher is dropped (closing the event channel)
/// before the thread is joined.
struct WatcherState {
    _watcher: RecommendedWatcher,
    _thread: WatcherThread,
}

/// An installed file watch whose events queue up until the debounce thread
/// is started.
struct PendingWatch<G> {
    watcher: RecommendedWatcher,
    events: mpsc::Receiver<notify::Result<Event>>,
    file_name: OsString,
    options: ReloadOptions,
    load: Loader<G>,
}

impl<G: Send + Sync + 'static> PendingWatch<G> {
    fn new(path: &Path, options: ReloadOptions, load: Loader<G>) -> Result<Self> {
        let file_name = path.file_name().map(OsString::from).ok_or(Error::MissingPath)?;

        // Watch the directory so replacing the file (remove + create, or
        // rename over it) keeps being noticed.
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, events) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(event_tx, Config::default())?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            watcher,
            events,
            file_name,
            options,
            load,
        })
    }

    fn start(self, path: PathBuf, shared: Arc<Shared<G>>) -> WatcherState {
        let PendingWatch {
            watcher,
            events,
            file_name,
            options,
            load,
        } = self;
        let (shutdown_tx, shutdown_rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let mut last_event: Option<Instant> = None;
            let mut held: Option<ReaderState> = None;

            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                match events.recv_timeout(POLL_INTERVAL) {
                    Ok(Ok(event)) => {
                        if !names_file(&event, &file_name) {
                            continue;
                        }
                        if last_event.is_none() && options.hold_during_reload {
                            held = Some(shared.state());
                            shared.set_state(ReaderState::Initializing);
                        }
                        last_event = Some(Instant::now());
                    }
                    Ok(Err(e)) => {
                        log::warn!("Watch error on {:?}: {}", path, e);
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        let quiet = last_event.is_some_and(|t| t.elapsed() >= DEBOUNCE);
                        if !quiet {
                            continue;
                        }
                        last_event = None;
                        let original = held.take();

                        if !path.exists() {
                            log::debug!("{:?} is gone, skipping reload", path);
                            if let Some(state) = original {
                                shared.set_state(state);
                            }
                            continue;
                        }

                        match load(&path) {
                            Ok(generation) => {
                                let count = shared.publish(generation);
                                log::info!("Reloaded {:?} (generation {})", path, count);
                            }
                            Err(e) => {
                                log::warn!("Reload of {:?} failed: {}", path, e);
                                if let Some(state) = original {
                                    shared.set_state(state);
                                }
                            }
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        WatcherState {
            _watcher: watcher,
            _thread: WatcherThread {
                shutdown_tx,
                handle: Some(handle),
            },
        }
    }
}

/// Whether a notification concerns the watched file.
fn names_file(event: &Event, file_name: &OsString) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name.as_os_str()))
}
