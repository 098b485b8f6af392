//! The background persister: a thread that writes a snapshot on a fixed
//! schedule whenever the map has changed.

use crate::error::PersistError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Counters for background snapshot writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistStats {
    /// Snapshot writes that completed.
    pub writes: u64,
    /// Snapshot writes that failed. These are not retried on their own.
    pub failures: u64,
}

#[derive(Debug, Default)]
struct Flags {
    dirty: AtomicBool,
    shutting_down: AtomicBool,
    writes: AtomicU64,
    failures: AtomicU64,
}

impl Flags {
    /// One tick of the schedule. Clears `dirty` before writing so a mutation
    /// that lands during the write sets it again for the next tick.
    fn run_cycle<F>(&self, write_fn: &F)
    where
        F: Fn() -> Result<(), PersistError>,
    {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return;
        }
        match write_fn() {
            Ok(()) => {
                self.writes.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    error = %e,
                    "snapshot write failed, changes stay unsaved until the next mutation"
                );
            }
        }
    }
}

/// Fixed rate, but missed ticks are skipped rather than replayed.
fn next_deadline(prev: Option<Instant>, interval: Duration, now: Instant) -> Option<Instant> {
    match prev.and_then(|at| at.checked_add(interval)) {
        Some(at) if at >= now => Some(at),
        _ => now.checked_add(interval),
    }
}

/// Background thread that writes the map on a timer when it's dirty.
/// Joins the thread on drop so nothing leaks.
pub struct Persister {
    flags: Arc<Flags>,
    wake: Mutex<Option<mpsc::SyncSender<()>>>,
    join_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Persister {
    /// Spawn the worker. Every `interval` it calls `write_fn` if something
    /// called [`notify`](Self::notify) since the last write started.
    pub fn start<F>(interval: Duration, write_fn: F) -> Self
    where
        F: Fn() -> Result<(), PersistError> + Send + 'static,
    {
        let flags = Arc::new(Flags::default());
        let worker_flags = Arc::clone(&flags);
        // Never sent on; dropping the sender is the wake-up.
        let (tx, rx) = mpsc::sync_channel::<()>(0);

        let join_handle = thread::Builder::new()
            .name("local-store-persister".into())
            .spawn(move || {
                tracing::info!(
                    interval_ms = interval.as_millis() as u64,
                    "persister started"
                );
                // `None` when the interval runs past what `Instant` can hold:
                // the worker then only wakes for shutdown.
                let mut next_tick = Instant::now().checked_add(interval);
                loop {
                    // Timeout is the normal tick; Disconnected means shutdown.
                    match next_tick {
                        Some(at) => {
                            let _ = rx.recv_timeout(at.saturating_duration_since(Instant::now()));
                        }
                        None => {
                            let _ = rx.recv();
                        }
                    }
                    worker_flags.run_cycle(&write_fn);
                    if worker_flags.shutting_down.load(Ordering::Acquire) {
                        break;
                    }
                    next_tick = next_deadline(next_tick, interval, Instant::now());
                }
                tracing::info!("persister stopped");
            });

        let join_handle = match join_handle {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "could not spawn persister thread, snapshots disabled"
                );
                flags.shutting_down.store(true, Ordering::Release);
                None
            }
        };

        Self {
            flags,
            wake: Mutex::new(Some(tx)),
            join_handle: Mutex::new(join_handle),
        }
    }

    /// Mark the map as changed. Never blocks.
    pub fn notify(&self) {
        self.flags.dirty.store(true, Ordering::Release);
    }

    /// Clear the dirty flag, returning whether it was set.
    pub(crate) fn take_dirty(&self) -> bool {
        self.flags.dirty.swap(false, Ordering::AcqRel)
    }

    /// `true` if a change hasn't been picked up by a write yet.
    pub fn is_dirty(&self) -> bool {
        self.flags.dirty.load(Ordering::Acquire)
    }

    /// Ask the worker to run one last cycle and exit. Returns right away;
    /// a second call does nothing.
    pub fn request_shutdown(&self) {
        if self.flags.shutting_down.swap(true, Ordering::AcqRel) {
            return;
        }
        drop(self.wake.lock().take());
    }

    /// [`request_shutdown`](Self::request_shutdown), then wait for the
    /// worker's final cycle to finish.
    pub fn shutdown_and_join(&self) {
        self.request_shutdown();
        let handle = self.join_handle.lock().take();
        if let Some(h) = handle {
            if h.join().is_err() {
                tracing::warn!("persister thread panicked");
            }
        }
    }

    /// `true` once shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        self.flags.shutting_down.load(Ordering::Acquire)
    }

    /// Write counters so far.
    pub fn stats(&self) -> PersistStats {
        PersistStats {
            writes: self.flags.writes.load(Ordering::Relaxed),
            failures: self.flags.failures.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for Persister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persister")
            .field("dirty", &self.is_dirty())
            .field("shutting_down", &self.is_shutting_down())
            .field("stats", &self.stats())
            .finish()
    }
}

impl Drop for Persister {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}
