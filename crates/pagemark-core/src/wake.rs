//! Keeps the display awake while reading, where the platform allows it.

use crate::error::PagemarkError;
use crate::error::PagemarkResult;

pub trait WakeLock {
    fn request(&mut self) -> PagemarkResult<()>;

    fn is_supported(&self) -> bool {
        true
    }
}

/// For hosts with no wake-lock capability.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnsupportedWakeLock;

impl WakeLock for UnsupportedWakeLock {
    fn request(&mut self) -> PagemarkResult<()> {
        Err(PagemarkError::wake_lock("not supported by this host"))
    }

    fn is_supported(&self) -> bool {
        false
    }
}

/// Requests the lock at startup and again whenever the host becomes visible.
///
/// Failures are logged and otherwise ignored.
pub struct WakeLockManager {
    lock: Box<dyn WakeLock>,
    held: bool,
    requests: u32,
}

impl std::fmt::Debug for WakeLockManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakeLockManager")
            .field("held", &self.held)
            .field("requests", &self.requests)
            .finish_non_exhaustive()
    }
}

impl WakeLockManager {
    pub fn new(lock: Box<dyn WakeLock>) -> Self {
        Self {
            lock,
            held: false,
            requests: 0,
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Number of requests actually issued to the platform.
    pub fn requests(&self) -> u32 {
        self.requests
    }

    pub fn acquire(&mut self) {
        if !self.lock.is_supported() {
            tracing::debug!("wake lock unsupported; skipping");
            return;
        }
        self.requests += 1;
        match self.lock.request() {
            Ok(()) => {
                self.held = true;
                tracing::debug!("wake lock acquired");
            }
            Err(err) => {
                self.held = false;
                tracing::warn!(%err, "wake lock request failed");
            }
        }
    }

    /// Platforms drop the lock while hidden; re-request on the way back.
    pub fn on_visibility(&mut self, visible: bool) {
        if visible {
            self.acquire();
        } else {
            self.held = false;
        }
    }
}
