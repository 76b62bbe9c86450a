//! Cross-process run exclusivity via an advisory lock on a file.

use std::fs::{File, OpenOptions, TryLockError};
use std::io::{self, Write as _};
use std::path::Path;
use std::time::Duration;

use tokio::time::Instant;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Held while a cycle runs.
///
/// The lock belongs to the open file handle, so it is released when this
/// value drops or the process dies. A lock file left on disk by a crashed run
/// therefore never blocks the next one. The file itself is kept and holds the
/// pid of the last holder.
#[derive(Debug)]
pub(crate) struct RunLock {
    _file: File,
}

impl RunLock {
    /// Locks `path`, creating it if needed and polling until `timeout` elapses.
    ///
    /// Returns `Ok(None)` when another holder still has the lock at the
    /// deadline.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened or locked for any
    /// reason other than contention.
    pub(crate) async fn acquire(path: &Path, timeout: Duration) -> io::Result<Option<Self>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock() {
                Ok(()) => {
                    if file.set_len(0).is_ok() {
                        let _ = writeln!(&file, "{}", std::process::id());
                    }
                    return Ok(Some(Self { _file: file }));
                }
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        return Ok(None);
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(TryLockError::Error(e)) => return Err(e),
            }
        }
    }
}
