//! Collects finished background jobs.
//!
//! A dedicated thread polls every PID in the [`JobTable`] with a non-blocking
//! `waitpid`. It never waits on anything it does not track, so foreground
//! children stay with the executor that is blocked on them.

use crate::io_adapters::Notices;
use crate::jobs::JobTable;
use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Check each tracked job once without blocking.
///
/// Jobs that exited or were killed are removed from `jobs` and announced as
/// `<<< child N exited`. Returns the PIDs collected by this pass.
pub fn reap_finished(jobs: &JobTable, notices: &Notices) -> Vec<Pid> {
    let mut reaped = Vec::new();

    for pid in jobs.pids() {
        match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(..) | WaitStatus::Signaled(..)) => {
                if let Some(job) = jobs.find(pid) {
                    jobs.remove(job);
                    notices.emit(format_args!("\r<<< child {} exited\n", pid));
                    reaped.push(pid);
                }
            }
            Ok(_) => {}
            Err(Errno::ECHILD) => {
                // Somebody else already collected it.
                if let Some(job) = jobs.find(pid) {
                    jobs.remove(job);
                }
                debug!(pid = pid.as_raw(), "job vanished before it was reaped");
            }
            Err(Errno::EINTR) => {}
            Err(err) => warn!(pid = pid.as_raw(), %err, "waitpid failed"),
        }
    }

    reaped
}

/// Handle to the running reaper thread.
pub struct Reaper {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl Reaper {
    /// Start polling `jobs` every `interval`.
    pub fn spawn(jobs: JobTable, notices: Notices, interval: Duration) -> std::io::Result<Self> {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("reaper".into())
            .spawn(move || {
                loop {
                    match stopped.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            reap_finished(&jobs, &notices);
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("reaper stopped");
            })?;
        Ok(Self { stop, handle })
    }

    /// Stop polling and wait for the thread to finish.
    pub fn stop(self) {
        let _ = self.stop.send(());
        if self.handle.join().is_err() {
            warn!("reaper thread panicked");
        }
    }
}
