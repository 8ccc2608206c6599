//! Registry of background children.

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// A tracked background process, as returned by [`JobTable::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Job {
    pid: Pid,
}

impl Job {
    pub fn pid(&self) -> Pid {
        self.pid
    }
}

/// PIDs of background jobs that have not been collected yet.
///
/// Cloning yields another handle to the same table. Every operation takes the
/// table lock for its whole duration, so the executor and the reaper never see
/// a half-updated table. Each PID is tracked at most once; order is not kept.
#[derive(Debug, Clone, Default)]
pub struct JobTable {
    jobs: Arc<Mutex<Vec<Job>>>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start tracking `pid`. Returns `false` if it was already tracked.
    pub fn insert(&self, pid: Pid) -> bool {
        let mut jobs = self.lock();
        if jobs.iter().any(|job| job.pid == pid) {
            return false;
        }
        jobs.push(Job { pid });
        true
    }

    /// Look up a tracked PID.
    ///
    /// Non-positive values are never tracked; `waitpid`-style sentinels such as
    /// `-1` or `0` always come back as `None`.
    pub fn find(&self, pid: Pid) -> Option<Job> {
        if pid.as_raw() <= 0 {
            return None;
        }
        self.lock().iter().copied().find(|job| job.pid == pid)
    }

    /// Stop tracking `job`. Returns `false` if it was not tracked.
    pub fn remove(&self, job: Job) -> bool {
        let mut jobs = self.lock();
        match jobs.iter().position(|tracked| *tracked == job) {
            Some(index) => {
                jobs.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the tracked PIDs.
    pub fn pids(&self) -> Vec<Pid> {
        self.lock().iter().map(Job::pid).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Empty the table, sending `SIGTERM` to every job in it.
    ///
    /// Delivery is not verified; a job that already exited only produces a
    /// warning. Returns the PIDs that were drained so the caller can collect
    /// them.
    pub fn drain_and_terminate(&self) -> Vec<Pid> {
        let drained: Vec<Job> = std::mem::take(&mut *self.lock());
        drained
            .into_iter()
            .map(|job| {
                match kill(job.pid, Signal::SIGTERM) {
                    Ok(()) => debug!(pid = job.pid.as_raw(), "sent SIGTERM"),
                    Err(err) => warn!(pid = job.pid.as_raw(), %err, "could not terminate job"),
                }
                job.pid
            })
            .collect()
    }
}
