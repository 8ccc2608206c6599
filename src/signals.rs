//! Signal dispositions for the shell and its children.
//!
//! The shell keeps `SIGINT` blocked in every one of its threads, so `Ctrl-C`
//! while a foreground job runs reaches the job (which shares the terminal's
//! process group) but never the shell. Only foreground children unblock it.

use nix::sys::signal::{SigHandler, SigSet, Signal, signal};
use std::io;

fn interrupt_set() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGINT);
    set
}

/// Block `SIGINT` in the calling thread.
///
/// Call this before starting any other thread; new threads inherit the mask.
pub fn suppress_interrupt() -> nix::Result<()> {
    interrupt_set().thread_block()
}

/// Undo [`suppress_interrupt`] for the calling thread.
pub fn allow_interrupt() -> nix::Result<()> {
    interrupt_set().thread_unblock()
}

/// Runs in the forked child right before `exec`.
///
/// Puts `SIGCHLD` back to its default action and sets the `SIGINT` mask:
/// unblocked for foreground jobs, blocked for background ones. The mask must
/// be set explicitly either way because the standard library clears the
/// child's signal mask before running pre-exec hooks.
///
/// Only async-signal-safe calls are made here.
pub fn prepare_child(foreground: bool) -> io::Result<()> {
    // SAFETY: SIG_DFL installs no Rust code as a handler.
    unsafe { signal(Signal::SIGCHLD, SigHandler::SigDfl) }.map_err(io::Error::from)?;

    let result = if foreground {
        allow_interrupt()
    } else {
        suppress_interrupt()
    };
    result.map_err(io::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::{SigmaskHow, pthread_sigmask};
    use std::thread;

    fn current_mask() -> SigSet {
        let mut old = SigSet::empty();
        pthread_sigmask(SigmaskHow::SIG_BLOCK, None, Some(&mut old)).unwrap();
        old
    }

    #[test]
    fn test_suppress_and_allow_interrupt() {
        // Run on a fresh thread so the test harness thread keeps its mask.
        thread::spawn(|| {
            suppress_interrupt().unwrap();
            assert!(current_mask().contains(Signal::SIGINT));

            let inherited = thread::spawn(|| current_mask().contains(Signal::SIGINT))
                .join()
                .unwrap();
            assert!(inherited, "new threads inherit the blocked SIGINT");

            allow_interrupt().unwrap();
            assert!(!current_mask().contains(Signal::SIGINT));
        })
        .join()
        .unwrap();
    }
}
