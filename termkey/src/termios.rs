//! Captures, mutates and restores the controlling terminal's mode. Mirrors the shape
//! `term_input::Input` uses for its own fd-state guard (capture on construct, restore on drop,
//! log-and-continue on failure rather than panicking), applied to `termios` instead of `fcntl`
//! flags.

use std::os::unix::io::RawFd;

use nix::sys::termios::{self, InputFlags, LocalFlags, SetArg, Termios};

/// `tcgetattr`; returns `None` (and logs) on failure rather than propagating, matching
/// `term_input::set_stdin_nonblocking`'s "errors are logged, not fatal" posture -- a decoder
/// that can't read termios should still be usable, just without raw-mode management.
pub(crate) fn capture(fd: RawFd) -> Option<Termios> {
    match termios::tcgetattr(fd) {
        Ok(termios) => Some(termios),
        Err(err) => {
            debug!("tcgetattr({}) failed: {}", fd, err);
            None
        }
    }
}

/// Clears `IXON|INLCR|ICRNL` from the input flags and `ICANON|ECHO|ISIG` from the local flags of
/// a clone of `captured`, then applies it with `TCSANOW`.
pub(crate) fn apply_raw(fd: RawFd, captured: &Termios) {
    let mut raw = captured.clone();
    raw.input_flags &= !(InputFlags::IXON | InputFlags::INLCR | InputFlags::ICRNL);
    raw.local_flags &= !(LocalFlags::ICANON | LocalFlags::ECHO | LocalFlags::ISIG);

    if let Err(err) = termios::tcsetattr(fd, SetArg::TCSANOW, &raw) {
        error!("tcsetattr({}) failed while entering raw mode: {}", fd, err);
    }
}

/// Restores exactly the termios struct captured at construction.
pub(crate) fn restore(fd: RawFd, captured: &Termios) {
    if let Err(err) = termios::tcsetattr(fd, SetArg::TCSANOW, captured) {
        error!("tcsetattr({}) failed while restoring termios: {}", fd, err);
    }
}
