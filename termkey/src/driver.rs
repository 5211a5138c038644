//! The pluggable protocol-recognizer seam: given the buffer content starting at a leading `ESC`
//! (the lone-ESC ambiguity is handled once, by the orchestrator, before a driver ever sees the
//! buffer), try to recognize a complete escape sequence.

use crate::key::Key;
use crate::registry::Registry;

pub(crate) mod csi;
pub(crate) mod terminfo_driver;

/// Outcome of a driver's attempt to recognize bytes at the head of the buffer. Mirrors
/// `termkey_result` minus `Key`/`Eof`, which only make sense once combined with the simple
/// decoder and the empty-buffer check the orchestrator already performs.
pub(crate) enum DriverMatch {
    /// A complete sequence was recognized; consumes `consumed` bytes (including the leading ESC).
    Key { key: Key, consumed: usize },
    /// A prefix of some recognizable sequence; more bytes may complete it.
    Again,
    /// Nothing recognizable, and no amount of further input would complete the bytes seen so far.
    None,
}

/// The two concrete protocol recognizers, probed in this order at construction time. Modeled as
/// a tagged enum rather than a trait object: exactly two implementations exist, and the REDESIGN
/// FLAGS ask for the function-pointer-table dispatch of the reference to become a small closed
/// set of variants.
pub(crate) enum Driver {
    Csi(csi::CsiDriver),
    Terminfo(terminfo_driver::TerminfoDriver),
}

impl Driver {
    /// Probes drivers in the fixed order CSI, then terminfo. Binds the first one whose
    /// `new_driver` succeeds.
    pub(crate) fn probe(term: Option<&str>) -> Option<Driver> {
        if let Some(csi) = csi::CsiDriver::new_driver(term) {
            return Some(Driver::Csi(csi));
        }
        if let Some(ti) = terminfo_driver::TerminfoDriver::new_driver(term) {
            return Some(Driver::Terminfo(ti));
        }
        None
    }

    /// `buf` is guaranteed non-empty and to start with `ESC` (0x1b) with at least one more byte
    /// buffered (the orchestrator resolves the single-ESC case itself).
    pub(crate) fn try_match(&self, buf: &[u8], registry: &Registry) -> DriverMatch {
        match self {
            Driver::Csi(d) => d.try_match(buf, registry),
            Driver::Terminfo(d) => d.try_match(buf, registry),
        }
    }
}
