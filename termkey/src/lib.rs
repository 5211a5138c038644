//! Incremental terminal key input decoder.
//!
//! A [`Decoder`] owns a byte buffer fed by [`Decoder::advisereadable`] or
//! [`Decoder::push_input`], and turns it into [`Key`] events with [`Decoder::getkey`]. The single
//! awkward case -- a lone `ESC` byte that might be the start of an escape sequence still in
//! flight, or might just be the user pressing Escape -- is resolved by waiting up to
//! [`Decoder::waittime`] milliseconds for more input before deciding, exactly as a terminal
//! application talking to a real tty has to.

#[macro_use]
extern crate log;

mod buffer;
mod driver;
mod format;
mod key;
mod registry;
mod termios;

#[cfg(test)]
mod tests;

pub use format::Format;
pub use key::{sym, Key, KeyValue, Modifiers, Utf8Bytes};

use std::fmt;
use std::os::unix::io::RawFd;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};
use nix::sys::termios::Termios;

use buffer::ByteBuffer;
use driver::{Driver, DriverMatch};
use registry::Registry;

const ESC: u8 = 0x1b;
const UTF8_REPLACEMENT: u32 = 0xfffd;
const DEFAULT_BUFFER_SIZE: usize = 256;
const DEFAULT_WAITTIME_MS: i32 = 50;

/// Construction-time and runtime behaviour flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags(u8);

impl Flags {
    pub const NONE: Flags = Flags(0);
    /// Treat input as raw 8-bit bytes: no UTF-8 decoding, no C0/Space/DEL interpretation.
    pub const RAW: Flags = Flags(1);
    /// Decode input as UTF-8. Mutually exclusive with `RAW`; if neither is given, the locale
    /// environment variables decide (see `Decoder::new_full`).
    pub const UTF8: Flags = Flags(2);
    /// Never translate a C0 byte, Space or DEL to a named `KeySym`; always emit the literal
    /// Unicode/Ctrl-modified code point instead.
    pub const NOINTERPRET: Flags = Flags(4);
    /// Don't touch the terminal's termios state at all (no raw-mode capture, no restore on drop).
    pub const NOTERMIOS: Flags = Flags(8);

    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Flags {
    type Output = Flags;
    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

/// Why `Decoder::new`/`new_full` failed.
#[derive(Debug)]
pub enum NewError {
    /// Neither the CSI driver nor the terminfo driver accepted `$TERM`.
    NoDriver,
}

impl fmt::Display for NewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NewError::NoDriver => write!(f, "no escape-sequence driver available for this terminal"),
        }
    }
}

impl std::error::Error for NewError {}

/// Outcome of a decode attempt.
#[derive(Debug)]
pub enum Decode {
    /// A complete key was decoded and consumed from the buffer.
    Key(Key),
    /// The buffer holds a prefix of something, but not enough bytes to resolve it yet.
    Again,
    /// Nothing to decode right now (buffer empty, or waiting on more input with no timeout due).
    None,
    /// The input stream is closed and the buffer is empty; no further keys will ever arrive.
    Eof,
}

/// Owns a file descriptor's buffered input and (unless [`Flags::NOTERMIOS`]) its termios state,
/// and decodes it incrementally into [`Key`] events.
pub struct Decoder {
    fd: RawFd,
    flags: Flags,
    buffer: ByteBuffer,
    waittime_ms: i32,
    registry: Registry,
    driver: Driver,
    restore_termios: Option<Termios>,
    is_closed: bool,
}

impl Decoder {
    /// `Decoder::new_full(fd, flags, 256, 50)`.
    pub fn new(fd: RawFd, flags: Flags) -> Result<Decoder, NewError> {
        Decoder::new_full(fd, flags, DEFAULT_BUFFER_SIZE, DEFAULT_WAITTIME_MS)
    }

    pub fn new_full(
        fd: RawFd,
        mut flags: Flags,
        buffer_size: usize,
        waittime_ms: i32,
    ) -> Result<Decoder, NewError> {
        if !flags.contains(Flags::RAW) && !flags.contains(Flags::UTF8) && locale_is_utf8() {
            flags = flags | Flags::UTF8;
        }

        let term = std::env::var("TERM").ok();
        let driver = Driver::probe(term.as_deref()).ok_or(NewError::NoDriver)?;

        let restore_termios = if flags.contains(Flags::NOTERMIOS) {
            None
        } else {
            let captured = termios::capture(fd);
            if let Some(captured) = &captured {
                termios::apply_raw(fd, captured);
            }
            captured
        };

        Ok(Decoder {
            fd,
            flags,
            buffer: ByteBuffer::new(buffer_size),
            waittime_ms,
            registry: Registry::new(),
            driver,
            restore_termios,
            is_closed: false,
        })
    }

    pub fn waittime(&self) -> i32 {
        self.waittime_ms
    }

    pub fn set_waittime(&mut self, ms: i32) {
        self.waittime_ms = ms;
    }

    /// Bytes still held in the buffer, not yet turned into a `Key`.
    pub fn remaining(&self) -> usize {
        self.buffer.count()
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    pub fn register_keyname(&mut self, sym: u32, name: &str) -> u32 {
        self.registry.register_keyname(sym, name)
    }

    pub fn get_keyname(&self, sym: u32) -> &str {
        self.registry.get_keyname(sym)
    }

    pub fn register_c0(&mut self, sym: u32, ctrl: u8, name: Option<&str>) -> Option<u32> {
        self.registry.register_c0(sym, ctrl, name)
    }

    pub fn register_c0_full(
        &mut self,
        sym: u32,
        modifier_set: Modifiers,
        modifier_mask: Modifiers,
        ctrl: u8,
        name: Option<&str>,
    ) -> Option<u32> {
        self.registry.register_c0_full(sym, modifier_set, modifier_mask, ctrl, name)
    }

    /// Renders `key` using this decoder's registry (for `KeySym` names).
    pub fn format_key(&self, key: &Key, format: Format) -> String {
        format::format_key(key, &self.registry, format)
    }

    /// Appends bytes already read by the caller (e.g. from a non-blocking read loop) to the
    /// internal buffer, without touching the file descriptor.
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.buffer.push(bytes);
    }

    /// Attempts a single non-blocking read from the file descriptor and buffers whatever came
    /// back. Call after the fd is reported readable (e.g. by an external event loop).
    pub fn advisereadable(&mut self) -> Decode {
        let mut scratch = [0u8; 64];
        match nix::unistd::read(self.fd, &mut scratch) {
            Ok(0) => {
                self.is_closed = true;
                Decode::None
            }
            Ok(n) => {
                self.buffer.push(&scratch[..n]);
                Decode::Again
            }
            Err(Errno::EAGAIN | Errno::EINTR) => Decode::None,
            Err(err) => {
                debug!("read({}) failed: {}", self.fd, err);
                self.is_closed = true;
                Decode::None
            }
        }
    }

    /// Decodes the next key from already-buffered input. Never blocks or reads from the file
    /// descriptor. A lone, otherwise-unresolved `ESC` yields `Again` (if `waittime() > 0`) rather
    /// than being decided immediately; use `getkey_force` once that wait has elapsed.
    pub fn getkey(&mut self) -> Decode {
        self.getkey_impl(false)
    }

    /// Like `getkey`, but resolves an ambiguous lone `ESC` or incomplete escape sequence
    /// immediately as a standalone `Escape` key instead of returning `Again`. Call this once
    /// `waittime()` has elapsed with no further input, or when no more input will ever arrive.
    pub fn getkey_force(&mut self) -> Decode {
        self.getkey_impl(true)
    }

    fn getkey_impl(&mut self, force: bool) -> Decode {
        if self.buffer.count() == 0 {
            return if self.is_closed { Decode::Eof } else { Decode::None };
        }

        let b0 = self.buffer.peek(0);
        if b0 != ESC {
            return self.getkey_simple();
        }

        if self.buffer.count() == 1 {
            if !force && self.waittime_ms > 0 {
                return Decode::Again;
            }
            return self.getkey_simple();
        }

        match self.driver.try_match(self.buffer.as_slice(), &self.registry) {
            DriverMatch::Key { key, consumed } => {
                self.buffer.eat(consumed);
                Decode::Key(key)
            }
            DriverMatch::Again if !force => Decode::Again,
            // No driver recognizes this as an escape sequence -- or we've been told to stop
            // waiting for more bytes to arrive -- so the leading ESC is a standalone Escape key,
            // and whatever follows it is reprocessed on the next call.
            DriverMatch::Again | DriverMatch::None => self.getkey_simple(),
        }
    }

    /// The non-escape decode path: one C0/ASCII/UTF-8 byte sequence consumed per call. `Raw`
    /// (or a non-UTF-8 locale) only changes how bytes `>= 0xA0` are handled -- C0/Space/DEL
    /// interpretation below that still applies.
    fn getkey_simple(&mut self) -> Decode {
        let b0 = self.buffer.peek(0);

        // No valid UTF-8 lead byte starts in [0x80, 0xA0), so that range is folded in with G0/C0
        // and always goes through the code-point emitter, regardless of the `Utf8` flag.
        if b0 < 0xa0 {
            let key = emit_codepoint(self.flags, &self.registry, b0 as u32);
            self.buffer.eat(1);
            return Decode::Key(key);
        }

        if !self.flags.contains(Flags::UTF8) {
            let key = Key::new(KeyValue::raw(b0), Modifiers::NONE);
            self.buffer.eat(1);
            return Decode::Key(key);
        }

        let (nbytes, lead_bits) = match b0 {
            0xc0..=0xdf => (2, (b0 & 0x1f) as u32),
            0xe0..=0xef => (3, (b0 & 0x0f) as u32),
            0xf0..=0xf7 => (4, (b0 & 0x07) as u32),
            0xf8..=0xfb => (5, (b0 & 0x03) as u32),
            0xfc..=0xfd => (6, (b0 & 0x01) as u32),
            _ => {
                // 0xfe, 0xff: not a valid UTF-8 lead byte under any encoding length.
                let key = emit_codepoint(self.flags, &self.registry, UTF8_REPLACEMENT);
                self.buffer.eat(1);
                return Decode::Key(key);
            }
        };

        if self.buffer.count() < nbytes {
            return if self.waittime_ms > 0 { Decode::Again } else { Decode::None };
        }

        let mut codepoint = lead_bits;
        for i in 1..nbytes {
            let cb = self.buffer.peek(i);
            if !(0x80..0xc0).contains(&cb) {
                // Truncated sequence: emit replacement for the lead byte alone, leave the
                // invalid continuation byte itself (and everything after it) for the next call.
                let key = emit_codepoint(self.flags, &self.registry, UTF8_REPLACEMENT);
                self.buffer.eat(i - 1);
                return Decode::Key(key);
            }
            codepoint = (codepoint << 6) | (cb & 0x3f) as u32;
        }

        if nbytes > key::utf8_seqlen(codepoint)
            || (0xd800..=0xdfff).contains(&codepoint)
            || codepoint == 0xfffe
            || codepoint == 0xffff
        {
            codepoint = UTF8_REPLACEMENT;
        }

        let key = emit_codepoint(self.flags, &self.registry, codepoint);
        self.buffer.eat(nbytes);
        Decode::Key(key)
    }

    /// Blocks (via `poll`) until a key is available, the ambiguity timeout resolves a pending
    /// `ESC`, or the stream closes.
    pub fn waitkey(&mut self) -> Decode {
        loop {
            match self.getkey() {
                Decode::Key(key) => return Decode::Key(key),
                Decode::Eof => return Decode::Eof,
                Decode::None => {
                    if matches!(self.advisereadable(), Decode::None) && self.is_closed {
                        return Decode::Eof;
                    }
                }
                Decode::Again => {
                    let mut fds = [PollFd::new(self.fd, PollFlags::POLLIN)];
                    match poll(&mut fds, self.waittime_ms) {
                        Ok(0) => return self.getkey_force(),
                        Ok(_) => {
                            self.advisereadable();
                        }
                        Err(err) => {
                            debug!("poll({}) failed: {}", self.fd, err);
                            return self.getkey_force();
                        }
                    }
                }
            }
        }
    }
}

impl Drop for Decoder {
    fn drop(&mut self) {
        if let Some(captured) = &self.restore_termios {
            termios::restore(self.fd, captured);
        }
    }
}

/// Turns a decoded Unicode code point into a `Key`, applying C0/Space/DEL interpretation and the
/// 0x80-0x9f "8-bit Ctrl+Alt" convention unless `NoInterpret` is set.
fn emit_codepoint(flags: Flags, registry: &Registry, codepoint: u32) -> Key {
    let no_interpret = flags.contains(Flags::NOINTERPRET);

    if codepoint < 0x20 {
        let c0 = registry.c0(codepoint as u8);
        if !no_interpret && c0.sym != sym::NONE {
            return Key::new(KeyValue::KeySym(c0.sym), c0.modifier_set);
        }
        return Key::new(KeyValue::unicode(codepoint + 0x40), Modifiers::CTRL);
    }

    if codepoint == 0x20 && !no_interpret {
        return Key::new(KeyValue::KeySym(sym::SPACE), Modifiers::NONE);
    }

    if codepoint == 0x7f && !no_interpret {
        return Key::new(KeyValue::KeySym(sym::DEL), Modifiers::NONE);
    }

    if (0x80..0xa0).contains(&codepoint) {
        return Key::new(KeyValue::unicode(codepoint - 0x40), Modifiers::CTRL | Modifiers::ALT);
    }

    Key::new(KeyValue::unicode(codepoint), Modifiers::NONE)
}

/// `LANG`, then (only if `LANG` didn't decide it) `LC_MESSAGES`, then (only if neither did)
/// `LC_ALL`, each checked for a `UTF-8` substring -- `LANG` takes priority, matching
/// `termkey_new_full`'s own unconditional-`LANG`-first checks.
fn locale_is_utf8() -> bool {
    for var in ["LANG", "LC_MESSAGES", "LC_ALL"] {
        if let Ok(val) = std::env::var(var) {
            if val.contains("UTF-8") {
                return true;
            }
        }
    }
    false
}
