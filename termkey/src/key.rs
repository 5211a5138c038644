//! The key event type and the fixed set of key-symbol ids every decoder pre-registers.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Chord modifiers. Numerically identical to the xterm CSI modifier encoding (`param - 1`), so
/// the CSI driver can use a CSI parameter directly as a `Modifiers` bitset with no translation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const SHIFT: Modifiers = Modifiers(1);
    pub const ALT: Modifiers = Modifiers(2);
    pub const CTRL: Modifiers = Modifiers(4);

    pub fn from_bits(bits: u8) -> Modifiers {
        Modifiers(bits & 0x7)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;
    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

impl BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Modifiers) {
        self.0 |= rhs.0;
    }
}

/// Pre-registered key-symbol ids, in the order `Decoder::new_full` registers their names. `NONE`
/// (id 0) is reserved and never emitted as a key. `UNKNOWN` is a sentinel outside the valid id
/// range, never assigned to a real slot, used only as a "no such symbol" return value.
pub mod sym {
    pub const NONE: u32 = 0;
    pub const BACKSPACE: u32 = 1;
    pub const TAB: u32 = 2;
    pub const ENTER: u32 = 3;
    pub const ESCAPE: u32 = 4;
    pub const SPACE: u32 = 5;
    pub const DEL: u32 = 6;
    pub const UP: u32 = 7;
    pub const DOWN: u32 = 8;
    pub const LEFT: u32 = 9;
    pub const RIGHT: u32 = 10;
    pub const BEGIN: u32 = 11;
    pub const FIND: u32 = 12;
    pub const INSERT: u32 = 13;
    pub const DELETE: u32 = 14;
    pub const SELECT: u32 = 15;
    pub const PAGEUP: u32 = 16;
    pub const PAGEDOWN: u32 = 17;
    pub const HOME: u32 = 18;
    pub const END: u32 = 19;
    pub const KP0: u32 = 20;
    pub const KP1: u32 = 21;
    pub const KP2: u32 = 22;
    pub const KP3: u32 = 23;
    pub const KP4: u32 = 24;
    pub const KP5: u32 = 25;
    pub const KP6: u32 = 26;
    pub const KP7: u32 = 27;
    pub const KP8: u32 = 28;
    pub const KP9: u32 = 29;
    pub const KPENTER: u32 = 30;
    pub const KPPLUS: u32 = 31;
    pub const KPMINUS: u32 = 32;
    pub const KPMULT: u32 = 33;
    pub const KPDIV: u32 = 34;
    pub const KPCOMMA: u32 = 35;
    pub const KPPERIOD: u32 = 36;
    pub const KPEQUALS: u32 = 37;

    /// First id available to `register_keyname(0, ..)` (auto-assignment) or to a driver that
    /// wants to mint a new symbol. Keep in sync with the table above.
    pub const FIRST_FREE: u32 = KPEQUALS + 1;

    /// Sentinel: never a real slot, always renders as `"UNKNOWN"`.
    pub const UNKNOWN: u32 = u32::MAX;
}

/// NUL-terminated UTF-8 rendering of a `Unicode` key's code point (up to 6 data bytes + NUL).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Utf8Bytes {
    buf: [u8; 7],
}

impl Utf8Bytes {
    /// Encodes `codepoint` as canonical (possibly non-shortest-overlong-free, always minimal)
    /// UTF-8, NUL-terminated. `codepoint` must not be a surrogate; callers replace those with
    /// `U+FFFD` before calling this.
    fn encode(codepoint: u32) -> Utf8Bytes {
        let nbytes = utf8_seqlen(codepoint);
        let mut buf = [0u8; 7];

        let mut cp = codepoint;
        let mut b = nbytes;
        while b > 1 {
            b -= 1;
            buf[b] = 0x80 | (cp & 0x3f) as u8;
            cp >>= 6;
        }
        buf[0] = match nbytes {
            1 => (cp & 0x7f) as u8,
            2 => 0xc0 | (cp & 0x1f) as u8,
            3 => 0xe0 | (cp & 0x0f) as u8,
            4 => 0xf0 | (cp & 0x07) as u8,
            5 => 0xf8 | (cp & 0x03) as u8,
            _ => 0xfc | (cp & 0x01) as u8,
        };
        // buf[nbytes] is already 0 (NUL terminator)

        Utf8Bytes { buf }
    }

    /// A single raw byte, stored verbatim rather than UTF-8 re-encoded. Used for the `Raw`
    /// (non-UTF-8) decode path, where `codepoint` is just the 8-bit byte value, not a real
    /// Unicode scalar.
    fn raw_byte(b: u8) -> Utf8Bytes {
        let mut buf = [0u8; 7];
        buf[0] = b;
        Utf8Bytes { buf }
    }

    pub fn as_bytes(&self) -> &[u8] {
        let len = self.buf.iter().position(|&b| b == 0).unwrap_or(self.buf.len());
        &self.buf[..len]
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or("")
    }
}

impl fmt::Debug for Utf8Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Utf8Bytes({:?})", self.as_str())
    }
}

pub(crate) fn utf8_seqlen(codepoint: u32) -> usize {
    match codepoint {
        0x0000..=0x00007f => 1,
        0x0080..=0x0007ff => 2,
        0x0800..=0x00ffff => 3,
        0x1_0000..=0x1f_ffff => 4,
        0x20_0000..=0x3ff_ffff => 5,
        _ => 6,
    }
}

/// The discriminated payload of a key event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyValue {
    /// A Unicode code point, with its canonical UTF-8 rendering attached.
    Unicode { codepoint: u32, utf8: Utf8Bytes },
    /// A named key, by registry id (see `sym`).
    KeySym(u32),
    /// A numbered function key (`F1` is `Function(1)`, etc).
    Function(i32),
}

impl KeyValue {
    pub fn unicode(codepoint: u32) -> KeyValue {
        KeyValue::Unicode {
            codepoint,
            utf8: Utf8Bytes::encode(codepoint),
        }
    }

    pub fn unicode_replacement() -> KeyValue {
        KeyValue::unicode(0xFFFD)
    }

    /// A single 8-bit byte from a non-UTF-8 stream, carried as-is rather than UTF-8 re-encoded.
    pub(crate) fn raw(byte: u8) -> KeyValue {
        KeyValue::Unicode {
            codepoint: byte as u32,
            utf8: Utf8Bytes::raw_byte(byte),
        }
    }
}

/// A single decoded key event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Key {
    pub value: KeyValue,
    pub modifiers: Modifiers,
}

impl Key {
    pub fn new(value: KeyValue, modifiers: Modifiers) -> Key {
        Key { value, modifiers }
    }
}
