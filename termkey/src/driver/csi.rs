//! Recognizes `ESC [ ... final` (CSI) and `ESC O x` (SS3) sequences: the vt100/xterm escape
//! families essentially every non-`dumb` terminal speaks.

use termkey_macros::byte_seq_parser;

use crate::driver::DriverMatch;
use crate::key::{sym, Key, KeyValue, Modifiers};
use crate::registry::Registry;

const ESC: u8 = 0x1b;

/// Payload of a recognized SS3 suffix: either a named key or a numbered function key.
#[derive(Clone, Copy)]
enum Ss3Outcome {
    Sym(u32),
    Function(i32),
}

// SS3 never carries parameters, so the fixed byte-string family is exactly the shape
// `byte_seq_parser!` generates a decision tree for. The rules below are single bytes: the
// variable part of `ESC O <byte>`, since `ESC O` itself is stripped before matching.
byte_seq_parser! {
    parse_ss3 -> Ss3Outcome,

    [b'A'] => Ss3Outcome::Sym(sym::UP),
    [b'B'] => Ss3Outcome::Sym(sym::DOWN),
    [b'C'] => Ss3Outcome::Sym(sym::RIGHT),
    [b'D'] => Ss3Outcome::Sym(sym::LEFT),
    [b'H'] => Ss3Outcome::Sym(sym::HOME),
    [b'F'] => Ss3Outcome::Sym(sym::END),
    [b'E'] => Ss3Outcome::Sym(sym::BEGIN),
    [b'P'] => Ss3Outcome::Function(1),
    [b'Q'] => Ss3Outcome::Function(2),
    [b'R'] => Ss3Outcome::Function(3),
    [b'S'] => Ss3Outcome::Function(4),
    // vt100 application-keypad mode
    [b'p'] => Ss3Outcome::Sym(sym::KP0),
    [b'q'] => Ss3Outcome::Sym(sym::KP1),
    [b'r'] => Ss3Outcome::Sym(sym::KP2),
    [b's'] => Ss3Outcome::Sym(sym::KP3),
    [b't'] => Ss3Outcome::Sym(sym::KP4),
    [b'u'] => Ss3Outcome::Sym(sym::KP5),
    [b'v'] => Ss3Outcome::Sym(sym::KP6),
    [b'w'] => Ss3Outcome::Sym(sym::KP7),
    [b'x'] => Ss3Outcome::Sym(sym::KP8),
    [b'y'] => Ss3Outcome::Sym(sym::KP9),
    [b'M'] => Ss3Outcome::Sym(sym::KPENTER),
    [b'j'] => Ss3Outcome::Sym(sym::KPMULT),
    [b'k'] => Ss3Outcome::Sym(sym::KPPLUS),
    [b'l'] => Ss3Outcome::Sym(sym::KPCOMMA),
    [b'm'] => Ss3Outcome::Sym(sym::KPMINUS),
    [b'n'] => Ss3Outcome::Sym(sym::KPPERIOD),
    [b'o'] => Ss3Outcome::Sym(sym::KPDIV),
    [b'X'] => Ss3Outcome::Sym(sym::KPEQUALS),
}

pub(crate) struct CsiDriver;

impl CsiDriver {
    /// The CSI family is understood by essentially every terminal that isn't explicitly `dumb`;
    /// mirrors the reference CSI driver, which has no real probe logic of its own.
    pub(crate) fn new_driver(term: Option<&str>) -> Option<CsiDriver> {
        match term {
            Some("dumb") => None,
            _ => Some(CsiDriver),
        }
    }

    pub(crate) fn try_match(&self, buf: &[u8], _registry: &Registry) -> DriverMatch {
        debug_assert_eq!(buf[0], ESC);
        debug_assert!(buf.len() >= 2);

        match buf[1] {
            b'O' => try_match_ss3(buf),
            b'[' => try_match_csi(buf),
            _ => DriverMatch::None,
        }
    }
}

fn try_match_ss3(buf: &[u8]) -> DriverMatch {
    let rest = &buf[2..];

    if let Some((outcome, used)) = parse_ss3(rest) {
        let value = match outcome {
            Ss3Outcome::Sym(sym) => KeyValue::KeySym(sym),
            Ss3Outcome::Function(n) => KeyValue::Function(n),
        };
        return DriverMatch::Key {
            key: Key::new(value, Modifiers::NONE),
            consumed: 2 + used,
        };
    }

    if parse_ss3_is_prefix(rest) {
        DriverMatch::Again
    } else {
        DriverMatch::None
    }
}

/// `ESC [ <param>? (';' <param>)? <final>`, `<param>` a run of ASCII digits (default 1 when
/// absent), `<final>` a letter or `~`. Parsed by hand since the parameter grammar isn't a fixed
/// byte string `byte_seq_parser!` could enumerate.
fn try_match_csi(buf: &[u8]) -> DriverMatch {
    let mut i = 2;
    let mut params: Vec<u32> = Vec::new();
    let mut cur: Option<u32> = None;

    loop {
        if i >= buf.len() {
            return DriverMatch::Again;
        }

        match buf[i] {
            b @ b'0'..=b'9' => {
                let digit = (b - b'0') as u32;
                cur = Some(cur.unwrap_or(0) * 10 + digit);
                i += 1;
            }
            b';' => {
                params.push(cur.take().unwrap_or(1));
                i += 1;
            }
            final_byte @ (b'~' | b'A'..=b'Z' | b'a'..=b'z') => {
                params.push(cur.take().unwrap_or(1));
                i += 1;
                return resolve_csi(final_byte, &params, i);
            }
            _ => return DriverMatch::None,
        }
    }
}

fn resolve_csi(final_byte: u8, params: &[u32], consumed: usize) -> DriverMatch {
    let modifiers = match params.get(1) {
        Some(&p) => Modifiers::from_bits((p.saturating_sub(1) & 0x7) as u8),
        None => Modifiers::NONE,
    };
    let param1 = params.first().copied().unwrap_or(1);

    let value = if final_byte == b'~' {
        tilde_key(param1)
    } else {
        letter_key(final_byte)
    };

    match value {
        Some(value) => DriverMatch::Key {
            key: Key::new(value, modifiers),
            consumed,
        },
        None => DriverMatch::None,
    }
}

/// xterm/rxvt `CSI <n> ~` numbering for editing and function keys.
fn tilde_key(param: u32) -> Option<KeyValue> {
    Some(match param {
        1 | 7 => KeyValue::KeySym(sym::HOME),
        2 => KeyValue::KeySym(sym::INSERT),
        3 => KeyValue::KeySym(sym::DELETE),
        4 | 8 => KeyValue::KeySym(sym::END),
        5 => KeyValue::KeySym(sym::PAGEUP),
        6 => KeyValue::KeySym(sym::PAGEDOWN),
        11 => KeyValue::Function(1),
        12 => KeyValue::Function(2),
        13 => KeyValue::Function(3),
        14 => KeyValue::Function(4),
        15 => KeyValue::Function(5),
        17 => KeyValue::Function(6),
        18 => KeyValue::Function(7),
        19 => KeyValue::Function(8),
        20 => KeyValue::Function(9),
        21 => KeyValue::Function(10),
        23 => KeyValue::Function(11),
        24 => KeyValue::Function(12),
        25 => KeyValue::Function(13),
        26 => KeyValue::Function(14),
        28 => KeyValue::Function(15),
        29 => KeyValue::Function(16),
        31 => KeyValue::Function(17),
        32 => KeyValue::Function(18),
        33 => KeyValue::Function(19),
        34 => KeyValue::Function(20),
        _ => return None,
    })
}

/// `CSI <params>? <letter>` — arrows, Home/End/Begin, vt100-numbered F1-F4.
fn letter_key(letter: u8) -> Option<KeyValue> {
    Some(match letter {
        b'A' => KeyValue::KeySym(sym::UP),
        b'B' => KeyValue::KeySym(sym::DOWN),
        b'C' => KeyValue::KeySym(sym::RIGHT),
        b'D' => KeyValue::KeySym(sym::LEFT),
        b'H' => KeyValue::KeySym(sym::HOME),
        b'F' => KeyValue::KeySym(sym::END),
        b'E' => KeyValue::KeySym(sym::BEGIN),
        b'P' => KeyValue::Function(1),
        b'Q' => KeyValue::Function(2),
        b'R' => KeyValue::Function(3),
        b'S' => KeyValue::Function(4),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    fn mtch(bytes: &[u8]) -> DriverMatch {
        let registry = Registry::new();
        CsiDriver.try_match(bytes, &registry)
    }

    #[test]
    fn ss3_arrow() {
        match mtch(b"\x1bOA") {
            DriverMatch::Key { key, consumed } => {
                assert_eq!(key.value, KeyValue::KeySym(sym::UP));
                assert_eq!(key.modifiers, Modifiers::NONE);
                assert_eq!(consumed, 3);
            }
            _ => panic!("expected Key"),
        }
    }

    #[test]
    fn ss3_partial_is_again() {
        assert!(matches!(mtch(b"\x1bO"), DriverMatch::Again));
    }

    #[test]
    fn csi_partial_param_is_again() {
        assert!(matches!(mtch(b"\x1b[9"), DriverMatch::Again));
    }

    #[test]
    fn csi_delete() {
        match mtch(b"\x1b[3~") {
            DriverMatch::Key { key, consumed } => {
                assert_eq!(key.value, KeyValue::KeySym(sym::DELETE));
                assert_eq!(consumed, 4);
            }
            _ => panic!("expected Key"),
        }
    }

    #[test]
    fn csi_ctrl_right() {
        match mtch(b"\x1b[1;5C") {
            DriverMatch::Key { key, consumed } => {
                assert_eq!(key.value, KeyValue::KeySym(sym::RIGHT));
                assert_eq!(key.modifiers, Modifiers::CTRL);
                assert_eq!(consumed, 6);
            }
            _ => panic!("expected Key"),
        }
    }

    #[test]
    fn csi_function_key_rxvt_numbering() {
        match mtch(b"\x1b[11~") {
            DriverMatch::Key { key, .. } => {
                assert_eq!(key.value, KeyValue::Function(1));
            }
            _ => panic!("expected Key"),
        }
    }

    #[test]
    fn ss3_keypad_zero() {
        match mtch(b"\x1bOp") {
            DriverMatch::Key { key, .. } => {
                assert_eq!(key.value, KeyValue::KeySym(sym::KP0));
            }
            _ => panic!("expected Key"),
        }
    }

    #[test]
    fn unrecognized_csi_final_is_none() {
        assert!(matches!(mtch(b"\x1b[9z"), DriverMatch::None));
    }
}
