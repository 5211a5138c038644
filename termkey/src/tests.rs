//! End-to-end tests driven entirely through `push_input`/`getkey`/`getkey_force`, never touching
//! a real file descriptor.

use std::sync::Mutex;

use crate::key::sym;
use crate::{Decode, Decoder, Flags, KeyValue, Modifiers};

// `TERM` is process-global; serialize the handful of tests that touch it so they don't observe
// each other's writes when cargo runs tests on multiple threads.
static TERM_LOCK: Mutex<()> = Mutex::new(());

/// Builds a decoder over a dummy fd with a fixed `TERM`, bypassing termios entirely (there's no
/// real tty backing `fd` in a test process).
fn decoder() -> Decoder {
    let _ = env_logger::try_init();
    let _guard = TERM_LOCK.lock().unwrap();
    std::env::set_var("TERM", "xterm");
    Decoder::new_full(-1, Flags::UTF8 | Flags::NOTERMIOS, 64, 50).expect("driver probe")
}

fn assert_key(result: Decode, expected: KeyValue, modifiers: Modifiers) {
    match result {
        Decode::Key(key) => {
            assert_eq!(key.value, expected);
            assert_eq!(key.modifiers, modifiers);
        }
        other => panic!("expected Key({:?}, {:?}), got {:?}", expected, modifiers, other),
    }
}

#[test]
fn plain_ascii_byte() {
    let mut dec = decoder();
    dec.push_input(b"h");
    assert_key(dec.getkey(), KeyValue::unicode('h' as u32), Modifiers::NONE);
    assert_eq!(dec.remaining(), 0);
}

#[test]
fn ctrl_a_via_c0_table() {
    let mut dec = decoder();
    dec.push_input(b"\x01");
    match dec.getkey() {
        Decode::Key(key) => {
            // 0x01 has no preset C0 keyname, so it falls through to the Ctrl+@ convention.
            assert_eq!(key.value, KeyValue::unicode('A' as u32));
            assert_eq!(key.modifiers, Modifiers::CTRL);
        }
        other => panic!("expected Key, got {:?}", other),
    }
}

#[test]
fn ctrl_tab_resolves_to_registered_c0_sym() {
    let mut dec = decoder();
    dec.push_input(b"\x09");
    assert_key(dec.getkey(), KeyValue::KeySym(sym::TAB), Modifiers::NONE);
}

#[test]
fn space_and_del_map_to_syms() {
    let mut dec = decoder();
    dec.push_input(b" \x7f");
    assert_key(dec.getkey(), KeyValue::KeySym(sym::SPACE), Modifiers::NONE);
    assert_key(dec.getkey(), KeyValue::KeySym(sym::DEL), Modifiers::NONE);
}

#[test]
fn empty_buffer_is_none_until_closed() {
    let mut dec = decoder();
    assert!(matches!(dec.getkey(), Decode::None));
}

#[test]
fn lone_escape_is_again_before_timeout() {
    let mut dec = decoder();
    dec.push_input(b"\x1b");
    assert!(matches!(dec.getkey(), Decode::Again));
}

#[test]
fn lone_escape_force_resolves_to_escape_key() {
    let mut dec = decoder();
    dec.push_input(b"\x1b");
    assert_key(dec.getkey_force(), KeyValue::KeySym(sym::ESCAPE), Modifiers::NONE);
}

#[test]
fn zero_waittime_resolves_lone_escape_immediately() {
    let mut dec = decoder();
    dec.set_waittime(0);
    dec.push_input(b"\x1b");
    assert_key(dec.getkey(), KeyValue::KeySym(sym::ESCAPE), Modifiers::NONE);
}

#[test]
fn ss3_up_arrow() {
    let mut dec = decoder();
    dec.push_input(b"\x1bOA");
    assert_key(dec.getkey(), KeyValue::KeySym(sym::UP), Modifiers::NONE);
    assert_eq!(dec.remaining(), 0);
}

#[test]
fn ss3_completed_across_two_pushes() {
    let mut dec = decoder();
    dec.push_input(b"\x1bO");
    assert!(matches!(dec.getkey(), Decode::Again));
    dec.push_input(b"C");
    assert_key(dec.getkey(), KeyValue::KeySym(sym::RIGHT), Modifiers::NONE);
}

#[test]
fn csi_delete_key() {
    let mut dec = decoder();
    dec.push_input(b"\x1b[3~");
    assert_key(dec.getkey(), KeyValue::KeySym(sym::DELETE), Modifiers::NONE);
}

#[test]
fn csi_modified_arrow() {
    let mut dec = decoder();
    dec.push_input(b"\x1b[1;5C");
    assert_key(dec.getkey(), KeyValue::KeySym(sym::RIGHT), Modifiers::CTRL);
}

#[test]
fn unrecognized_escape_sequence_yields_standalone_escape_then_reprocesses_rest() {
    let mut dec = decoder();
    dec.push_input(b"\x1b[9z");
    assert_key(dec.getkey(), KeyValue::KeySym(sym::ESCAPE), Modifiers::NONE);
    // The rest ("[9z") is then decoded byte-by-byte as plain ASCII.
    assert_key(dec.getkey(), KeyValue::unicode('[' as u32), Modifiers::NONE);
}

#[test]
fn overlong_encoding_is_replaced() {
    let mut dec = decoder();
    // 0xC0 0x80 is an overlong two-byte encoding of NUL.
    dec.push_input(&[0xc0, 0x80]);
    assert_key(dec.getkey(), KeyValue::unicode_replacement(), Modifiers::NONE);
}

#[test]
fn surrogate_codepoint_is_replaced() {
    let mut dec = decoder();
    // 0xED 0xA0 0x80 decodes to U+D800, a UTF-16 surrogate half with no valid scalar value.
    dec.push_input(&[0xed, 0xa0, 0x80]);
    assert_key(dec.getkey(), KeyValue::unicode_replacement(), Modifiers::NONE);
}

#[test]
fn invalid_first_continuation_byte_resyncs_without_skipping_lead_byte() {
    let mut dec = decoder();
    // 0xe2 starts a 3-byte sequence, but 0x41 ('A') is not a continuation byte. The resync point
    // is the invalid continuation byte itself, so only 0 bytes are eaten alongside the emitted
    // replacement -- the lead byte is still at the head of the buffer afterwards.
    dec.push_input(&[0xe2, 0x41, 0x42]);
    assert_key(dec.getkey(), KeyValue::unicode_replacement(), Modifiers::NONE);
    assert_eq!(dec.remaining(), 3);
}

#[test]
fn invalid_second_continuation_byte_resyncs_at_the_bad_byte() {
    let mut dec = decoder();
    // 0xe2 0x80 is a valid start of a 3-byte sequence, but 0x41 breaks it as the second
    // continuation byte. Only the lead byte (1 byte) is eaten, leaving 0x80 0x41 at the head.
    dec.push_input(&[0xe2, 0x80, 0x41]);
    assert_key(dec.getkey(), KeyValue::unicode_replacement(), Modifiers::NONE);
    assert_eq!(dec.remaining(), 2);
}

#[test]
fn truncated_multibyte_sequence_waits_then_completes() {
    let mut dec = decoder();
    dec.push_input(&[0xe2, 0x82]); // first two bytes of '€' (U+20AC)
    assert!(matches!(dec.getkey(), Decode::Again));
    dec.push_input(&[0xac]);
    assert_key(dec.getkey(), KeyValue::unicode(0x20ac), Modifiers::NONE);
}

#[test]
fn raw_mode_bypasses_interpretation() {
    let _guard = TERM_LOCK.lock().unwrap();
    std::env::set_var("TERM", "xterm");
    let mut dec = Decoder::new_full(-1, Flags::RAW | Flags::NOTERMIOS, 64, 50).unwrap();
    dec.push_input(b"\x09");
    match dec.getkey() {
        Decode::Key(key) => {
            assert_eq!(key.value, KeyValue::raw(0x09));
            assert_eq!(key.modifiers, Modifiers::NONE);
        }
        other => panic!("expected Key, got {:?}", other),
    }
}

#[test]
fn no_interpret_still_applies_ctrl_but_skips_named_syms() {
    let _guard = TERM_LOCK.lock().unwrap();
    std::env::set_var("TERM", "xterm");
    let mut dec = Decoder::new_full(-1, Flags::UTF8 | Flags::NOINTERPRET | Flags::NOTERMIOS, 64, 50).unwrap();
    dec.push_input(b"\x09"); // Tab, normally sym::TAB
    assert_key(dec.getkey(), KeyValue::unicode('I' as u32), Modifiers::CTRL);
}

#[test]
fn pushed_input_after_eof_read_is_not_lost() {
    let mut dec = decoder();
    dec.push_input(b"ab");
    assert_key(dec.getkey(), KeyValue::unicode('a' as u32), Modifiers::NONE);
    assert_eq!(dec.remaining(), 1);
    assert_key(dec.getkey(), KeyValue::unicode('b' as u32), Modifiers::NONE);
    assert!(matches!(dec.getkey(), Decode::None));
}

#[test]
fn dumb_terminal_falls_back_to_terminfo_driver_or_fails_gracefully() {
    let _guard = TERM_LOCK.lock().unwrap();
    std::env::set_var("TERM", "dumb");
    // `dumb` has no terminfo key capabilities either, so construction is expected to fail; this
    // documents that behaviour rather than asserting a specific driver won.
    let result = Decoder::new_full(-1, Flags::UTF8 | Flags::NOTERMIOS, 64, 50);
    assert!(result.is_err());
    std::env::set_var("TERM", "xterm");
}
