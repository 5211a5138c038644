//! Renders a decoded `Key` to a human-readable string. Deliberately outside the decode path
//! (`Decoder::getkey` never calls into this module) -- the same separation `termbox_simple` draws
//! between terminal-state management and cell-buffer/rendering concerns.

use crate::key::{Key, KeyValue, Modifiers};
use crate::registry::Registry;

/// Rendering options for `format_key`. A plain bitset, matching `Modifiers`' own style rather
/// than pulling in a flags crate for four bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Format(u8);

impl Format {
    pub const PLAIN: Format = Format(0);
    /// Spell out "Shift-"/"Ctrl-"/"Alt-"/"Meta-" instead of "S-"/"C-"/"A-"/"M-".
    pub const LONG_MOD: Format = Format(1);
    /// Render `Ctrl-@`..`Ctrl-_` as `^X`.
    pub const CARET_CTRL: Format = Format(2);
    /// Use "M-"/"Meta-" instead of "A-"/"Alt-" for the Alt modifier.
    pub const ALT_IS_META: Format = Format(4);
    /// Wrap non-Unicode or modified keys in `<...>`.
    pub const WRAP_BRACKET: Format = Format(8);

    pub fn contains(self, other: Format) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Format {
    type Output = Format;
    fn bitor(self, rhs: Format) -> Format {
        Format(self.0 | rhs.0)
    }
}

/// Rendering order: `[wrap<] [^] [Alt|Meta] [Ctrl] [Shift] body [wrap>]`. `^`-rendering is
/// mutually exclusive with spelling out the Ctrl modifier prefix, mirroring the reference's
/// `goto do_codepoint` short-circuit once the caret form applies.
pub(crate) fn format_key(key: &Key, registry: &Registry, format: Format) -> String {
    let mut out = String::new();

    let wrap = format.contains(Format::WRAP_BRACKET)
        && (!matches!(key.value, KeyValue::Unicode { .. }) || !key.modifiers.is_empty());

    if wrap {
        out.push('<');
    }

    let caret = format.contains(Format::CARET_CTRL)
        && key.modifiers == Modifiers::CTRL
        && matches!(key.value, KeyValue::Unicode { codepoint, .. } if (b'@' as u32..=b'_' as u32).contains(&codepoint));

    if caret {
        out.push('^');
    } else {
        let long_mod = format.contains(Format::LONG_MOD);

        if key.modifiers.contains(Modifiers::ALT) {
            let alt_is_meta = format.contains(Format::ALT_IS_META);
            out.push_str(match (long_mod, alt_is_meta) {
                (true, true) => "Meta-",
                (true, false) => "Alt-",
                (false, true) => "M-",
                (false, false) => "A-",
            });
        }
        if key.modifiers.contains(Modifiers::CTRL) {
            out.push_str(if long_mod { "Ctrl-" } else { "C-" });
        }
        if key.modifiers.contains(Modifiers::SHIFT) {
            out.push_str(if long_mod { "Shift-" } else { "S-" });
        }
    }

    match key.value {
        KeyValue::Unicode { utf8, .. } => out.push_str(utf8.as_str()),
        KeyValue::KeySym(sym) => out.push_str(registry.get_keyname(sym)),
        KeyValue::Function(n) => out.push_str(&format!("F{}", n)),
    }

    if wrap {
        out.push('>');
    }

    out
}
