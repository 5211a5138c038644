//! Dense keysym-id -> name table, plus the 32-entry C0 control-byte table that maps a raw
//! control byte to an (optional) keysym and the modifiers it implies.

use crate::key::{sym, Modifiers};

/// Pre-registered names, in the order `Registry::new` assigns ids `sym::BACKSPACE..=sym::KPEQUALS`.
/// `sym::NONE` (id 0) is handled separately below since it's reserved, not auto-allocated.
const PRESET_KEYNAMES: &[(u32, &str)] = &[
    (sym::BACKSPACE, "Backspace"),
    (sym::TAB, "Tab"),
    (sym::ENTER, "Enter"),
    (sym::ESCAPE, "Escape"),
    (sym::SPACE, "Space"),
    (sym::DEL, "DEL"),
    (sym::UP, "Up"),
    (sym::DOWN, "Down"),
    (sym::LEFT, "Left"),
    (sym::RIGHT, "Right"),
    (sym::BEGIN, "Begin"),
    (sym::FIND, "Find"),
    (sym::INSERT, "Insert"),
    (sym::DELETE, "Delete"),
    (sym::SELECT, "Select"),
    (sym::PAGEUP, "PageUp"),
    (sym::PAGEDOWN, "PageDown"),
    (sym::HOME, "Home"),
    (sym::END, "End"),
    (sym::KP0, "KP0"),
    (sym::KP1, "KP1"),
    (sym::KP2, "KP2"),
    (sym::KP3, "KP3"),
    (sym::KP4, "KP4"),
    (sym::KP5, "KP5"),
    (sym::KP6, "KP6"),
    (sym::KP7, "KP7"),
    (sym::KP8, "KP8"),
    (sym::KP9, "KP9"),
    (sym::KPENTER, "KPEnter"),
    (sym::KPPLUS, "KPPlus"),
    (sym::KPMINUS, "KPMinus"),
    (sym::KPMULT, "KPMult"),
    (sym::KPDIV, "KPDiv"),
    (sym::KPCOMMA, "KPComma"),
    (sym::KPPERIOD, "KPPeriod"),
    (sym::KPEQUALS, "KPEquals"),
];

const INITIAL_KEYNAMES_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct C0Entry {
    pub(crate) sym: u32,
    pub(crate) modifier_set: Modifiers,
    #[allow(dead_code)] // carried for parity with the reference's per-control modifier mask
    pub(crate) modifier_mask: Modifiers,
}

pub(crate) struct Registry {
    keynames: Vec<Option<String>>,
    c0: [C0Entry; 32],
}

impl Registry {
    pub(crate) fn new() -> Registry {
        let mut reg = Registry {
            keynames: vec![None; INITIAL_KEYNAMES_CAPACITY],
            c0: [C0Entry::default(); 32],
        };

        // sym::NONE is reserved: name it directly rather than through `register_keyname`, whose
        // "sym == 0 means auto-allocate" rule would otherwise steal a fresh id for it.
        reg.keynames[sym::NONE as usize] = Some("NONE".to_string());

        for &(s, name) in PRESET_KEYNAMES {
            reg.register_keyname(s, name);
        }

        reg.register_c0(sym::BACKSPACE, 0x08, None);
        reg.register_c0(sym::TAB, 0x09, None);
        reg.register_c0(sym::ENTER, 0x0d, None);
        reg.register_c0(sym::ESCAPE, 0x1b, None);

        reg
    }

    /// If `sym == 0`, allocates a fresh id (current table length). Otherwise grows the table to
    /// fit `sym` (filling the gap with "no name") and (re)assigns that slot. Returns the id used.
    pub(crate) fn register_keyname(&mut self, sym: u32, name: &str) -> u32 {
        let sym = if sym == 0 {
            self.keynames.len() as u32
        } else {
            sym
        };

        if sym as usize >= self.keynames.len() {
            self.keynames.resize(sym as usize + 1, None);
        }

        self.keynames[sym as usize] = Some(name.to_string());
        sym
    }

    pub(crate) fn get_keyname(&self, sym: u32) -> &str {
        if sym == crate::key::sym::UNKNOWN {
            return "UNKNOWN";
        }
        self.keynames
            .get(sym as usize)
            .and_then(|s| s.as_deref())
            .unwrap_or("UNKNOWN")
    }

    /// Plain C0 registration (no implied modifiers beyond Ctrl, which the emitter always adds).
    pub(crate) fn register_c0(&mut self, sym: u32, ctrl: u8, name: Option<&str>) -> Option<u32> {
        self.register_c0_full(sym, Modifiers::NONE, Modifiers::NONE, ctrl, name)
    }

    pub(crate) fn register_c0_full(
        &mut self,
        mut sym: u32,
        modifier_set: Modifiers,
        modifier_mask: Modifiers,
        ctrl: u8,
        name: Option<&str>,
    ) -> Option<u32> {
        if ctrl >= 0x20 {
            error!("cannot register C0 key at ctrl {:#04x} - out of bounds", ctrl);
            return None;
        }

        if let Some(name) = name {
            sym = self.register_keyname(sym, name);
        }

        self.c0[ctrl as usize] = C0Entry {
            sym,
            modifier_set,
            modifier_mask,
        };

        Some(sym)
    }

    pub(crate) fn c0(&self, ctrl: u8) -> C0Entry {
        self.c0[ctrl as usize]
    }
}
