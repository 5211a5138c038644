//! Falls back to whatever escape strings the terminal capability database reports for `$TERM`,
//! for terminals the CSI driver declines (only `TERM=dumb` today). Builds a "bindings + prefix
//! set" table at construction time, the same shape `rustyline`'s Unix TTY reader uses for its own
//! escape-sequence recognizer (`EscapeBindings`): only the terminfo database lookup itself is
//! delegated to the `terminfo` crate, the recognizer here is a real implementation.

use std::collections::{HashMap, HashSet};

use terminfo::{capability as cap, Database};

use crate::driver::DriverMatch;
use crate::key::{sym, Key, KeyValue, Modifiers};
use crate::registry::Registry;

pub(crate) struct TerminfoDriver {
    bindings: HashMap<Vec<u8>, KeyValue>,
    prefixes: HashSet<Vec<u8>>,
}

impl TerminfoDriver {
    pub(crate) fn new_driver(term: Option<&str>) -> Option<TerminfoDriver> {
        let db = match term {
            Some(name) => Database::from_name(name).ok()?,
            None => Database::from_env().ok()?,
        };

        let mut driver = TerminfoDriver {
            bindings: HashMap::new(),
            prefixes: HashSet::new(),
        };

        driver.bind_from(&db);

        if driver.bindings.is_empty() {
            debug!("terminfo database for {:?} defines none of the capabilities we look for", term);
            return None;
        }

        Some(driver)
    }

    fn bind_from(&mut self, db: &Database) {
        macro_rules! bind_cap {
            ($cap:ty, $value:expr) => {
                if let Some(seq) = db.get::<$cap>() {
                    self.bind(seq.as_ref().to_vec(), $value);
                }
            };
        }

        bind_cap!(cap::KeyUp, KeyValue::KeySym(sym::UP));
        bind_cap!(cap::KeyDown, KeyValue::KeySym(sym::DOWN));
        bind_cap!(cap::KeyLeft, KeyValue::KeySym(sym::LEFT));
        bind_cap!(cap::KeyRight, KeyValue::KeySym(sym::RIGHT));
        bind_cap!(cap::KeyHome, KeyValue::KeySym(sym::HOME));
        bind_cap!(cap::KeyEnd, KeyValue::KeySym(sym::END));
        bind_cap!(cap::KeyIC, KeyValue::KeySym(sym::INSERT));
        bind_cap!(cap::KeyDC, KeyValue::KeySym(sym::DELETE));
        bind_cap!(cap::KeyPPage, KeyValue::KeySym(sym::PAGEUP));
        bind_cap!(cap::KeyNPage, KeyValue::KeySym(sym::PAGEDOWN));
        bind_cap!(cap::KeyBackspace, KeyValue::KeySym(sym::BACKSPACE));
        // vt100 keypad corners
        bind_cap!(cap::KeyA1, KeyValue::KeySym(sym::HOME));
        bind_cap!(cap::KeyA3, KeyValue::KeySym(sym::PAGEUP));
        bind_cap!(cap::KeyB2, KeyValue::KeySym(sym::BEGIN));
        bind_cap!(cap::KeyC1, KeyValue::KeySym(sym::END));
        bind_cap!(cap::KeyC3, KeyValue::KeySym(sym::PAGEDOWN));

        bind_cap!(cap::KeyF1, KeyValue::Function(1));
        bind_cap!(cap::KeyF2, KeyValue::Function(2));
        bind_cap!(cap::KeyF3, KeyValue::Function(3));
        bind_cap!(cap::KeyF4, KeyValue::Function(4));
        bind_cap!(cap::KeyF5, KeyValue::Function(5));
        bind_cap!(cap::KeyF6, KeyValue::Function(6));
        bind_cap!(cap::KeyF7, KeyValue::Function(7));
        bind_cap!(cap::KeyF8, KeyValue::Function(8));
        bind_cap!(cap::KeyF9, KeyValue::Function(9));
        bind_cap!(cap::KeyF10, KeyValue::Function(10));
        bind_cap!(cap::KeyF11, KeyValue::Function(11));
        bind_cap!(cap::KeyF12, KeyValue::Function(12));
        bind_cap!(cap::KeyF13, KeyValue::Function(13));
        bind_cap!(cap::KeyF14, KeyValue::Function(14));
        bind_cap!(cap::KeyF15, KeyValue::Function(15));
        bind_cap!(cap::KeyF16, KeyValue::Function(16));
        bind_cap!(cap::KeyF17, KeyValue::Function(17));
        bind_cap!(cap::KeyF18, KeyValue::Function(18));
        bind_cap!(cap::KeyF19, KeyValue::Function(19));
        bind_cap!(cap::KeyF20, KeyValue::Function(20));
    }

    /// Inserts `seq -> value`, and every proper non-empty prefix of `seq` into the prefix set so
    /// `try_match` can tell "incomplete, could still match" from "no such binding, ever" without
    /// a trie.
    fn bind(&mut self, seq: Vec<u8>, value: KeyValue) {
        if seq.is_empty() || seq[0] != 0x1b {
            // We only use this table once the orchestrator has already confirmed a leading ESC;
            // capabilities that don't start with one can't be reached through this driver.
            return;
        }

        for i in 1..seq.len() {
            self.prefixes.insert(seq[..i].to_vec());
        }

        self.bindings.insert(seq, value);
    }

    pub(crate) fn try_match(&self, buf: &[u8], _registry: &Registry) -> DriverMatch {
        // Longest-match-first: a capability string is never a prefix of another bound to a
        // different key in practice, but scanning from the longest candidate down keeps this
        // driver correct even if the database ever defines both.
        for len in (1..=buf.len()).rev() {
            if let Some(value) = self.bindings.get(&buf[..len]) {
                return DriverMatch::Key {
                    key: Key::new(*value, Modifiers::NONE),
                    consumed: len,
                };
            }
        }

        if self.prefixes.contains(buf) {
            DriverMatch::Again
        } else {
            DriverMatch::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_and_lookup() {
        let mut driver = TerminfoDriver {
            bindings: HashMap::new(),
            prefixes: HashSet::new(),
        };
        driver.bind(b"\x1bOA".to_vec(), KeyValue::KeySym(sym::UP));

        let registry = Registry::new();
        match driver.try_match(b"\x1bOA", &registry) {
            DriverMatch::Key { key, consumed } => {
                assert_eq!(key.value, KeyValue::KeySym(sym::UP));
                assert_eq!(consumed, 3);
            }
            _ => panic!("expected Key"),
        }

        assert!(matches!(driver.try_match(b"\x1bO", &registry), DriverMatch::Again));
        assert!(matches!(driver.try_match(b"\x1bZ", &registry), DriverMatch::None));
    }
}
