//! Map CEC user control codes to keyboard keys

use crate::{cec::UserControlCode, Error};
use evdev::KeyCode;
use itertools::Itertools;
use std::{
    collections::{BTreeSet, HashMap, HashSet},
    path::PathBuf,
};

mod keymap;
mod keys;
mod retroarch;

pub use keys::{key_from_symbol, key_symbol};

/// What a bound button does
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BindingEntry {
    pub key: KeyCode,
    /// Held buttons produce a click for every sample, rather than only the first
    pub repeatable: bool,
}

impl BindingEntry {
    pub fn new(key: KeyCode, repeatable: bool) -> Self {
        BindingEntry { key, repeatable }
    }
}

/// Immutable mapping from CEC codes to keys, built once at startup
#[derive(Clone, PartialEq, Debug, Default)]
pub struct BindingTable {
    entries: HashMap<UserControlCode, BindingEntry>,
}

impl BindingTable {
    pub fn resolve(&self, code: UserControlCode) -> Option<BindingEntry> {
        self.entries.get(&code).copied()
    }

    /// All codes which have a binding
    pub fn recognized_codes(&self) -> BTreeSet<UserControlCode> {
        self.entries.keys().copied().collect()
    }

    /// The distinct keys the bindings produce. The output device must be
    /// created with exactly this set.
    pub fn output_keys(&self) -> HashSet<KeyCode> {
        self.entries.values().map(|entry| entry.key).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bindings ordered by code
    pub fn iter(&self) -> impl Iterator<Item = (UserControlCode, BindingEntry)> + '_ {
        self.entries
            .iter()
            .map(|(code, entry)| (*code, *entry))
            .sorted_by_key(|(code, _)| *code)
    }
}

impl FromIterator<(UserControlCode, BindingEntry)> for BindingTable {
    /// Later entries for the same code replace earlier ones
    fn from_iter<T: IntoIterator<Item = (UserControlCode, BindingEntry)>>(iter: T) -> Self {
        BindingTable {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Where the bindings come from
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum BindingSource {
    /// Built-in navigation keys
    Default,
    /// Player 1 keyboard bindings from a RetroArch configuration file
    Retropie(PathBuf),
    /// A toml keymap
    Keymap(PathBuf),
}

impl BindingSource {
    pub fn build(&self) -> Result<BindingTable, Error> {
        match self {
            BindingSource::Default => Ok(default_bindings()),
            BindingSource::Retropie(path) => retroarch::parse(path),
            BindingSource::Keymap(path) => keymap::parse(path),
        }
    }
}

/// Select, back and the four directions. The directions repeat while held.
pub fn default_bindings() -> BindingTable {
    BindingTable::from_iter([
        (
            UserControlCode::SELECT,
            BindingEntry::new(KeyCode::KEY_ENTER, false),
        ),
        (
            UserControlCode::EXIT,
            BindingEntry::new(KeyCode::KEY_ESC, false),
        ),
        (UserControlCode::UP, BindingEntry::new(KeyCode::KEY_UP, true)),
        (
            UserControlCode::DOWN,
            BindingEntry::new(KeyCode::KEY_DOWN, true),
        ),
        (
            UserControlCode::LEFT,
            BindingEntry::new(KeyCode::KEY_LEFT, true),
        ),
        (
            UserControlCode::RIGHT,
            BindingEntry::new(KeyCode::KEY_RIGHT, true),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table() {
        let table = default_bindings();

        assert_eq!(table.len(), 6);
        assert_eq!(
            table.resolve(UserControlCode::UP),
            Some(BindingEntry::new(KeyCode::KEY_UP, true))
        );
        assert_eq!(
            table.resolve(UserControlCode::SELECT),
            Some(BindingEntry::new(KeyCode::KEY_ENTER, false))
        );
        assert_eq!(table.resolve(UserControlCode::PLAY), None);
        assert_eq!(table.resolve(UserControlCode::UNKNOWN), None);

        assert_eq!(
            table.output_keys(),
            HashSet::from([
                KeyCode::KEY_ENTER,
                KeyCode::KEY_ESC,
                KeyCode::KEY_UP,
                KeyCode::KEY_DOWN,
                KeyCode::KEY_LEFT,
                KeyCode::KEY_RIGHT
            ])
        );

        let codes: Vec<_> = table.recognized_codes().into_iter().collect();
        assert_eq!(
            codes,
            [
                UserControlCode::SELECT,
                UserControlCode::UP,
                UserControlCode::DOWN,
                UserControlCode::LEFT,
                UserControlCode::RIGHT,
                UserControlCode::EXIT
            ]
        );
    }

    #[test]
    fn output_keys_follow_overwrites() {
        let table = BindingTable::from_iter([
            (
                UserControlCode::SELECT,
                BindingEntry::new(KeyCode::KEY_A, false),
            ),
            (
                UserControlCode::SELECT,
                BindingEntry::new(KeyCode::KEY_B, false),
            ),
        ]);

        assert_eq!(table.output_keys(), HashSet::from([KeyCode::KEY_B]));
    }
}
