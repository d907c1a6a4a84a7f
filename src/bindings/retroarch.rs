//! Derive bindings from the player 1 keyboard configuration in a RetroArch
//! config file, so the remote drives EmulationStation and RetroArch the same
//! way the keyboard does.

use super::{key_from_symbol, BindingEntry, BindingTable};
use crate::{cec::UserControlCode, Error};
use regex::Regex;
use std::{fs, io::ErrorKind, path::Path, sync::OnceLock};

/// RetroArch joypad button and the remote button standing in for it
const BUTTONS: &[(&str, UserControlCode, bool)] = &[
    ("up", UserControlCode::UP, true),
    ("down", UserControlCode::DOWN, true),
    ("left", UserControlCode::LEFT, true),
    ("right", UserControlCode::RIGHT, true),
    ("a", UserControlCode::SELECT, false),
    ("b", UserControlCode::EXIT, false),
    ("x", UserControlCode::F2_RED, false),
    ("y", UserControlCode::F3_GREEN, false),
    ("select", UserControlCode::F4_YELLOW, false),
    ("start", UserControlCode::F1_BLUE, false),
    ("l", UserControlCode::CHANNEL_DOWN, false),
    ("r", UserControlCode::CHANNEL_UP, false),
];

static INPUT_LINE: OnceLock<Regex> = OnceLock::new();

pub(super) fn parse(path: &Path) -> Result<BindingTable, Error> {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::ConfigNotFound(path.to_path_buf()))
        }
        Err(source) => {
            return Err(Error::ConfigRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let table = parse_text(&String::from_utf8_lossy(&contents));

    if table.is_empty() {
        log::warn!("{}: no player 1 keyboard bindings found", path.display());
    }

    Ok(table)
}

/// Lines which do not bind a known button to a known key are skipped; the
/// file has plenty of unrelated settings. The last binding for a button wins.
pub(super) fn parse_text(contents: &str) -> BindingTable {
    let re = INPUT_LINE.get_or_init(|| {
        Regex::new(r#"^\s*input_player1_(\w+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("input line regex should compile")
    });

    let mut entries = Vec::new();

    for (line_no, line) in contents.lines().enumerate() {
        let Some(caps) = re.captures(line) else {
            continue;
        };

        let button = &caps[1];
        let symbol = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());

        let Some((_, code, repeatable)) = BUTTONS.iter().find(|(name, ..)| *name == button) else {
            log::debug!("line {}: input_player1_{button}: not a remote button", line_no + 1);
            continue;
        };

        let Some(key) = key_from_symbol(symbol) else {
            log::debug!("line {}: input_player1_{button}: unknown key '{symbol}'", line_no + 1);
            continue;
        };

        log::trace!("{code} bound to {symbol}");

        entries.push((*code, BindingEntry::new(key, *repeatable)));
    }

    BindingTable::from_iter(entries)
}
