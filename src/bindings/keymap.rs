//! Parse toml keymaps. A keymap is a list of bindings:
//!
//! ```toml
//! [[bindings]]
//! code = "play"
//! key = "space"
//!
//! [[bindings]]
//! code = 0x4b
//! key = "right"
//! repeat = true
//! ```

use super::{key_from_symbol, BindingEntry, BindingTable};
use crate::{cec::UserControlCode, Error};
use std::{fs, io::ErrorKind, path::Path};
use toml::{Table, Value};

pub(super) fn parse(path: &Path) -> Result<BindingTable, Error> {
    let contents = match fs::read_to_string(path) {
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

    parse_toml(&contents).map_err(|message| Error::Keymap {
        path: path.to_path_buf(),
        message,
    })
}

fn parse_toml(contents: &str) -> Result<BindingTable, String> {
    let top = contents.parse::<Table>().map_err(|e| e.message().to_owned())?;

    let Some(Value::Array(bindings)) = top.get("bindings") else {
        return Err("missing top level bindings array".into());
    };

    let mut entries = Vec::new();

    for (index, binding) in bindings.iter().enumerate() {
        // counted from 1, like the [[bindings]] tables in the file
        let no = index + 1;

        let code = match binding.get("code") {
            Some(Value::String(name)) => UserControlCode::from_name(name)
                .ok_or_else(|| format!("binding {no}: unknown code '{name}'"))?,
            Some(Value::Integer(n)) => {
                let Ok(n) = u8::try_from(*n) else {
                    return Err(format!("binding {no}: code {n} must be 8 bit value"));
                };

                UserControlCode(n)
            }
            _ => return Err(format!("binding {no}: missing code")),
        };

        let Some(Value::String(symbol)) = binding.get("key") else {
            return Err(format!("binding {no}: missing key"));
        };

        let Some(key) = key_from_symbol(symbol) else {
            return Err(format!("binding {no}: unknown key '{symbol}'"));
        };

        let repeatable = match binding.get("repeat") {
            None => false,
            Some(Value::Boolean(repeat)) => *repeat,
            Some(_) => return Err(format!("binding {no}: repeat must be true or false")),
        };

        entries.push((code, BindingEntry::new(key, repeatable)));
    }

    Ok(BindingTable::from_iter(entries))
}
