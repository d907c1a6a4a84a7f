use ceckey::bindings::{BindingSource, BindingTable};
use itertools::Itertools;

pub mod bindings;
pub mod list;
pub mod run;

/// Build the bindings selected on the command line, or exit
pub fn binding_table(args: &crate::BindingArgs) -> BindingTable {
    let source = if let Some(keymap) = &args.keymap {
        BindingSource::Keymap(keymap.clone())
    } else {
        match args.keys {
            crate::Keys::Default => BindingSource::Default,
            crate::Keys::Retropie => BindingSource::Retropie(args.retroarch_config.clone()),
        }
    };

    match source.build() {
        Ok(table) => {
            log::debug!(
                "{} bindings for: {}",
                table.len(),
                table.recognized_codes().iter().join(", ")
            );
            table
        }
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    }
}
