use ceckey::bindings::key_symbol;

pub fn bindings(args: &crate::Bindings) {
    let table = super::binding_table(&args.bindings);

    for (code, entry) in table.iter() {
        let key = match key_symbol(entry.key) {
            Some(symbol) => symbol.to_owned(),
            None => format!("keycode {}", entry.key.code()),
        };

        if entry.repeatable {
            println!("{code}: {key}, repeat");
        } else {
            println!("{code}: {key}");
        }
    }
}
