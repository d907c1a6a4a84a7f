use ceckey::cec::{CecBus, KernelCec};

pub fn list() {
    let list = match KernelCec.discover() {
        Ok(list) => list,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };

    if list.is_empty() {
        log::info!("no CEC adapters found");
    }

    for adapter in list {
        println!("{}:", adapter.name);
        println!("\tDevice\t\t: {}", adapter.path.display());
        if !adapter.driver.is_empty() {
            println!("\tDriver\t\t: {}", adapter.driver);
        }
    }
}
