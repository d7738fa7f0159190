use pi2cslave_bsc::{SlaveConfig, SocModel};
use pi2cslave_common::CancelToken;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let address = match args.next() {
        Some(text) => match pi2cslave::parse_address(&text) {
            Ok(address) => address,
            Err(e) => {
                eprintln!("{:#}", e);
                std::process::exit(1);
            }
        },
        None => pi2cslave::DEFAULT_ADDRESS,
    };
    let soc = match args.next() {
        Some(name) => match SocModel::from_name(&name) {
            Some(soc) => soc,
            None => {
                eprintln!(
                    "Unknown SoC '{}'. Supported: bcm2835, bcm2837, bcm2711",
                    name
                );
                std::process::exit(1);
            }
        },
        None => SocModel::default(),
    };

    let config = SlaveConfig::builder().address(address).soc(soc).build();
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        std::thread::spawn(move || pi2cslave::stop_on_enter(std::io::stdin().lock(), &cancel));
    }

    println!("Serving I2C address {:#04x} on {:?}, press Enter to stop", address, soc);
    let worker = {
        let cancel = cancel.clone();
        std::thread::spawn(move || pi2cslave::run(&config, &cancel))
    };

    match worker.join() {
        Ok(Ok(())) => log::info!("stopped"),
        Ok(Err(e)) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
        Err(_) => {
            eprintln!("responder thread panicked");
            std::process::exit(1);
        }
    }
}
