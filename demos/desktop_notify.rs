use qubes_log::init::{init_logging_with_config, LoggingConfig};
use tracing::{error, info, warn};

fn main() {
    let config = LoggingConfig { debug: true, ..LoggingConfig::from_env() };
    let _context = init_logging_with_config(&config).expect("init logging");

    info!(target: "vm1", "this stays on the console");
    warn!(target: "vm1", "low memory");
    error!(target: "vm1", "disk full");
}
