use qubes_log::context::LoggingContext;
use qubes_log::sink::WriterSink;
use tracing::{debug, error, info, instrument, warn};

#[instrument]
fn start_domain(name: &str) {
    debug!(target: "vm1", "allocating memory");
    info!(target: "vm1", "starting {}", name);
}

fn main() {
    let context = LoggingContext::new();
    context.enable();
    context.install().expect("no other subscriber installed");

    start_domain("vm1");
    warn!(target: "vm1", "qrexec agent slow to respond");

    if std::env::args().any(|arg| arg == "--debug") {
        context.enable_debug();
        start_domain("vm1");
    }

    if let Ok(path) = std::env::var("QUBES_LOG_FILE") {
        context.add_sink(WriterSink::file(path).expect("open log file"));
    }
    error!(target: "vm1", "domain crashed");
    context.flush();
}
