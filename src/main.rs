use cookiejar::config::Config;
use cookiejar::server;

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    if let Err(e) = start() {
        tracing::error!("Fatal: {:#}", e);
        std::process::exit(1);
    }
}

fn start() -> anyhow::Result<()> {
    let cfg = Config::load()?;
    server::listener::run(&cfg)
}
