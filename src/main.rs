use std::sync::Arc;

use clap::Parser;
use tokio::sync::Notify;

use rangehttpd::config::{AppState, CliArgs, Config};
use rangehttpd::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliArgs::parse();
    let cfg = Config::load(&cli)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;
    let state = Arc::new(AppState::new(cfg)?);

    let shutdown = Arc::new(Notify::new());
    server::signal::start_signal_handler(Arc::clone(&shutdown));

    logger::log_server_start(&addr, &state.root, &state.config);

    server::run_server_loop(listener, state, shutdown).await?;

    logger::log_server_stop();
    Ok(())
}
