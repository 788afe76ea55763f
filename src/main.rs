use anyhow::Context;
use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::info;

use component_language_server::config::{Args, ServerConfig};
use component_language_server::logging::init_logger;
use component_language_server::lsp::ComponentBackend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = init_logger(args.no_color, args.log_level.as_deref(), !args.no_log_file)
        .context("failed to initialize logging")?;

    let config = ServerConfig::from_args(&args);
    info!(
        "Starting {} {} (registry ttl {:?}, scope markers {:?})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.registry.ttl,
        config.registry.scope_markers
    );

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    let (service, socket) = LspService::new(move |client| ComponentBackend::new(client, config));
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("Server stopped");
    Ok(())
}
