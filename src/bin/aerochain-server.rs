#![forbid(unsafe_code)]
//! HTTP API server for the maintenance ledger

use aerochain::api::{run_api_server, Node};
use aerochain::cli::{init_tracing, open_ledger_from_config};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let (config, ledger) = open_ledger_from_config()?;
    tracing::info!(
        backend = ?config.storage.backend,
        port = config.api.port,
        "Starting AeroChain API server"
    );

    let node = Arc::new(Node::new(ledger));
    run_api_server(node, config.api.port).await
}
