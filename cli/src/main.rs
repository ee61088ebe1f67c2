mod commands;
mod server;
mod terminal;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use commands::CommandLine;
use presence_common::network::interface;
use presence_common::system::SystemRepository;
use presence_core::discovery::DiscoveryService;
use presence_core::engine::TickerEngine;
use presence_core::scanner::ArpScanner;
use presence_core::system::SystemRepo;
use presence_core::vendors::MacOuiRepo;
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let commands = CommandLine::parse_args();
    logging::init_logging(commands.verbose, commands.quiet);

    let interface = match commands.interface.clone() {
        Some(name) => name,
        None => {
            let selected = interface::default_lan_interface(SystemRepo.get_network_interfaces())?;
            info!(interface = %selected.name, "no interface configured, using best LAN interface");
            selected.name
        }
    };

    let scanner = DiscoveryService::new(
        Box::new(MacOuiRepo),
        Box::new(ArpScanner::new(commands.arp_scan.clone()).with_sudo(commands.sudo)),
    );
    let engine = Arc::new(TickerEngine::new(
        commands.engine_options(interface),
        Arc::new(scanner),
        Arc::new(SystemRepo),
    )?);

    let addr = SocketAddr::from(([0, 0, 0, 0], commands.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let server = tokio::spawn(server::serve(listener, Arc::clone(&engine)));

    if let Err(e) = engine.start().await {
        let _ = server.await;
        return Err(e).context("presence engine failed to start");
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
            engine.stop();
        }
        _ = engine.wait_failed() => {
            error!("presence engine failed, closing all connections");
        }
    }

    engine.join().await;
    server.await??;
    Ok(())
}
