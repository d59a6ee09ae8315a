//! `bld-remote-mcp` - MCP stdio gateway for the BLD Remote bridge.
//!
//! Exit codes:
//! - 0: clean shutdown (EOF on stdin)
//! - 1: broker unreachable at startup with `--require-broker`
//! - 2: MCP transport error

use bld_remote_logging::{init_logging, LogConfig};
use bld_remote_mcp::{BrokerClient, GatewayConfig, McpServer};
use bld_remote_protocol::config::PORT_ENV;
use bld_remote_protocol::defaults;
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "bld-remote-mcp",
    about = "MCP stdio gateway for driving a 3D application through its remote-control bridge"
)]
struct Cli {
    /// Broker host (the bridge binds loopback only)
    #[arg(long, default_value = defaults::BIND_HOST)]
    host: String,

    /// Broker TCP port
    #[arg(long, env = PORT_ENV, default_value_t = defaults::DEFAULT_PORT)]
    port: u16,

    /// Probe the broker at startup and fail fast when it is unreachable
    #[arg(long)]
    require_broker: bool,

    /// Log level (DEBUG, INFO, WARNING, ERROR, CRITICAL); overrides
    /// BLD_REMOTE_LOG_LEVEL
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(LogConfig {
        app_name: "bld-remote-mcp",
        level_override: cli.log_level.as_deref(),
    }) {
        eprintln!("failed to initialize logging: {e:#}");
        // Logging is not worth refusing to serve over.
    }

    let config = GatewayConfig::for_broker(cli.host.clone(), cli.port);

    if cli.require_broker {
        let client = BrokerClient::from_config(&config);
        match client.probe() {
            Ok(latency) => {
                info!(latency_ms = latency.as_secs_f64() * 1000.0, "broker reachable");
            }
            Err(e) => {
                error!("broker probe failed: {e}");
                eprintln!("bld-remote-mcp: {e}");
                return ExitCode::from(1);
            }
        }
    }

    let mut server = McpServer::new(config);
    match server.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("MCP transport error: {e:#}");
            eprintln!("bld-remote-mcp: transport error: {e:#}");
            ExitCode::from(2)
        }
    }
}
