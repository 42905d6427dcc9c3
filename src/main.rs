//! confluence-gateway - Multi-tenant JSON-RPC gateway for Confluence
//!
//! This is the main entry point for the server binary.

use std::process;

use confluence_gateway::cli::{BehaviorOptions, Cli};
use confluence_gateway::rpc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[tokio::main]
async fn main() {
  let cli = Cli::parse_args();

  init_tracing(&cli.behavior);

  // Validate CLI arguments
  if let Err(e) = cli.validate() {
    eprintln!("Error: {e}");
    process::exit(4); // Invalid arguments exit code
  }

  if let Err(e) = rpc::server::serve(cli.gateway_config(), cli.server.bind).await {
    eprintln!("Error: {e:#}");
    process::exit(1);
  }
}

fn init_tracing(behavior: &BehaviorOptions) {
  let level = if behavior.quiet {
    LevelFilter::ERROR
  } else {
    match behavior.verbose {
      0 => LevelFilter::WARN,
      1 => LevelFilter::INFO,
      2 => LevelFilter::DEBUG,
      _ => LevelFilter::TRACE,
    }
  };

  let env_filter = EnvFilter::builder()
    .with_default_directive(level.into())
    .from_env_lossy();

  let _ = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .try_init();
}
