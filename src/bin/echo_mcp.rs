use anyhow::{Result, anyhow};
use bio_mcp::{about, echo_server::EchoServer, logging, mcp_server::run_stdio_server};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "echo_mcp",
    about = "Starts an MCP stdio server with a single echo tool",
    disable_version_flag = true
)]
struct Cli {
    /// Print version information
    #[arg(short = 'V', long)]
    version: bool,
}

fn main() -> Result<()> {
    if Cli::parse().version {
        println!("{}", about::version_cli_text("Echo MCP"));
        return Ok(());
    }
    logging::init();
    tracing::info!("Starting Echo MCP {}", about::BIO_MCP_DISPLAY_VERSION);
    run_stdio_server(&EchoServer).map_err(|e| anyhow!(e))
}
