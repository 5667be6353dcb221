//! MCP stdio server for local BLAST+ and queued BLAST jobs.

use anyhow::{Context, Result, anyhow};
use bio_mcp::{
    about,
    blast::BlastRunner,
    blast_server::{BlastMode, BlastServer, SERVER_TITLE},
    config::{
        BLASTN_BIN_ENV, BLASTP_BIN_ENV, BlastSettings, MAKEBLASTDB_BIN_ENV, QueueSettings,
        active_resolution_label, process_env,
    },
    job_queue::QueueClient,
    logging,
    mcp_server::run_stdio_server,
};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "blast_mcp",
    about = "Starts an MCP stdio server with tools: blastn, blastp, makeblastdb (queue mode adds *_async and job tools)",
    disable_version_flag = true
)]
struct Cli {
    #[arg(long, value_enum, default_value = "local")]
    mode: BlastMode,
    /// Job queue base URL [env: BIO_MCP_QUEUE_URL]
    #[arg(long)]
    queue_url: Option<String>,
    /// BLAST timeout in seconds [env: BIO_MCP_TIMEOUT]
    #[arg(long)]
    timeout: Option<u64>,
    /// Parent directory for scratch files [env: BIO_MCP_TEMP_DIR]
    #[arg(long)]
    temp_dir: Option<PathBuf>,
    /// Largest accepted input file in bytes [env: BIO_MCP_MAX_FILE_SIZE]
    #[arg(long)]
    max_file_size: Option<u64>,
    /// Print version information
    #[arg(short = 'V', long)]
    version: bool,
}

fn blast_settings(cli: &Cli) -> BlastSettings {
    let mut settings = BlastSettings::from_env();
    if let Some(timeout) = cli.timeout {
        settings.timeout_secs = timeout;
    }
    if let Some(dir) = &cli.temp_dir {
        settings.temp_dir = Some(dir.clone());
    }
    if let Some(size) = cli.max_file_size {
        settings.max_file_size = size;
    }
    settings
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("{}", about::version_cli_text(SERVER_TITLE));
        return Ok(());
    }
    logging::init();

    let settings = blast_settings(&cli);
    tracing::info!(
        mode = ?cli.mode,
        timeout_secs = settings.timeout_secs,
        max_file_size = settings.max_file_size,
        "Starting {SERVER_TITLE} {}",
        about::BIO_MCP_DISPLAY_VERSION
    );
    for (env_var, default_bin) in [
        (BLASTN_BIN_ENV, "blastn"),
        (BLASTP_BIN_ENV, "blastp"),
        (MAKEBLASTDB_BIN_ENV, "makeblastdb"),
    ] {
        tracing::info!(
            "{default_bin}: {}",
            active_resolution_label(&process_env, env_var, default_bin)
        );
    }

    let queue = match cli.mode {
        BlastMode::Local => None,
        BlastMode::Queue => {
            let mut queue_settings = QueueSettings::from_env();
            if let Some(url) = &cli.queue_url {
                queue_settings.url = url.trim_end_matches('/').to_string();
            }
            tracing::info!("Job queue: {}", queue_settings.url);
            Some(QueueClient::new(queue_settings).context("could not start queue client")?)
        }
    };
    let server = BlastServer::new(BlastRunner::new(settings), queue);
    run_stdio_server(&server).map_err(|e| anyhow!(e))
}
