//! MCP stdio server for gene lookup, genomic sequences and GEO datasets.

use anyhow::{Result, anyhow};
use bio_mcp::{
    about,
    config::NcbiSettings,
    eutils::EutilsClient,
    gene_server::{GeneServer, SERVER_TITLE},
    logging,
    mcp_server::run_stdio_server,
};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "gene_mcp",
    about = "Starts an MCP stdio server with tools: gene_to_sequence, search_gene_info, get_genomic_sequence, search_geo_datasets",
    disable_version_flag = true
)]
struct Cli {
    /// E-utilities base URL [env: NCBI_BASE_URL]
    #[arg(long)]
    base_url: Option<String>,
    /// NCBI API key [env: NCBI_API_KEY]
    #[arg(long)]
    api_key: Option<String>,
    /// HTTP timeout in seconds [env: BIO_MCP_TIMEOUT]
    #[arg(long)]
    timeout: Option<u64>,
    /// Annotation release family counted as most recent [env: BIO_MCP_RELEASE_FAMILY]
    #[arg(long)]
    release_family: Option<String>,
    /// Assembly family counted as primary [env: BIO_MCP_ASSEMBLY_FAMILY]
    #[arg(long)]
    assembly_family: Option<String>,
    /// Print version information
    #[arg(short = 'V', long)]
    version: bool,
}

impl Cli {
    fn settings(self) -> NcbiSettings {
        let mut settings = NcbiSettings::from_env();
        if let Some(base_url) = self.base_url {
            settings.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(api_key) = self.api_key {
            settings.api_key = Some(api_key);
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_secs = timeout;
        }
        if let Some(family) = self.release_family {
            settings.policy = settings.policy.with_release_family(family);
        }
        if let Some(family) = self.assembly_family {
            settings.policy = settings.policy.with_assembly_family(family);
        }
        settings
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("{}", about::version_cli_text(SERVER_TITLE));
        return Ok(());
    }
    logging::init();

    let settings = cli.settings();
    tracing::info!(
        base_url = %settings.base_url,
        api_key = settings.api_key.is_some(),
        timeout_secs = settings.timeout_secs,
        release_family = %settings.policy.release_family_prefix,
        assembly_family = %settings.policy.assembly_family_prefix,
        "Starting {SERVER_TITLE} {}",
        about::BIO_MCP_DISPLAY_VERSION
    );
    let policy = settings.policy.clone();
    let client = EutilsClient::new(settings)?;
    let server = GeneServer::new(client, policy);
    run_stdio_server(&server).map_err(|e| anyhow!(e))
}
