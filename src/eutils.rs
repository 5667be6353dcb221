//! Blocking client for the NCBI E-utilities endpoints used by the gene
//! server, plus the collaborator traits the server is written against.

use crate::config::NcbiSettings;
use crate::eutils_xml::{self, GeneSummary, GeoDataset};
use std::fmt;
use std::time::Duration;

/// Regions longer than this get at least [`LARGE_REGION_TIMEOUT_SECS`].
pub const LARGE_REGION_BP: u64 = 50_000;
pub const LARGE_REGION_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub enum EutilsError {
    Http { url: String, message: String },
    Status { url: String, status: u16, body: String },
    Parse { what: String, message: String },
    Empty { what: String },
}

impl fmt::Display for EutilsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { url, message } => write!(f, "NCBI request to {url} failed: {message}"),
            Self::Status { url, status, body } => write!(
                f,
                "NCBI request to {url} returned status {status}: {}",
                body.trim()
            ),
            Self::Parse { what, message } => write!(f, "Could not parse {what}: {message}"),
            Self::Empty { what } => write!(f, "NCBI returned no data for {what}"),
        }
    }
}

impl std::error::Error for EutilsError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceFormat {
    Fasta,
    GenBank,
}

impl SequenceFormat {
    pub const NAMES: &'static [&'static str] = &["fasta", "genbank"];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fasta" => Some(Self::Fasta),
            "genbank" | "gb" => Some(Self::GenBank),
            _ => None,
        }
    }

    pub fn rettype(self) -> &'static str {
        match self {
            Self::Fasta => "fasta",
            Self::GenBank => "gb",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Fasta => "FASTA",
            Self::GenBank => "GenBank",
        }
    }
}

/// Gene symbol + organism -> NCBI gene id.
pub trait GeneLookup {
    fn find_gene_id(&self, gene_name: &str, organism: &str) -> Result<Option<String>, EutilsError>;
}

/// Gene id -> gene summary with its candidate genomic records.
pub trait RecordFetch {
    fn gene_summary(&self, gene_id: &str) -> Result<GeneSummary, EutilsError>;
}

/// Chromosome accession + 1-based inclusive range -> sequence text.
pub trait SequenceFetch {
    fn fetch_sequence(
        &self,
        accession: &str,
        start: u64,
        end: u64,
        format: SequenceFormat,
    ) -> Result<String, EutilsError>;
}

/// Entrez query term -> GEO DataSets summaries.
pub trait DatasetSearch {
    fn search_datasets(&self, term: &str, max_results: usize) -> Result<Vec<GeoDataset>, EutilsError>;
}

pub fn gene_search_term(gene_name: &str, organism: &str) -> String {
    format!("{gene_name}[GENE] AND {organism}[ORGN]")
}

pub fn efetch_timeout(span: u64, base_secs: u64) -> Duration {
    if span > LARGE_REGION_BP {
        Duration::from_secs(base_secs.max(LARGE_REGION_TIMEOUT_SECS))
    } else {
        Duration::from_secs(base_secs)
    }
}

fn with_api_key(
    mut params: Vec<(&'static str, String)>,
    api_key: Option<&str>,
) -> Vec<(&'static str, String)> {
    if let Some(key) = api_key.map(str::trim).filter(|key| !key.is_empty()) {
        params.push(("api_key", key.to_string()));
    }
    params
}

pub struct EutilsClient {
    settings: NcbiSettings,
    http: reqwest::blocking::Client,
}

impl EutilsClient {
    pub fn new(settings: NcbiSettings) -> Result<Self, EutilsError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("bio-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EutilsError::Http {
                url: settings.base_url.clone(),
                message: format!("could not build HTTP client: {e}"),
            })?;
        Ok(Self { settings, http })
    }

    fn get_text(
        &self,
        endpoint: &str,
        params: Vec<(&'static str, String)>,
        timeout: Option<Duration>,
    ) -> Result<String, EutilsError> {
        let url = format!("{}/{endpoint}", self.settings.base_url);
        tracing::debug!(url = %url, ?params, "NCBI GET");
        let params = with_api_key(params, self.settings.api_key.as_deref());
        let full_url = reqwest::Url::parse_with_params(&url, &params).map_err(|e| {
            EutilsError::Http {
                url: url.clone(),
                message: format!("invalid request URL: {e}"),
            }
        })?;
        let mut request = self.http.get(full_url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().map_err(|e| EutilsError::Http {
            url: url.clone(),
            message: e.to_string(),
        })?;
        let status = response.status();
        let body = response.text().map_err(|e| EutilsError::Http {
            url: url.clone(),
            message: format!("could not read response body: {e}"),
        })?;
        if !status.is_success() {
            return Err(EutilsError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    pub fn esearch(&self, db: &str, term: &str, retmax: usize) -> Result<Vec<String>, EutilsError> {
        let body = self.get_text(
            "esearch.fcgi",
            vec![
                ("db", db.to_string()),
                ("term", term.to_string()),
                ("retmode", "xml".to_string()),
                ("retmax", retmax.to_string()),
            ],
            None,
        )?;
        eutils_xml::parse_esearch_ids(&body).map_err(|e| EutilsError::Parse {
            what: format!("esearch result for db={db}"),
            message: format!("{e:#}"),
        })
    }

    pub fn esummary(&self, db: &str, ids: &[String]) -> Result<String, EutilsError> {
        self.get_text(
            "esummary.fcgi",
            vec![
                ("db", db.to_string()),
                ("id", ids.join(",")),
                ("retmode", "xml".to_string()),
            ],
            None,
        )
    }

    pub fn efetch_sequence(
        &self,
        accession: &str,
        start: u64,
        end: u64,
        format: SequenceFormat,
    ) -> Result<String, EutilsError> {
        let span = end.saturating_sub(start);
        tracing::info!(
            "Fetching {span} bp of {accession} as {} from NCBI",
            format.label()
        );
        let body = self.get_text(
            "efetch.fcgi",
            vec![
                ("db", "nuccore".to_string()),
                ("id", accession.to_string()),
                ("seq_start", start.to_string()),
                ("seq_stop", end.to_string()),
                ("rettype", format.rettype().to_string()),
                ("retmode", "text".to_string()),
            ],
            Some(efetch_timeout(span, self.settings.timeout_secs)),
        )?;
        let body = body.trim();
        if body.is_empty() {
            return Err(EutilsError::Empty {
                what: format!("{accession}:{start}-{end}"),
            });
        }
        tracing::info!("Fetched {} characters for {accession}", body.len());
        Ok(body.to_string())
    }
}

impl GeneLookup for EutilsClient {
    fn find_gene_id(&self, gene_name: &str, organism: &str) -> Result<Option<String>, EutilsError> {
        let ids = self.esearch("gene", &gene_search_term(gene_name, organism), 1)?;
        Ok(ids.into_iter().next())
    }
}

impl RecordFetch for EutilsClient {
    fn gene_summary(&self, gene_id: &str) -> Result<GeneSummary, EutilsError> {
        let body = self.esummary("gene", &[gene_id.to_string()])?;
        let mut summaries =
            eutils_xml::parse_gene_summaries(&body).map_err(|e| EutilsError::Parse {
                what: format!("gene summary for id {gene_id}"),
                message: format!("{e:#}"),
            })?;
        let idx = summaries
            .iter()
            .position(|summary| summary.gene_id == gene_id)
            .unwrap_or(0);
        Ok(summaries.swap_remove(idx))
    }
}

impl SequenceFetch for EutilsClient {
    fn fetch_sequence(
        &self,
        accession: &str,
        start: u64,
        end: u64,
        format: SequenceFormat,
    ) -> Result<String, EutilsError> {
        self.efetch_sequence(accession, start, end, format)
    }
}

impl DatasetSearch for EutilsClient {
    fn search_datasets(&self, term: &str, max_results: usize) -> Result<Vec<GeoDataset>, EutilsError> {
        let ids = self.esearch("gds", term, max_results)?;
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let body = self.esummary("gds", &ids)?;
        eutils_xml::parse_geo_summaries(&body).map_err(|e| EutilsError::Parse {
            what: "GEO dataset summaries".to_string(),
            message: format!("{e:#}"),
        })
    }
}
