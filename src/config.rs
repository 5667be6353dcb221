//! Server settings resolved from environment variables.
//!
//! Every settings struct is built from a lookup function so tests can pass a
//! closure instead of touching the process environment. Blank values count as
//! unset. Command-line flags are applied on top by the binaries.

use locus_resolver::{DEFAULT_ASSEMBLY_FAMILY, DEFAULT_RELEASE_FAMILY, SelectionPolicy};
use std::path::PathBuf;

pub const NCBI_BASE_URL_ENV: &str = "NCBI_BASE_URL";
pub const NCBI_API_KEY_ENV: &str = "NCBI_API_KEY";
pub const TIMEOUT_ENV: &str = "BIO_MCP_TIMEOUT";
pub const RELEASE_FAMILY_ENV: &str = "BIO_MCP_RELEASE_FAMILY";
pub const ASSEMBLY_FAMILY_ENV: &str = "BIO_MCP_ASSEMBLY_FAMILY";
pub const MAX_FILE_SIZE_ENV: &str = "BIO_MCP_MAX_FILE_SIZE";
pub const TEMP_DIR_ENV: &str = "BIO_MCP_TEMP_DIR";
pub const BLASTN_BIN_ENV: &str = "BIO_MCP_BLASTN_BIN";
pub const BLASTP_BIN_ENV: &str = "BIO_MCP_BLASTP_BIN";
pub const MAKEBLASTDB_BIN_ENV: &str = "BIO_MCP_MAKEBLASTDB_BIN";
pub const QUEUE_URL_ENV: &str = "BIO_MCP_QUEUE_URL";

pub const DEFAULT_NCBI_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
pub const DEFAULT_NCBI_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BLAST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100_000_000;
pub const DEFAULT_QUEUE_URL: &str = "http://localhost:8000";

pub fn normalized_non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn configured<L>(lookup: &L, key: &str) -> Option<String>
where
    L: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| normalized_non_empty(&v))
}

fn configured_u64<L>(lookup: &L, key: &str, default: u64) -> u64
where
    L: Fn(&str) -> Option<String>,
{
    match configured(lookup, key) {
        Some(raw) => raw.parse::<u64>().unwrap_or_else(|e| {
            tracing::warn!("Ignoring {key}='{raw}': {e}; using {default}");
            default
        }),
        None => default,
    }
}

pub fn resolve_tool_executable<L>(lookup: &L, env_var: &str, default_bin: &str) -> String
where
    L: Fn(&str) -> Option<String>,
{
    configured(lookup, env_var).unwrap_or_else(|| default_bin.to_string())
}

pub fn active_resolution_label<L>(lookup: &L, env_var: &str, default_bin: &str) -> String
where
    L: Fn(&str) -> Option<String>,
{
    configured(lookup, env_var).unwrap_or_else(|| format!("PATH lookup: {default_bin}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NcbiSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub policy: SelectionPolicy,
}

impl Default for NcbiSettings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl NcbiSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<L>(lookup: L) -> Self
    where
        L: Fn(&str) -> Option<String>,
    {
        let base_url = configured(&lookup, NCBI_BASE_URL_ENV)
            .unwrap_or_else(|| DEFAULT_NCBI_BASE_URL.to_string());
        let policy = SelectionPolicy::default()
            .with_release_family(
                configured(&lookup, RELEASE_FAMILY_ENV)
                    .unwrap_or_else(|| DEFAULT_RELEASE_FAMILY.to_string()),
            )
            .with_assembly_family(
                configured(&lookup, ASSEMBLY_FAMILY_ENV)
                    .unwrap_or_else(|| DEFAULT_ASSEMBLY_FAMILY.to_string()),
            );
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: configured(&lookup, NCBI_API_KEY_ENV),
            timeout_secs: configured_u64(&lookup, TIMEOUT_ENV, DEFAULT_NCBI_TIMEOUT_SECS),
            policy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlastSettings {
    pub max_file_size: u64,
    pub temp_dir: Option<PathBuf>,
    pub timeout_secs: u64,
    pub blastn_bin: String,
    pub blastp_bin: String,
    pub makeblastdb_bin: String,
}

impl Default for BlastSettings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl BlastSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<L>(lookup: L) -> Self
    where
        L: Fn(&str) -> Option<String>,
    {
        Self {
            max_file_size: configured_u64(&lookup, MAX_FILE_SIZE_ENV, DEFAULT_MAX_FILE_SIZE),
            temp_dir: configured(&lookup, TEMP_DIR_ENV).map(PathBuf::from),
            timeout_secs: configured_u64(&lookup, TIMEOUT_ENV, DEFAULT_BLAST_TIMEOUT_SECS),
            blastn_bin: resolve_tool_executable(&lookup, BLASTN_BIN_ENV, "blastn"),
            blastp_bin: resolve_tool_executable(&lookup, BLASTP_BIN_ENV, "blastp"),
            makeblastdb_bin: resolve_tool_executable(&lookup, MAKEBLASTDB_BIN_ENV, "makeblastdb"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSettings {
    pub url: String,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl QueueSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<L>(lookup: L) -> Self
    where
        L: Fn(&str) -> Option<String>,
    {
        let url = configured(&lookup, QUEUE_URL_ENV).unwrap_or_else(|| DEFAULT_QUEUE_URL.to_string());
        Self {
            url: url.trim_end_matches('/').to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn ncbi_defaults_without_environment() {
        let settings = NcbiSettings::default();
        assert_eq!(settings.base_url, DEFAULT_NCBI_BASE_URL);
        assert_eq!(settings.api_key, None);
        assert_eq!(settings.timeout_secs, DEFAULT_NCBI_TIMEOUT_SECS);
        assert_eq!(settings.policy, SelectionPolicy::default());
    }

    #[test]
    fn ncbi_settings_read_overrides_and_ignore_blanks() {
        let settings = NcbiSettings::from_lookup(lookup_from(&[
            (NCBI_BASE_URL_ENV, "http://127.0.0.1:9000/eutils/"),
            (NCBI_API_KEY_ENV, "   "),
            (TIMEOUT_ENV, "45"),
            (RELEASE_FAMILY_ENV, "RS_2025"),
        ]));
        assert_eq!(settings.base_url, "http://127.0.0.1:9000/eutils");
        assert_eq!(settings.api_key, None);
        assert_eq!(settings.timeout_secs, 45);
        assert_eq!(settings.policy.release_family_prefix, "RS_2025");
        assert_eq!(settings.policy.assembly_family_prefix, DEFAULT_ASSEMBLY_FAMILY);
    }

    #[test]
    fn unparsable_numbers_fall_back_to_defaults() {
        let settings = BlastSettings::from_lookup(lookup_from(&[
            (MAX_FILE_SIZE_ENV, "lots"),
            (TIMEOUT_ENV, "-1"),
        ]));
        assert_eq!(settings.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert_eq!(settings.timeout_secs, DEFAULT_BLAST_TIMEOUT_SECS);
    }

    #[test]
    fn tool_executables_resolve_from_overrides() {
        let lookup = lookup_from(&[(BLASTN_BIN_ENV, " /opt/blast/bin/blastn ")]);
        let settings = BlastSettings::from_lookup(&lookup);
        assert_eq!(settings.blastn_bin, "/opt/blast/bin/blastn");
        assert_eq!(settings.blastp_bin, "blastp");
        assert_eq!(
            active_resolution_label(&lookup, BLASTP_BIN_ENV, "blastp"),
            "PATH lookup: blastp"
        );
        assert_eq!(
            active_resolution_label(&lookup, BLASTN_BIN_ENV, "blastn"),
            "/opt/blast/bin/blastn"
        );
    }

    #[test]
    fn queue_url_defaults_to_localhost() {
        assert_eq!(QueueSettings::default().url, DEFAULT_QUEUE_URL);
        let settings = QueueSettings::from_lookup(lookup_from(&[(QUEUE_URL_ENV, "http://q:8080/")]));
        assert_eq!(settings.url, "http://q:8080");
    }
}
