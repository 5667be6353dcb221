//! Local BLAST+ execution: `blastn`, `blastp` and `makeblastdb`.
//!
//! Queries are written into a scratch directory, the executable runs with
//! piped output and a wall-clock limit, and the scratch directory is removed
//! when the call returns.

use crate::config::{BLASTN_BIN_ENV, BLASTP_BIN_ENV, BlastSettings, MAKEBLASTDB_BIN_ENV};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs,
    io::{ErrorKind, Read},
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
    sync::LazyLock,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use tempfile::TempDir;

pub const TABULAR_FIELDS: &str =
    "qaccver saccver pident length mismatch gapopen qstart qend sstart send evalue bitscore";
pub const TABULAR_HEADER: &str = "# Fields: query acc.ver, subject acc.ver, % identity, alignment length, mismatches, gap opens, q. start, q. end, s. start, s. end, evalue, bit score";
pub const DEFAULT_EVALUE: f64 = 10.0;
pub const DEFAULT_MAX_HITS: u64 = 50;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

static DATABASE_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").ok());

#[derive(Debug, Clone)]
pub enum BlastError {
    InvalidInput {
        message: String,
    },
    InputTooLarge {
        path: String,
        size: u64,
        limit: u64,
    },
    ToolNotFound {
        executable: String,
    },
    ToolFailed {
        executable: String,
        args: Vec<String>,
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },
    TimedOut {
        executable: String,
        timeout_secs: u64,
    },
    Io {
        message: String,
    },
}

impl fmt::Display for BlastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { message } => write!(f, "{message}"),
            Self::InputTooLarge { path, size, limit } => write!(
                f,
                "Input '{path}' is {size} bytes, larger than the {limit} byte limit"
            ),
            Self::ToolNotFound { executable } => write!(
                f,
                "Could not find BLAST executable '{executable}'. Install NCBI BLAST+ or set {BLASTN_BIN_ENV}, {BLASTP_BIN_ENV} or {MAKEBLASTDB_BIN_ENV}"
            ),
            Self::ToolFailed {
                executable,
                args,
                status,
                stdout,
                stderr,
            } => write!(
                f,
                "BLAST command failed: {} {} (status={:?}, stdout='{}', stderr='{}')",
                executable,
                args.join(" "),
                status,
                stdout.trim(),
                stderr.trim()
            ),
            Self::TimedOut {
                executable,
                timeout_secs,
            } => write!(
                f,
                "{executable} timed out after {timeout_secs} seconds and was killed"
            ),
            Self::Io { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for BlastError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlastProgram {
    Blastn,
    Blastp,
}

impl BlastProgram {
    pub fn name(self) -> &'static str {
        match self {
            Self::Blastn => "blastn",
            Self::Blastp => "blastp",
        }
    }

    fn executable(self, settings: &BlastSettings) -> &str {
        match self {
            Self::Blastn => &settings.blastn_bin,
            Self::Blastp => &settings.blastp_bin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Tabular,
    Xml,
    Json,
    Pairwise,
    Summary,
}

impl OutputFormat {
    pub const NAMES: &'static [&'static str] = &["tabular", "xml", "json", "pairwise", "summary"];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tabular" => Some(Self::Tabular),
            "xml" => Some(Self::Xml),
            "json" => Some(Self::Json),
            "pairwise" => Some(Self::Pairwise),
            "summary" => Some(Self::Summary),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Tabular => "tabular",
            Self::Xml => "xml",
            Self::Json => "json",
            Self::Pairwise => "pairwise",
            Self::Summary => "summary",
        }
    }

    /// Value passed to `-outfmt`.
    pub fn outfmt(self) -> String {
        match self {
            Self::Tabular => format!("6 {TABULAR_FIELDS}"),
            Self::Xml => "5".to_string(),
            Self::Json => "15".to_string(),
            Self::Pairwise => "0".to_string(),
            Self::Summary => format!("6 {TABULAR_FIELDS} stitle"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Nucl,
    Prot,
}

impl DbType {
    pub const NAMES: &'static [&'static str] = &["nucl", "prot"];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "nucl" => Some(Self::Nucl),
            "prot" => Some(Self::Prot),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Nucl => "nucl",
            Self::Prot => "prot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastSearch {
    pub program: BlastProgram,
    /// Path to a FASTA file or a raw sequence.
    pub query: String,
    pub database: String,
    pub evalue: f64,
    pub max_hits: u64,
    pub format: OutputFormat,
}

impl BlastSearch {
    pub fn new(program: BlastProgram, query: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            program,
            query: query.into(),
            database: database.into(),
            evalue: DEFAULT_EVALUE,
            max_hits: DEFAULT_MAX_HITS,
            format: OutputFormat::Tabular,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlastReport {
    pub program: BlastProgram,
    pub executable: String,
    pub database: String,
    pub format: OutputFormat,
    pub command: Vec<String>,
    /// Hit rows for tabular and summary output; `None` for the other formats.
    pub hit_count: Option<usize>,
    pub output: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakeDbRequest {
    pub input_file: PathBuf,
    pub database_name: String,
    pub dbtype: DbType,
    pub title: Option<String>,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeDbReport {
    pub executable: String,
    pub command: Vec<String>,
    pub database_path: String,
    pub files: Vec<String>,
    pub stdout: String,
}

/// Exit status and captured output of a finished child process.
#[derive(Debug)]
pub struct ToolRun {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

fn drain<R>(mut reader: R) -> JoinHandle<Vec<u8>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

fn joined(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
        .unwrap_or_default()
}

/// Runs `executable` and kills it once `timeout` has elapsed. Both output
/// pipes are read on their own threads so a chatty child cannot block.
pub fn run_with_timeout(
    executable: &str,
    args: &[String],
    timeout: Duration,
) -> Result<ToolRun, BlastError> {
    tracing::info!("Running {} {}", executable, args.join(" "));
    let mut child = Command::new(executable)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                BlastError::ToolNotFound {
                    executable: executable.to_string(),
                }
            } else {
                BlastError::Io {
                    message: format!(
                        "Could not run '{}' with args [{}]: {}",
                        executable,
                        args.join(" "),
                        e
                    ),
                }
            }
        })?;
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if started.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                tracing::warn!("{executable} exceeded {:?}; killed", timeout);
                return Err(BlastError::TimedOut {
                    executable: executable.to_string(),
                    timeout_secs: timeout.as_secs(),
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                return Err(BlastError::Io {
                    message: format!("Could not wait for '{executable}': {e}"),
                });
            }
        }
    };

    Ok(ToolRun {
        status,
        stdout: joined(stdout),
        stderr: joined(stderr),
    })
}

fn succeeded(executable: &str, args: &[String], run: ToolRun) -> Result<ToolRun, BlastError> {
    if run.status.success() {
        Ok(run)
    } else {
        Err(BlastError::ToolFailed {
            executable: executable.to_string(),
            args: args.to_vec(),
            status: run.status.code(),
            stdout: run.stdout,
            stderr: run.stderr,
        })
    }
}

pub fn validate_database_name(name: &str) -> Result<(), BlastError> {
    let valid = DATABASE_NAME
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(name));
    if valid {
        Ok(())
    } else {
        Err(BlastError::InvalidInput {
            message: format!(
                "database_name '{name}' must be a plain file name stem (letters, digits, '.', '_' or '-')"
            ),
        })
    }
}

/// Size of the regular file at `path`, or an error when it is missing or
/// over `limit`.
fn checked_file_size(path: &Path, limit: u64) -> Result<u64, BlastError> {
    let metadata = fs::metadata(path).map_err(|e| BlastError::InvalidInput {
        message: format!("Cannot read input file '{}': {e}", path.display()),
    })?;
    if !metadata.is_file() {
        return Err(BlastError::InvalidInput {
            message: format!("Input '{}' is not a regular file", path.display()),
        });
    }
    if metadata.len() > limit {
        return Err(BlastError::InputTooLarge {
            path: path.display().to_string(),
            size: metadata.len(),
            limit,
        });
    }
    Ok(metadata.len())
}

/// Summary output: one numbered block per tabular row.
pub fn render_summary(program: BlastProgram, stdout: &str, max_hits: u64) -> (String, usize) {
    let rows = stdout
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .take(max_hits as usize)
        .map(|line| line.split('\t').collect::<Vec<_>>())
        .filter(|fields| fields.len() >= 13)
        .collect::<Vec<_>>();
    if rows.is_empty() {
        return (
            "✅ BLAST search completed - No significant hits found".to_string(),
            0,
        );
    }

    let mut text = format!(
        "✅ BLAST {} Results\n{}\n\n",
        program.name().to_uppercase(),
        "=".repeat(50)
    );
    for (i, fields) in rows.iter().enumerate() {
        text.push_str(&format!("Hit {}:\n", i + 1));
        text.push_str(&format!("  Subject: {}\n", fields[1]));
        text.push_str(&format!("  Description: {}\n", fields[12..].join("\t")));
        text.push_str(&format!("  Identity: {}%\n", fields[2]));
        text.push_str(&format!("  E-value: {}\n", fields[10]));
        text.push_str(&format!("  Bit score: {}\n", fields[11]));
        text.push_str(&format!("  Alignment length: {}\n\n", fields[3]));
    }
    (text, rows.len())
}

fn tabular_row_count(stdout: &str) -> usize {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .count()
}

pub struct BlastRunner {
    settings: BlastSettings,
}

impl BlastRunner {
    pub fn new(settings: BlastSettings) -> Self {
        Self { settings }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.settings.timeout_secs)
    }

    fn scratch_dir(&self) -> Result<TempDir, BlastError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("bio-mcp-blast-");
        let dir = match &self.settings.temp_dir {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|e| BlastError::Io {
                    message: format!(
                        "Could not create temp directory '{}': {e}",
                        parent.display()
                    ),
                })?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        };
        dir.map_err(|e| BlastError::Io {
            message: format!("Could not create scratch directory: {e}"),
        })
    }

    /// Writes the query into `dir` as `query.fasta`. An existing file path is
    /// copied; anything else is treated as sequence text.
    pub fn materialize_query(&self, query: &str, dir: &Path) -> Result<PathBuf, BlastError> {
        let target = dir.join("query.fasta");
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(BlastError::InvalidInput {
                message: "Query is empty".to_string(),
            });
        }

        let candidate = Path::new(trimmed);
        if !trimmed.contains('\n') && candidate.is_file() {
            checked_file_size(candidate, self.settings.max_file_size)?;
            fs::copy(candidate, &target).map_err(|e| BlastError::Io {
                message: format!("Could not copy query file '{trimmed}': {e}"),
            })?;
            return Ok(target);
        }

        if trimmed.len() as u64 > self.settings.max_file_size {
            return Err(BlastError::InputTooLarge {
                path: "<inline query>".to_string(),
                size: trimmed.len() as u64,
                limit: self.settings.max_file_size,
            });
        }
        let fasta = if trimmed.starts_with('>') {
            format!("{trimmed}\n")
        } else {
            format!(">Query\n{trimmed}\n")
        };
        fs::write(&target, fasta).map_err(|e| BlastError::Io {
            message: format!("Could not write query file: {e}"),
        })?;
        Ok(target)
    }

    pub fn search_args(search: &BlastSearch, query_path: &Path) -> Vec<String> {
        vec![
            "-query".to_string(),
            query_path.display().to_string(),
            "-db".to_string(),
            search.database.clone(),
            "-evalue".to_string(),
            search.evalue.to_string(),
            "-max_target_seqs".to_string(),
            search.max_hits.to_string(),
            "-outfmt".to_string(),
            search.format.outfmt(),
        ]
    }

    pub fn search(&self, search: &BlastSearch) -> Result<BlastReport, BlastError> {
        if search.database.trim().is_empty() {
            return Err(BlastError::InvalidInput {
                message: "Database is empty".to_string(),
            });
        }
        if search.max_hits == 0 {
            return Err(BlastError::InvalidInput {
                message: "max_hits must be at least 1".to_string(),
            });
        }
        let scratch = self.scratch_dir()?;
        let query_path = self.materialize_query(&search.query, scratch.path())?;
        let executable = search.program.executable(&self.settings).to_string();
        let args = Self::search_args(search, &query_path);
        let run = succeeded(
            &executable,
            &args,
            run_with_timeout(&executable, &args, self.timeout())?,
        )?;

        let (output, hit_count) = match search.format {
            OutputFormat::Summary => {
                let (text, hits) = render_summary(search.program, &run.stdout, search.max_hits);
                (text, Some(hits))
            }
            OutputFormat::Tabular => {
                let rows = tabular_row_count(&run.stdout);
                (format!("{TABULAR_HEADER}\n{}", run.stdout), Some(rows))
            }
            _ => (run.stdout, None),
        };
        tracing::info!(
            program = search.program.name(),
            database = %search.database,
            hits = ?hit_count,
            "BLAST search finished"
        );

        Ok(BlastReport {
            program: search.program,
            executable,
            database: search.database.clone(),
            format: search.format,
            command: args,
            hit_count,
            output,
            stderr: run.stderr,
        })
    }

    pub fn make_database(&self, request: &MakeDbRequest) -> Result<MakeDbReport, BlastError> {
        validate_database_name(&request.database_name)?;
        checked_file_size(&request.input_file, self.settings.max_file_size)?;

        let output_dir = match &request.output_dir {
            Some(dir) => dir.clone(),
            None => request
                .input_file
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        fs::create_dir_all(&output_dir).map_err(|e| BlastError::Io {
            message: format!(
                "Could not create database directory '{}': {e}",
                output_dir.display()
            ),
        })?;
        let database_path = output_dir.join(&request.database_name);

        let mut args = vec![
            "-in".to_string(),
            request.input_file.display().to_string(),
            "-dbtype".to_string(),
            request.dbtype.name().to_string(),
            "-out".to_string(),
            database_path.display().to_string(),
        ];
        if let Some(title) = request.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            args.push("-title".to_string());
            args.push(title.to_string());
        }

        let executable = self.settings.makeblastdb_bin.clone();
        let run = succeeded(
            &executable,
            &args,
            run_with_timeout(&executable, &args, self.timeout())?,
        )?;
        let files = database_files(&output_dir, &request.database_name)?;
        tracing::info!(
            "Created BLAST database {} ({} files)",
            database_path.display(),
            files.len()
        );

        Ok(MakeDbReport {
            executable,
            command: args,
            database_path: database_path.display().to_string(),
            files,
            stdout: run.stdout,
        })
    }
}

fn database_files(dir: &Path, database_name: &str) -> Result<Vec<String>, BlastError> {
    let prefix = format!("{database_name}.");
    let entries = fs::read_dir(dir).map_err(|e| BlastError::Io {
        message: format!("Could not list '{}': {e}", dir.display()),
    })?;
    let mut files = entries
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(&prefix))
        .collect::<Vec<_>>();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner_in(dir: &Path) -> BlastRunner {
        BlastRunner::new(BlastSettings {
            temp_dir: Some(dir.to_path_buf()),
            timeout_secs: 10,
            ..BlastSettings::default()
        })
    }

    #[cfg(unix)]
    fn script(dir: &Path, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        let mut perms = fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("chmod");
        path.display().to_string()
    }

    #[test]
    fn output_formats_map_to_outfmt_codes() {
        assert_eq!(OutputFormat::Xml.outfmt(), "5");
        assert_eq!(OutputFormat::Json.outfmt(), "15");
        assert_eq!(OutputFormat::Pairwise.outfmt(), "0");
        assert!(OutputFormat::Tabular.outfmt().starts_with("6 qaccver"));
        assert!(OutputFormat::Summary.outfmt().ends_with("bitscore stitle"));
        assert_eq!(OutputFormat::parse(" JSON "), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("html"), None);
    }

    #[test]
    fn search_args_follow_blast_flag_order() {
        let mut search = BlastSearch::new(BlastProgram::Blastp, "MKT", "swissprot");
        search.evalue = 0.001;
        search.max_hits = 5;
        search.format = OutputFormat::Json;
        let args = BlastRunner::search_args(&search, Path::new("/tmp/q.fasta"));
        assert_eq!(
            args,
            vec![
                "-query",
                "/tmp/q.fasta",
                "-db",
                "swissprot",
                "-evalue",
                "0.001",
                "-max_target_seqs",
                "5",
                "-outfmt",
                "15"
            ]
        );
    }

    #[test]
    fn raw_sequences_get_a_fasta_header() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = runner_in(tmp.path());
        let path = runner
            .materialize_query("ACGTACGT", tmp.path())
            .expect("query");
        assert_eq!(fs::read_to_string(path).expect("read"), ">Query\nACGTACGT\n");

        let path = runner
            .materialize_query(">my seq\nACGT", tmp.path())
            .expect("query");
        assert_eq!(fs::read_to_string(path).expect("read"), ">my seq\nACGT\n");
        assert!(runner.materialize_query("   ", tmp.path()).is_err());
    }

    #[test]
    fn query_files_are_copied_and_size_limited() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let source = tmp.path().join("input.fa");
        fs::write(&source, ">s1\nACGTACGTACGT\n").expect("write");
        let scratch = tmp.path().join("scratch");
        fs::create_dir_all(&scratch).expect("mkdir");

        let runner = runner_in(tmp.path());
        let copied = runner
            .materialize_query(&source.display().to_string(), &scratch)
            .expect("copied");
        assert_eq!(copied, scratch.join("query.fasta"));
        assert_eq!(fs::read_to_string(copied).expect("read"), ">s1\nACGTACGTACGT\n");

        let small = BlastRunner::new(BlastSettings {
            max_file_size: 4,
            ..BlastSettings::default()
        });
        let err = small
            .materialize_query(&source.display().to_string(), &scratch)
            .expect_err("too large");
        assert!(matches!(err, BlastError::InputTooLarge { limit: 4, .. }));
    }

    #[test]
    fn summary_numbers_hits_and_handles_empty_output() {
        let stdout = "q1\tNM_000546.6\t99.8\t500\t1\t0\t1\t500\t1\t500\t1e-120\t900\tHomo sapiens tumor protein p53\n\
q1\tNM_001126112.3\t97.0\t480\t14\t0\t1\t480\t1\t480\t2e-100\t800\tTP53 variant 2\n";
        let (text, hits) = render_summary(BlastProgram::Blastn, stdout, 10);
        assert_eq!(hits, 2);
        assert!(text.starts_with("✅ BLAST BLASTN Results"));
        assert!(text.contains("Hit 2:\n  Subject: NM_001126112.3"));
        assert!(text.contains("  Description: Homo sapiens tumor protein p53"));
        assert!(text.contains("  Identity: 99.8%"));

        let (_, limited) = render_summary(BlastProgram::Blastn, stdout, 1);
        assert_eq!(limited, 1);

        let (text, hits) = render_summary(BlastProgram::Blastp, "\n", 10);
        assert_eq!(hits, 0);
        assert_eq!(text, "✅ BLAST search completed - No significant hits found");
    }

    #[test]
    fn database_names_must_be_plain_stems() {
        assert!(validate_database_name("tp53_refs.v2").is_ok());
        assert!(validate_database_name("../etc/passwd").is_err());
        assert!(validate_database_name("dir/db").is_err());
        assert!(validate_database_name("").is_err());
        assert!(validate_database_name(".hidden").is_err());
    }

    #[test]
    fn missing_executable_is_reported() {
        let err = run_with_timeout(
            "bio-mcp-definitely-missing-binary",
            &[],
            Duration::from_secs(1),
        )
        .expect_err("missing");
        assert!(matches!(err, BlastError::ToolNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_is_reported() {
        let run = run_with_timeout("true", &[], Duration::from_secs(5)).expect("true");
        assert!(run.status.success());
        let run = run_with_timeout("false", &[], Duration::from_secs(5)).expect("false");
        let err = succeeded("false", &[], run).expect_err("failed");
        assert!(matches!(err, BlastError::ToolFailed { status: Some(1), .. }));
    }

    #[cfg(unix)]
    #[test]
    fn slow_children_are_killed() {
        let started = Instant::now();
        let err = run_with_timeout("sleep", &["5".to_string()], Duration::from_millis(200))
            .expect_err("timeout");
        assert!(matches!(err, BlastError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn search_runs_executable_and_adds_tabular_header() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let blastn = script(
            tmp.path(),
            "fake-blastn",
            r#"printf 'Query\tchr17\t100.0\t8\t0\t0\t1\t8\t101\t108\t0.5\t16.4\n'"#,
        );
        let runner = BlastRunner::new(BlastSettings {
            temp_dir: Some(tmp.path().join("scratch")),
            blastn_bin: blastn,
            ..BlastSettings::default()
        });
        let report = runner
            .search(&BlastSearch::new(BlastProgram::Blastn, "ACGTACGT", "refs"))
            .expect("report");
        assert_eq!(report.hit_count, Some(1));
        assert!(report.output.starts_with("# Fields: query acc.ver"));
        assert!(report.output.contains("chr17\t100.0"));
        assert_eq!(
            fs::read_dir(tmp.path().join("scratch")).expect("scratch").count(),
            0
        );
    }

    #[cfg(unix)]
    #[test]
    fn make_database_writes_next_to_input_and_lists_files() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let input = tmp.path().join("refs.fa");
        fs::write(&input, ">r1\nACGT\n").expect("write");
        let makeblastdb = script(
            tmp.path(),
            "fake-makeblastdb",
            r#"while [ $# -gt 0 ]; do if [ "$1" = "-out" ]; then out="$2"; fi; shift; done
touch "$out.nhr" "$out.nin" "$out.nsq"
echo "Adding sequences from FASTA; added 1 sequences""#,
        );
        let runner = BlastRunner::new(BlastSettings {
            makeblastdb_bin: makeblastdb,
            ..BlastSettings::default()
        });
        let report = runner
            .make_database(&MakeDbRequest {
                input_file: input.clone(),
                database_name: "refs_db".to_string(),
                dbtype: DbType::Nucl,
                title: Some("Reference set".to_string()),
                output_dir: None,
            })
            .expect("database");
        assert_eq!(report.files, vec!["refs_db.nhr", "refs_db.nin", "refs_db.nsq"]);
        assert_eq!(
            report.database_path,
            tmp.path().join("refs_db").display().to_string()
        );
        assert!(report.command.ends_with(&["-title".to_string(), "Reference set".to_string()]));

        let err = runner
            .make_database(&MakeDbRequest {
                input_file: tmp.path().join("missing.fa"),
                database_name: "x".to_string(),
                dbtype: DbType::Prot,
                title: None,
                output_dir: None,
            })
            .expect_err("missing input");
        assert!(matches!(err, BlastError::InvalidInput { .. }));
    }
}
