//! Client for the background job queue used by the `*_async` BLAST tools,
//! plus the texts shown to the user for receipts, status and results.

use crate::config::QueueSettings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_PRIORITY: u64 = 5;
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub enum QueueError {
    InvalidJobId { job_id: String },
    JobNotFound { job_id: String },
    NotCompleted { job_id: String, status: String },
    Http { url: String, message: String },
    Status { url: String, status: u16, body: String },
    Decode { url: String, message: String },
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJobId { job_id } => write!(f, "Invalid job id '{job_id}'"),
            Self::JobNotFound { job_id } => write!(f, "Job {job_id} not found"),
            Self::NotCompleted { job_id, status } => write!(
                f,
                "Job {job_id} is not completed yet. Status: {status}"
            ),
            Self::Http { url, message } => write!(f, "Queue request to {url} failed: {message}"),
            Self::Status { url, status, body } => write!(
                f,
                "Queue request to {url} returned status {status}: {}",
                body.trim()
            ),
            Self::Decode { url, message } => {
                write!(f, "Queue response from {url} is not valid JSON: {message}")
            }
        }
    }
}

impl std::error::Error for QueueError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSubmission {
    pub job_id: String,
    pub job_type: String,
    pub parameters: Value,
    pub priority: u64,
    pub tags: Vec<String>,
    pub notification_email: Option<String>,
}

impl JobSubmission {
    /// New submission with a fresh job id. The `blast` tag and the tool
    /// name are appended to the caller's tags.
    pub fn blast(
        tool: &str,
        parameters: Value,
        priority: u64,
        mut tags: Vec<String>,
        notification_email: Option<String>,
    ) -> Self {
        for tag in ["blast", tool] {
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            job_type: tool.to_string(),
            parameters,
            priority,
            tags,
            notification_email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReceipt {
    pub job_id: String,
    #[serde(default = "queued")]
    pub status: String,
}

fn queued() -> String {
    "queued".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: String,
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    #[serde(default)]
    pub query_title: Option<Value>,
    #[serde(default)]
    pub query_len: Option<Value>,
    #[serde(default)]
    pub database: Option<Value>,
    #[serde(default)]
    pub num_hits: Option<Value>,
    #[serde(default)]
    pub best_hit_evalue: Option<Value>,
    #[serde(default)]
    pub best_hit_identity: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(default)]
    pub job_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub summary: Option<ResultSummary>,
    #[serde(default)]
    pub result_url: Option<String>,
}

pub trait JobQueue {
    fn submit(&self, submission: &JobSubmission) -> Result<JobReceipt, QueueError>;
    fn status(&self, job_id: &str) -> Result<JobStatus, QueueError>;
    /// Fails with [`QueueError::NotCompleted`] unless the job has finished.
    fn result(&self, job_id: &str) -> Result<JobResult, QueueError>;
    fn cancel(&self, job_id: &str) -> Result<(), QueueError>;
}

pub fn validate_job_id(job_id: &str) -> Result<&str, QueueError> {
    let job_id = job_id.trim();
    let valid = !job_id.is_empty()
        && job_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(job_id)
    } else {
        Err(QueueError::InvalidJobId {
            job_id: job_id.to_string(),
        })
    }
}

pub fn submit_url(base_url: &str) -> String {
    format!("{base_url}/jobs/submit")
}

pub fn job_url(base_url: &str, job_id: &str, leaf: &str) -> String {
    format!("{base_url}/jobs/{job_id}/{leaf}")
}

pub struct QueueClient {
    settings: QueueSettings,
    http: reqwest::blocking::Client,
}

impl QueueClient {
    pub fn new(settings: QueueSettings) -> Result<Self, QueueError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| QueueError::Http {
                url: settings.url.clone(),
                message: format!("could not build queue client: {e}"),
            })?;
        Ok(Self { settings, http })
    }

    pub fn base_url(&self) -> &str {
        &self.settings.url
    }

    fn read_body(
        &self,
        url: &str,
        job_id: Option<&str>,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<String, QueueError> {
        let response = request.send().map_err(|e| QueueError::Http {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let status = response.status();
        let body = response.text().map_err(|e| QueueError::Http {
            url: url.to_string(),
            message: format!("could not read response body: {e}"),
        })?;
        if status.as_u16() == 404 {
            if let Some(job_id) = job_id {
                return Err(QueueError::JobNotFound {
                    job_id: job_id.to_string(),
                });
            }
        }
        if !status.is_success() {
            return Err(QueueError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn decode<T>(url: &str, body: &str) -> Result<T, QueueError>
    where
        T: for<'de> Deserialize<'de>,
    {
        serde_json::from_str(body).map_err(|e| QueueError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl JobQueue for QueueClient {
    fn submit(&self, submission: &JobSubmission) -> Result<JobReceipt, QueueError> {
        let url = submit_url(self.base_url());
        tracing::info!(
            job_id = %submission.job_id,
            job_type = %submission.job_type,
            "Submitting job to {url}"
        );
        let body = self.read_body(&url, None, self.http.post(&url).json(submission))?;
        Self::decode(&url, &body)
    }

    fn status(&self, job_id: &str) -> Result<JobStatus, QueueError> {
        let job_id = validate_job_id(job_id)?;
        let url = job_url(self.base_url(), job_id, "status");
        tracing::debug!("GET {url}");
        let body = self.read_body(&url, Some(job_id), self.http.get(&url))?;
        Self::decode(&url, &body)
    }

    fn result(&self, job_id: &str) -> Result<JobResult, QueueError> {
        let job_id = validate_job_id(job_id)?;
        let url = job_url(self.base_url(), job_id, "result");
        tracing::debug!("GET {url}");
        let body = self.read_body(&url, Some(job_id), self.http.get(&url))?;
        let result: JobResult = Self::decode(&url, &body)?;
        if result.status != "completed" {
            return Err(QueueError::NotCompleted {
                job_id: job_id.to_string(),
                status: result.status,
            });
        }
        Ok(result)
    }

    fn cancel(&self, job_id: &str) -> Result<(), QueueError> {
        let job_id = validate_job_id(job_id)?;
        let url = job_url(self.base_url(), job_id, "cancel");
        tracing::info!("Cancelling job {job_id}");
        self.read_body(&url, Some(job_id), self.http.post(&url))?;
        Ok(())
    }
}

/// Strings without quotes, everything else as JSON, missing as `N/A`.
fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "N/A".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

pub fn render_receipt(tool: &str, receipt: &JobReceipt, database: Option<&str>, priority: u64) -> String {
    let mut text = String::new();
    text.push_str("🧬 BLAST Job Submitted!\n\n");
    text.push_str(&format!("Job ID: {}\n", receipt.job_id));
    text.push_str(&format!("Type: {}\n", tool.to_uppercase()));
    text.push_str(&format!("Status: {}\n", receipt.status));
    text.push_str(&format!("Database: {}\n", database.unwrap_or("N/A")));
    text.push_str(&format!("Priority: {priority}\n\n"));
    text.push_str("💡 Next steps:\n");
    text.push_str(&format!("• Use 'get_job_status {}' to check progress\n", receipt.job_id));
    text.push_str(&format!("• Use 'get_job_result {}' when completed\n\n", receipt.job_id));
    text.push_str("Large BLAST searches typically take 2-30 minutes depending on database size.");
    text
}

pub fn render_status(status: &JobStatus) -> String {
    let mut text = format!("🧬 BLAST Job Status\n{}\n\n", "=".repeat(30));
    text.push_str(&format!("Job ID: {}\n", status.job_id));
    text.push_str(&format!("Status: {}\n", status.status));
    if let Some(created) = &status.created_at {
        text.push_str(&format!("Created: {created}\n"));
    }
    if let Some(started) = &status.started_at {
        text.push_str(&format!("Started: {started}\n"));
    }
    if let Some(progress) = status.progress {
        text.push_str(&format!("Progress: {progress}%\n"));
    }
    if let Some(completed) = &status.completed_at {
        text.push_str(&format!("Completed: {completed}\n"));
    }
    if status.status == "failed" {
        text.push_str(&format!("Error: {}\n", status.error.as_deref().unwrap_or("Unknown error")));
    }

    match status.status.as_str() {
        "running" => {
            text.push_str("\n💡 Your BLAST search is running on our compute cluster.\n");
            text.push_str("Large database searches can take 5-30 minutes.");
        }
        "completed" => text.push_str("\n✅ Ready! Use 'get_job_result' to see your BLAST hits."),
        "failed" => text.push_str("\n❌ Check your query sequence and database name."),
        _ => {}
    }
    text
}

pub fn render_result(job_id: &str, result: &JobResult) -> String {
    let mut text = format!("🧬 BLAST Results - Job {job_id}\n{}\n\n", "=".repeat(50));
    if let Some(summary) = &result.summary {
        text.push_str("📊 Summary:\n");
        text.push_str(&format!("  Query: {}\n", value_text(summary.query_title.as_ref())));
        text.push_str(&format!(
            "  Query Length: {} bp/aa\n",
            value_text(summary.query_len.as_ref()),
        ));
        text.push_str(&format!("  Database: {}\n", value_text(summary.database.as_ref())));
        text.push_str(&format!("  Total Hits: {}\n", value_text(summary.num_hits.as_ref())));
        if present(summary.best_hit_evalue.as_ref()) {
            text.push_str(&format!(
                "  Best Hit E-value: {}\n",
                value_text(summary.best_hit_evalue.as_ref()),
            ));
        }
        if present(summary.best_hit_identity.as_ref()) {
            text.push_str(&format!(
                "  Best Hit Identity: {}%\n",
                value_text(summary.best_hit_identity.as_ref()),
            ));
        }
        text.push('\n');
    }
    if let Some(url) = &result.result_url {
        text.push_str("📁 Full Results:\n");
        text.push_str(&format!("Download: {url}\n\n"));
        text.push_str("💾 Results are available for 7 days.\n");
        text.push_str("💡 You can open this URL in a browser or download with curl/wget.");
    }
    text
}

pub fn render_cancelled(job_id: &str) -> String {
    format!("🛑 BLAST job {job_id} cancelled successfully")
}
