//! BLAST tool server. Local mode runs BLAST+ directly; queue mode also
//! offers `*_async` submission and job management tools.

use crate::about;
use crate::blast::{
    BlastProgram, BlastReport, BlastRunner, BlastSearch, DEFAULT_EVALUE, DEFAULT_MAX_HITS,
    DbType, MakeDbRequest, OutputFormat, validate_database_name,
};
use crate::error::ToolError;
use crate::job_queue::{
    DEFAULT_PRIORITY, JobQueue, JobSubmission, render_cancelled, render_receipt, render_result,
    render_status,
};
use crate::mcp_server::{ServerInfo, ToolOutput, ToolServer, unknown_tool};
use crate::tool_args::{
    ToolArgs, args_object, one_of, optional_f64, optional_str, optional_u64, required_str,
    string_list, str_or,
};
use serde_json::{Value, json};
use std::path::PathBuf;

pub const SERVER_NAME: &str = "blast_mcp";
pub const SERVER_TITLE: &str = "BLAST MCP";

const QUEUE_ONLY_KEYS: &[&str] = &["priority", "tags", "notification_email"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BlastMode {
    Local,
    Queue,
}

pub struct BlastServer<Q> {
    runner: BlastRunner,
    queue: Option<Q>,
}

impl<Q: JobQueue> BlastServer<Q> {
    pub fn new(runner: BlastRunner, queue: Option<Q>) -> Self {
        Self { runner, queue }
    }

    pub fn mode(&self) -> BlastMode {
        if self.queue.is_some() {
            BlastMode::Queue
        } else {
            BlastMode::Local
        }
    }

    fn queue(&self, tool: &str) -> Result<&Q, ToolError> {
        self.queue.as_ref().ok_or_else(|| unknown_tool(tool))
    }

    fn blast_search(
        &self,
        program: BlastProgram,
        args: &ToolArgs,
    ) -> Result<ToolOutput, ToolError> {
        let search = search_from_args(program, args, OutputFormat::Summary)?;
        let report = self.runner.search(&search)?;
        let text = match report.format {
            OutputFormat::Summary => report.output.clone(),
            _ => search_text(&report),
        };
        let structured = json!({
            "program": report.program,
            "database": report.database,
            "format": report.format,
            "hit_count": report.hit_count,
            "command": report.command,
            "executable": report.executable,
        });
        Ok(ToolOutput::text(text).with_structured(structured))
    }

    fn makeblastdb(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let request = makedb_from_args(args)?;
        let report = self.runner.make_database(&request)?;

        let mut text = String::new();
        text.push_str(&format!("✅ BLAST database created: {}\n", report.database_path));
        text.push_str(&format!("Type: {}\n", request.dbtype.name()));
        if let Some(title) = &request.title {
            text.push_str(&format!("Title: {title}\n"));
        }
        text.push_str("Files:\n");
        for file in &report.files {
            text.push_str(&format!("  - {file}\n"));
        }
        if !report.stdout.trim().is_empty() {
            text.push_str(&format!("\n{}", report.stdout.trim_end()));
        }

        let structured = json!({
            "database_path": report.database_path,
            "dbtype": request.dbtype,
            "files": report.files,
            "command": report.command,
        });
        Ok(ToolOutput::text(text).with_structured(structured))
    }

    fn submit_async(&self, tool: &str, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let queue = self.queue(&format!("{tool}_async"))?;
        match tool {
            "makeblastdb" => {
                makedb_from_args(args)?;
            }
            "blastn" => {
                search_from_args(BlastProgram::Blastn, args, OutputFormat::Json)?;
            }
            _ => {
                search_from_args(BlastProgram::Blastp, args, OutputFormat::Json)?;
            }
        }
        let priority = optional_u64(args, "priority")?.unwrap_or(DEFAULT_PRIORITY);
        let tags = string_list(args, "tags")?;
        let notification_email = optional_str(args, "notification_email");
        let parameters = args
            .iter()
            .filter(|(key, _)| !QUEUE_ONLY_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect::<serde_json::Map<_, _>>();

        let submission = JobSubmission::blast(
            tool,
            Value::Object(parameters),
            priority,
            tags,
            notification_email,
        );
        let receipt = queue.submit(&submission)?;
        let database = optional_str(args, "database");
        let text = render_receipt(tool, &receipt, database.as_deref(), priority);
        Ok(ToolOutput::text(text).with_structured(json!({
            "job_id": receipt.job_id,
            "status": receipt.status,
            "job_type": tool,
            "priority": priority,
            "tags": submission.tags,
        })))
    }

    fn job_status(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let queue = self.queue("get_job_status")?;
        let job_id = required_str(args, "job_id")?;
        let status = queue.status(&job_id)?;
        let structured = serde_json::to_value(&status).ok();
        let output = ToolOutput::text(render_status(&status));
        Ok(match structured {
            Some(value) => output.with_structured(value),
            None => output,
        })
    }

    fn job_result(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let queue = self.queue("get_job_result")?;
        let job_id = required_str(args, "job_id")?;
        let result = queue.result(&job_id)?;
        let structured = serde_json::to_value(&result).ok();
        let output = ToolOutput::text(render_result(&job_id, &result));
        Ok(match structured {
            Some(value) => output.with_structured(value),
            None => output,
        })
    }

    fn cancel_job(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let queue = self.queue("cancel_job")?;
        let job_id = required_str(args, "job_id")?;
        queue.cancel(&job_id)?;
        Ok(ToolOutput::text(render_cancelled(&job_id))
            .with_structured(json!({"job_id": job_id, "cancelled": true})))
    }
}

fn search_text(report: &BlastReport) -> String {
    let mut text = format!(
        "✅ {} search against {} ({} output",
        report.program.name().to_uppercase(),
        report.database,
        report.format.name()
    );
    if let Some(hits) = report.hit_count {
        text.push_str(&format!(", {hits} hits"));
    }
    text.push_str(")\n\n");
    text.push_str(&report.output);
    text
}

fn search_from_args(
    program: BlastProgram,
    args: &ToolArgs,
    default_format: OutputFormat,
) -> Result<BlastSearch, ToolError> {
    let query = required_str(args, "query")?;
    let database = required_str(args, "database")?;
    let format_name = str_or(args, "output_format", default_format.name()).to_ascii_lowercase();
    let format_name = one_of("output_format", format_name, OutputFormat::NAMES)?;
    let format = OutputFormat::parse(&format_name).unwrap_or(default_format);
    let evalue = optional_f64(args, "evalue")?.unwrap_or(DEFAULT_EVALUE);
    if !(evalue.is_finite() && evalue > 0.0) {
        return Err(ToolError::invalid_input(format!(
            "evalue must be a positive number, got {evalue}"
        )));
    }
    let max_hits = optional_u64(args, "max_hits")?.unwrap_or(DEFAULT_MAX_HITS);
    if max_hits == 0 {
        return Err(ToolError::invalid_input("max_hits must be at least 1"));
    }

    let mut search = BlastSearch::new(program, query, database);
    search.evalue = evalue;
    search.max_hits = max_hits;
    search.format = format;
    Ok(search)
}

fn makedb_from_args(args: &ToolArgs) -> Result<MakeDbRequest, ToolError> {
    let input_file = required_str(args, "input_file")?;
    let database_name = required_str(args, "database_name")?;
    validate_database_name(&database_name)?;
    let dbtype_name = required_str(args, "dbtype")?.to_ascii_lowercase();
    let dbtype_name = one_of("dbtype", dbtype_name, DbType::NAMES)?;
    let dbtype = DbType::parse(&dbtype_name)
        .ok_or_else(|| ToolError::invalid_input(format!("Unsupported dbtype '{dbtype_name}'")))?;
    Ok(MakeDbRequest {
        input_file: PathBuf::from(input_file),
        database_name,
        dbtype,
        title: optional_str(args, "title"),
        output_dir: optional_str(args, "output_dir").map(PathBuf::from),
    })
}

fn search_schema(molecule: &str, default_format: OutputFormat, queued: bool) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": format!("Path to a query FASTA file or a raw {molecule} sequence")
            },
            "database": {
                "type": "string",
                "description": "BLAST database name or path"
            },
            "evalue": { "type": "number", "default": DEFAULT_EVALUE },
            "max_hits": { "type": "integer", "minimum": 1, "default": DEFAULT_MAX_HITS },
            "output_format": {
                "type": "string",
                "enum": OutputFormat::NAMES,
                "default": default_format.name()
            }
        },
        "required": ["query", "database"]
    });
    if queued {
        add_queue_properties(&mut schema);
    }
    schema
}

fn makedb_schema(queued: bool) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": {
            "input_file": { "type": "string", "description": "Input FASTA file" },
            "database_name": {
                "type": "string",
                "description": "Database file stem (letters, digits, '.', '_' or '-')"
            },
            "dbtype": { "type": "string", "enum": DbType::NAMES },
            "title": { "type": "string", "description": "Database title" },
            "output_dir": {
                "type": "string",
                "description": "Directory for the database files (default: the input file's directory)"
            }
        },
        "required": ["input_file", "database_name", "dbtype"]
    });
    if queued {
        add_queue_properties(&mut schema);
    }
    schema
}

fn add_queue_properties(schema: &mut Value) {
    if let Some(properties) = schema["properties"].as_object_mut() {
        properties.insert(
            "priority".to_string(),
            json!({"type": "integer", "minimum": 1, "maximum": 10, "default": DEFAULT_PRIORITY}),
        );
        properties.insert(
            "tags".to_string(),
            json!({"type": "array", "items": {"type": "string"}}),
        );
        properties.insert(
            "notification_email".to_string(),
            json!({"type": "string", "description": "Email for job completion notification"}),
        );
    }
}

fn job_id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "job_id": { "type": "string", "description": description }
        },
        "required": ["job_id"]
    })
}

impl<Q: JobQueue> ToolServer for BlastServer<Q> {
    fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: SERVER_NAME,
            title: SERVER_TITLE,
            version: about::BIO_MCP_DISPLAY_VERSION,
        }
    }

    fn tool_list(&self) -> Value {
        let mut tools = vec![
            json!({
                "name": "blastn",
                "title": "Nucleotide BLAST",
                "description": "Search a nucleotide database with a nucleotide query using local BLAST+.",
                "inputSchema": search_schema("nucleotide", OutputFormat::Summary, false)
            }),
            json!({
                "name": "blastp",
                "title": "Protein BLAST",
                "description": "Search a protein database with a protein query using local BLAST+.",
                "inputSchema": search_schema("protein", OutputFormat::Summary, false)
            }),
            json!({
                "name": "makeblastdb",
                "title": "Create BLAST Database",
                "description": "Build a BLAST database from a FASTA file.",
                "inputSchema": makedb_schema(false)
            }),
        ];
        if self.queue.is_some() {
            tools.extend([
                json!({
                    "name": "blastn_async",
                    "title": "Nucleotide BLAST (background job)",
                    "description": "Submit a nucleotide BLAST search as a background job.",
                    "inputSchema": search_schema("nucleotide", OutputFormat::Json, true)
                }),
                json!({
                    "name": "blastp_async",
                    "title": "Protein BLAST (background job)",
                    "description": "Submit a protein BLAST search as a background job.",
                    "inputSchema": search_schema("protein", OutputFormat::Json, true)
                }),
                json!({
                    "name": "makeblastdb_async",
                    "title": "Create BLAST Database (background job)",
                    "description": "Submit BLAST database creation as a background job.",
                    "inputSchema": makedb_schema(true)
                }),
                json!({
                    "name": "get_job_status",
                    "title": "Job Status",
                    "description": "Check the status of a background job.",
                    "inputSchema": job_id_schema("Job ID to check")
                }),
                json!({
                    "name": "get_job_result",
                    "title": "Job Result",
                    "description": "Retrieve the results of a completed background job.",
                    "inputSchema": job_id_schema("Job ID to retrieve results for")
                }),
                json!({
                    "name": "cancel_job",
                    "title": "Cancel Job",
                    "description": "Cancel a queued or running background job.",
                    "inputSchema": job_id_schema("Job ID to cancel")
                }),
            ]);
        }
        Value::Array(tools)
    }

    fn call_tool(&self, name: &str, arguments: &Value) -> Result<ToolOutput, ToolError> {
        let args = args_object(arguments)?;
        match name {
            "blastn" => self.blast_search(BlastProgram::Blastn, &args),
            "blastp" => self.blast_search(BlastProgram::Blastp, &args),
            "makeblastdb" => self.makeblastdb(&args),
            "blastn_async" => self.submit_async("blastn", &args),
            "blastp_async" => self.submit_async("blastp", &args),
            "makeblastdb_async" => self.submit_async("makeblastdb", &args),
            "get_job_status" => self.job_status(&args),
            "get_job_result" => self.job_result(&args),
            "cancel_job" => self.cancel_job(&args),
            other => Err(unknown_tool(other)),
        }
    }
}
