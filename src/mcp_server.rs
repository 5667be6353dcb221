//! MCP stdio message loop shared by every tool server.
//!
//! Requests are read until EOF. Both newline-delimited JSON and
//! `Content-Length:` framed messages are accepted, and each response is written
//! in the framing of the request it answers. Tool failures come back as
//! `isError` results; JSON-RPC errors are reserved for protocol problems.

use crate::error::ToolError;
use serde::Deserialize;
use serde_json::{Value, json};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::time::Instant;

pub const MCP_PROTOCOL_VERSION: &str = "2025-06-18";
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

const LARGE_RESPONSE_BYTES: usize = 50_000;
/// Largest Content-Length body accepted from a client.
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: &'static str,
    pub title: &'static str,
    pub version: &'static str,
}

/// Successful tool output: display text plus optional machine-readable data.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub structured: Option<Value>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            structured: None,
        }
    }

    pub fn with_structured(mut self, value: Value) -> Self {
        self.structured = Some(value);
        self
    }
}

pub trait ToolServer {
    fn server_info(&self) -> ServerInfo;

    /// Tool descriptors as returned by `tools/list`.
    fn tool_list(&self) -> Value;

    fn call_tool(&self, name: &str, arguments: &Value) -> Result<ToolOutput, ToolError>;
}

pub fn unknown_tool(name: &str) -> ToolError {
    ToolError::not_found(format!("Unknown tool '{name}'"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Line,
    ContentLength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchOutcome {
    NoResponse,
    Response,
    Exit,
}

#[derive(Debug, Clone, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

pub fn run_stdio_server<S: ToolServer>(server: &S) -> Result<(), String> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut reader = BufReader::new(stdin.lock());
    let mut writer = BufWriter::new(stdout.lock());
    let info = server.server_info();
    tracing::info!("Starting {} {} on stdio", info.title, info.version);
    run_server_loop(server, &mut reader, &mut writer)
}

fn run_server_loop<S: ToolServer, R: BufRead, W: Write>(
    server: &S,
    reader: &mut R,
    writer: &mut W,
) -> Result<(), String> {
    loop {
        let Some((framing, message)) = read_message(reader)? else {
            tracing::info!("stdin closed, stopping");
            return Ok(());
        };
        let outcome = match message {
            Ok(message) => handle_message(server, &message, framing, writer)?,
            Err(details) => {
                tracing::warn!("Discarding unparsable message: {details}");
                write_response(
                    writer,
                    framing,
                    jsonrpc_error(None, -32700, "Parse error", Some(json!({ "details": details }))),
                )?
            }
        };
        if outcome == DispatchOutcome::Exit {
            return Ok(());
        }
    }
}

fn is_header_line(line: &str) -> bool {
    if line.starts_with('{') || line.starts_with('[') {
        return false;
    }
    line.split_once(':').is_some_and(|(name, _)| {
        !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// Returns `None` at EOF. The inner `Err` carries a JSON parse failure that
/// the loop answers with -32700; the outer `Err` is an unrecoverable stream
/// problem.
fn read_message<R: BufRead>(
    reader: &mut R,
) -> Result<Option<(Framing, Result<Value, String>)>, String> {
    let mut content_length: Option<usize> = None;
    let mut in_headers = false;

    loop {
        let mut line = String::new();
        let bytes_read = reader
            .read_line(&mut line)
            .map_err(|e| format!("Could not read MCP message line: {e}"))?;
        if bytes_read == 0 {
            return if in_headers {
                Err("Unexpected EOF while reading MCP headers".to_string())
            } else {
                Ok(None)
            };
        }
        let line_trimmed = line.trim_end_matches(['\r', '\n']);
        if line_trimmed.trim().is_empty() {
            if in_headers {
                break;
            }
            continue;
        }
        if !in_headers && !is_header_line(line_trimmed) {
            let parsed = serde_json::from_str::<Value>(line_trimmed)
                .map_err(|e| format!("Could not parse MCP JSON line: {e}"));
            return Ok(Some((Framing::Line, parsed)));
        }
        in_headers = true;
        let Some((name, value)) = line_trimmed.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("Content-Length") {
            let len = value
                .trim()
                .parse::<usize>()
                .map_err(|e| format!("Invalid Content-Length header '{line_trimmed}': {e}"))?;
            content_length = Some(len);
        }
    }

    let len = content_length.ok_or_else(|| "Missing Content-Length header".to_string())?;
    if len > MAX_MESSAGE_BYTES {
        return Err(format!(
            "Content-Length {len} exceeds the {MAX_MESSAGE_BYTES} byte message limit"
        ));
    }
    let mut body = vec![0u8; len];
    reader
        .read_exact(&mut body)
        .map_err(|e| format!("Could not read MCP JSON payload body: {e}"))?;
    let parsed = serde_json::from_slice::<Value>(&body)
        .map_err(|e| format!("Could not parse MCP JSON payload: {e}"));
    Ok(Some((Framing::ContentLength, parsed)))
}

fn write_message<W: Write>(writer: &mut W, framing: Framing, payload: &Value) -> Result<(), String> {
    let body = serde_json::to_vec(payload)
        .map_err(|e| format!("Could not serialize MCP response JSON: {e}"))?;
    if body.len() > LARGE_RESPONSE_BYTES {
        tracing::info!("Large response sent: {} bytes", body.len());
    }
    match framing {
        Framing::ContentLength => {
            writer
                .write_all(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes())
                .map_err(|e| format!("Could not write MCP response header: {e}"))?;
            writer
                .write_all(&body)
                .map_err(|e| format!("Could not write MCP response body: {e}"))?;
        }
        Framing::Line => {
            writer
                .write_all(&body)
                .and_then(|_| writer.write_all(b"\n"))
                .map_err(|e| format!("Could not write MCP response line: {e}"))?;
        }
    }
    writer
        .flush()
        .map_err(|e| format!("Could not flush MCP response stream: {e}"))?;
    Ok(())
}

fn jsonrpc_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

fn jsonrpc_error(id: Option<Value>, code: i64, message: &str, data: Option<Value>) -> Value {
    let mut error = json!({
        "code": code,
        "message": message
    });
    if let Some(data) = data {
        error["data"] = data;
    }
    json!({
        "jsonrpc": "2.0",
        "id": id.unwrap_or(Value::Null),
        "error": error
    })
}

fn tool_result(text: String, structured: Option<Value>, is_error: bool) -> Value {
    let total_length = text.chars().count();
    let mut result = json!({
        "content": [
            {
                "type": "text",
                "text": text
            }
        ],
        "isError": is_error,
        "_meta": {
            "total_length": total_length,
            "complete": true,
            "truncated": false
        }
    });
    if let Some(structured) = structured {
        result["structuredContent"] = structured;
    }
    result
}

fn tool_call_result<S: ToolServer>(server: &S, call: ToolCallParams) -> Value {
    let name = call.name.trim();
    let started = Instant::now();
    tracing::info!(tool = name, "tools/call");
    match server.call_tool(name, &call.arguments) {
        Ok(output) => {
            tracing::info!(
                tool = name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                chars = output.text.len(),
                "tool call finished"
            );
            tool_result(output.text, output.structured, false)
        }
        Err(err) => {
            tracing::warn!(tool = name, code = ?err.code, "tool call failed: {}", err.message);
            let structured = json!({ "error": err });
            tool_result(format!("❌ {}", err.message), Some(structured), true)
        }
    }
}

fn negotiated_protocol_version(params: Option<&Value>) -> &'static str {
    let requested = params
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .copied()
        .find(|v| *v == requested)
        .unwrap_or(MCP_PROTOCOL_VERSION)
}

fn write_response<W: Write>(
    writer: &mut W,
    framing: Framing,
    value: Value,
) -> Result<DispatchOutcome, String> {
    write_message(writer, framing, &value)?;
    Ok(DispatchOutcome::Response)
}

fn handle_message<S: ToolServer, W: Write>(
    server: &S,
    message: &Value,
    framing: Framing,
    writer: &mut W,
) -> Result<DispatchOutcome, String> {
    let Some(obj) = message.as_object() else {
        return write_response(
            writer,
            framing,
            jsonrpc_error(None, -32600, "Invalid Request: expected JSON object", None),
        );
    };
    let id = obj.get("id").cloned().filter(|v| !v.is_null());
    let Some(method) = obj.get("method").and_then(Value::as_str) else {
        return write_response(
            writer,
            framing,
            jsonrpc_error(
                id,
                -32600,
                "Invalid Request: missing method field",
                Some(message.clone()),
            ),
        );
    };
    tracing::debug!(method, "request");

    match method {
        "initialize" => {
            let Some(id) = id else {
                return write_response(
                    writer,
                    framing,
                    jsonrpc_error(
                        None,
                        -32600,
                        "Invalid Request: initialize requires id",
                        None,
                    ),
                );
            };
            let info = server.server_info();
            let result = json!({
                "protocolVersion": negotiated_protocol_version(obj.get("params")),
                "capabilities": {
                    "tools": {
                        "listChanged": false
                    }
                },
                "serverInfo": {
                    "name": info.name,
                    "title": info.title,
                    "version": info.version
                }
            });
            write_response(writer, framing, jsonrpc_response(id, result))
        }
        "notifications/initialized" => Ok(DispatchOutcome::NoResponse),
        "ping" | "shutdown" => {
            if let Some(id) = id {
                write_response(writer, framing, jsonrpc_response(id, json!({})))
            } else {
                Ok(DispatchOutcome::NoResponse)
            }
        }
        "tools/list" => {
            let Some(id) = id else {
                return Ok(DispatchOutcome::NoResponse);
            };
            write_response(
                writer,
                framing,
                jsonrpc_response(id, json!({ "tools": server.tool_list() })),
            )
        }
        "tools/call" => {
            let Some(id) = id else {
                return Ok(DispatchOutcome::NoResponse);
            };
            let params = obj.get("params").cloned().unwrap_or_else(|| json!({}));
            let call = match serde_json::from_value::<ToolCallParams>(params) {
                Ok(call) => call,
                Err(err) => {
                    return write_response(
                        writer,
                        framing,
                        jsonrpc_error(
                            Some(id),
                            -32602,
                            "Invalid params for tools/call",
                            Some(json!({ "details": err.to_string() })),
                        ),
                    );
                }
            };
            let result = tool_call_result(server, call);
            write_response(writer, framing, jsonrpc_response(id, result))
        }
        "exit" => Ok(DispatchOutcome::Exit),
        _ => {
            if id.is_none() {
                return Ok(DispatchOutcome::NoResponse);
            }
            write_response(
                writer,
                framing,
                jsonrpc_error(id, -32601, &format!("Method '{method}' not found"), None),
            )
        }
    }
}
