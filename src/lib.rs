pub mod about;
pub mod blast;
pub mod blast_server;
pub mod config;
pub mod echo_server;
pub mod error;
pub mod eutils;
pub mod eutils_xml;
pub mod gene_server;
pub mod geo;
#[cfg(test)]
mod http_fixture;
pub mod job_queue;
pub mod logging;
pub mod mcp_server;
pub mod text_format;
pub mod tool_args;
