pub const BIO_MCP_DISPLAY_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version_cli_text(server_title: &str) -> String {
    format!(
        "{server_title} {}\nbio-mcp tool servers for genomics over MCP stdio",
        BIO_MCP_DISPLAY_VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_text_names_server_and_version() {
        let text = version_cli_text("Gene MCP");
        assert!(text.starts_with("Gene MCP "));
        assert!(text.contains(BIO_MCP_DISPLAY_VERSION));
    }
}
