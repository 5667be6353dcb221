//! Gene, genomic sequence and GEO dataset tools.
//!
//! `gene_to_sequence` runs Identifier Lookup, Record Fetch, coordinate
//! resolution and Sequence Fetch in that order. The NCBI collaborators are
//! injected so the tool logic runs against in-memory fakes in tests.

use crate::about;
use crate::error::ToolError;
use crate::eutils::{DatasetSearch, GeneLookup, RecordFetch, SequenceFetch, SequenceFormat};
use crate::eutils_xml::GeneSummary;
use crate::geo;
use crate::mcp_server::{ServerInfo, ToolOutput, ToolServer, unknown_tool};
use crate::text_format::{
    fasta_residue_count, genbank_residue_count, rule, thousands, truncate_chars,
};
use crate::tool_args::{
    ToolArgs, args_object, one_of, optional_str, optional_u64, required_str, required_u64, str_or,
};
use locus_resolver::{Provenance, ResolvedCoordinate, SelectionPolicy, resolve_with};
use serde_json::{Value, json};

pub const SERVER_NAME: &str = "gene_mcp";
pub const SERVER_TITLE: &str = "Gene MCP";
pub const DEFAULT_ORGANISM: &str = "human";

pub struct GeneServer<C> {
    client: C,
    policy: SelectionPolicy,
}

impl<C> GeneServer<C>
where
    C: GeneLookup + RecordFetch + SequenceFetch + DatasetSearch,
{
    pub fn new(client: C, policy: SelectionPolicy) -> Self {
        Self { client, policy }
    }

    fn locate(
        &self,
        gene_name: &str,
        organism: &str,
    ) -> Result<(GeneSummary, Result<ResolvedCoordinate, ToolError>), ToolError> {
        let gene_id = self
            .client
            .find_gene_id(gene_name, organism)?
            .ok_or_else(|| {
                ToolError::not_found(format!("Gene '{gene_name}' not found in {organism}"))
            })?;
        tracing::info!("{gene_name} ({organism}) is gene id {gene_id}");
        let summary = self.client.gene_summary(&gene_id)?;
        let resolved = resolve_with(&self.policy, &summary.records)
            .map(|resolved| {
                tracing::info!(
                    gene = gene_name,
                    provenance = %resolved.provenance,
                    "Selected {}:{}-{}",
                    resolved.chromosome_accession,
                    resolved.start,
                    resolved.end
                );
                for skipped in &resolved.skipped {
                    tracing::warn!(
                        gene = gene_name,
                        "Skipped location record #{} (missing {})",
                        skipped.index,
                        skipped.missing
                    );
                }
                resolved
            })
            .map_err(|e| {
                ToolError::from(e)
                    .context(format!("Genomic coordinates not found for {gene_name}"))
            });
        Ok((summary, resolved))
    }

    fn gene_to_sequence(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let gene_name = required_str(args, "gene_name")?;
        let organism = str_or(args, "organism", DEFAULT_ORGANISM);
        let format = sequence_format(args)?;

        let (summary, resolved) = self.locate(&gene_name, &organism)?;
        let resolved = resolved?;
        // NCBI ChrStart/ChrStop go to efetch as given, so the fetched region
        // holds span() + 1 residues.
        let sequence = self.client.fetch_sequence(
            &resolved.chromosome_accession,
            resolved.start,
            resolved.end,
            format,
        )?;
        let actual_length = residue_count(&sequence, format);
        if actual_length == 0 {
            tracing::warn!("No sequence data retrieved for {gene_name}");
            return Err(ToolError::not_found(format!(
                "No sequence data available for {gene_name}"
            )));
        }
        tracing::info!("Retrieved complete sequence: {actual_length} bp");

        let mut text = String::new();
        text.push_str(&format!("🧬 Gene: {gene_name} ({organism})\n"));
        write_location_block(&mut text, &resolved);
        text.push_str(&format!(
            "📏 Expected Length: {} bp (ChrStop - ChrStart)\n",
            thousands(resolved.span()),
        ));
        text.push_str(&format!(
            "📏 Actual Sequence Length: {} bp\n",
            thousands(actual_length as u64),
        ));
        text.push_str(&format!(
            "🔬 Complete Genomic DNA Sequence ({}, {} nucleotides, not truncated):\n\n",
            format.label(),
            thousands(actual_length as u64),
        ));
        text.push_str(&sequence);

        let structured = json!({
            "gene": gene_name,
            "organism": organism,
            "gene_id": summary.gene_id,
            "location": location_json(&resolved),
            "expected_length": resolved.span(),
            "actual_length": actual_length,
            "format": format.rettype(),
        });
        Ok(ToolOutput::text(text).with_structured(structured))
    }

    fn search_gene_info(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let gene_name = required_str(args, "gene_name")?;
        let organism = str_or(args, "organism", DEFAULT_ORGANISM);
        let (summary, resolved) = self.locate(&gene_name, &organism)?;

        let na = |value: &Option<String>| value.clone().unwrap_or_else(|| "N/A".to_string());
        let mut text = String::new();
        text.push_str(&format!("🧬 Gene: {gene_name} ({organism})\n"));
        text.push_str(&format!("🆔 Gene ID: {}\n", summary.gene_id));
        text.push_str(&format!("🔤 Official Symbol: {}\n", na(&summary.name)));
        text.push_str(&format!("📝 Description: {}\n", na(&summary.description)));
        text.push_str(&format!("🦠 Organism: {}\n", na(&summary.organism)));
        text.push_str(&format!("🧩 Chromosome: {}\n", na(&summary.chromosome)));
        text.push_str(&format!("🗺️ Map Location: {}\n", na(&summary.map_location)));
        let location = match &resolved {
            Ok(resolved) => {
                write_location_block(&mut text, resolved);
                text.push_str(&format!("📏 Length: {} bp\n", thousands(resolved.span())));
                location_json(resolved)
            }
            Err(err) => {
                text.push_str(&format!("📍 Genomic Location: unavailable ({})\n", err.message));
                Value::Null
            }
        };

        let structured = json!({
            "gene_id": summary.gene_id,
            "symbol": summary.name,
            "description": summary.description,
            "organism": summary.organism,
            "chromosome": summary.chromosome,
            "map_location": summary.map_location,
            "location": location,
            "candidate_records": summary.records.len(),
        });
        Ok(ToolOutput::text(text).with_structured(structured))
    }

    fn get_genomic_sequence(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let chromosome = required_str(args, "chromosome")?;
        let a = required_u64(args, "start")?;
        let b = required_u64(args, "end")?;
        let format = sequence_format(args)?;
        let (start, end) = (a.min(b), a.max(b));
        if start == 0 {
            return Err(ToolError::invalid_input(
                "Sequence coordinates are 1-based; start must be at least 1",
            ));
        }

        let sequence = self.client.fetch_sequence(&chromosome, start, end, format)?;
        let actual_length = residue_count(&sequence, format);
        if actual_length == 0 {
            return Err(ToolError::not_found(format!(
                "Could not retrieve sequence from {chromosome}:{start}-{end}"
            )));
        }

        let mut text = String::new();
        text.push_str(&format!(
            "🧬 Genomic Region: {chromosome}:{}-{}\n",
            thousands(start),
            thousands(end),
        ));
        text.push_str(&format!("📏 Requested Length: {} bp\n", thousands(end - start + 1)));
        text.push_str(&format!(
            "📏 Actual Sequence Length: {} bp\n",
            thousands(actual_length as u64),
        ));
        text.push_str(&format!("🔬 Output Format: {}\n\n", format.label()));
        text.push_str(&sequence);

        let structured = json!({
            "chromosome_accession": chromosome,
            "start": start,
            "end": end,
            "actual_length": actual_length,
            "format": format.rettype(),
        });
        Ok(ToolOutput::text(text).with_structured(structured))
    }

    fn search_geo_datasets(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let query = optional_str(args, "query")
            .or_else(|| optional_str(args, "disease"))
            .ok_or_else(|| ToolError::invalid_input("Missing required argument 'query'"))?;
        let organism = str_or(args, "organism", DEFAULT_ORGANISM);
        let study_type = str_or(args, "study_type", geo::DEFAULT_STUDY_TYPE);
        let max_results = geo::clamp_max_results(optional_u64(args, "max_results")?);

        let term = geo::search_term(&query, &organism, &study_type);
        tracing::info!("Searching GEO for: {term} (max {max_results})");
        let datasets = self.client.search_datasets(&term, max_results)?;
        if datasets.is_empty() {
            return Err(ToolError::not_found(format!(
                "No GEO datasets found for '{query}' in {organism} ({study_type})"
            )));
        }

        let mut text = String::new();
        text.push_str("🧬 GEO Datasets Search Results\n");
        text.push_str(&format!("🔍 Query: {query} ({organism})\n"));
        text.push_str(&format!("🎯 Study Type: {study_type}\n"));
        text.push_str(&format!("📊 Found: {} datasets\n\n", datasets.len()));

        let mut entries = Vec::with_capacity(datasets.len());
        for (i, dataset) in datasets.iter().enumerate() {
            let data_type = geo::classify(dataset);
            let accession = dataset.accession.as_deref().unwrap_or("N/A");
            let study = dataset
                .entry_type
                .as_deref()
                .map(geo::study_type_description)
                .unwrap_or_else(|| "Unknown Study Type".to_string());
            let summary = dataset
                .summary
                .as_deref()
                .map(|s| truncate_chars(s, geo::SUMMARY_CHARS))
                .unwrap_or_else(|| "N/A".to_string());
            let or_na = |v: &Option<String>| v.as_deref().unwrap_or("N/A").to_string();

            text.push_str(&format!("{}\n", rule(60)));
            text.push_str(&format!("📋 Dataset #{}: {accession}\n", i + 1));
            text.push_str(&format!("{}\n", rule(60)));
            text.push_str(&format!("📝 Title: {}\n", or_na(&dataset.title)));
            text.push_str(&format!("📄 Summary: {summary}\n"));
            text.push_str(&format!("📊 Sample Count: {}\n", or_na(&dataset.sample_count)));
            text.push_str(&format!("🔬 Platform: {}\n", or_na(&dataset.platform)));
            text.push_str(&format!("📅 Release Date: {}\n", or_na(&dataset.release_date)));
            text.push_str(&format!("🦠 Organism: {}\n", or_na(&dataset.organism)));
            text.push_str(&format!("🏷️ Study Type: {study}\n"));
            if let Some(gds_type) = &dataset.gds_type {
                text.push_str(&format!("🧫 Experiment Type: {gds_type}\n"));
            }
            text.push_str(&format!("🧪 Data Type: {}\n", data_type.label()));
            if let Some(accession) = &dataset.accession {
                text.push_str(&format!("🔗 GEO Link: {}\n", geo::geo_link(accession)));
            }
            text.push('\n');

            entries.push(json!({
                "dataset": dataset,
                "data_type": data_type,
                "study_type": study,
                "link": dataset.accession.as_deref().map(geo::geo_link),
            }));
        }

        let structured = json!({
            "query": query,
            "organism": organism,
            "study_type": study_type,
            "count": entries.len(),
            "datasets": entries,
        });
        Ok(ToolOutput::text(text).with_structured(structured))
    }
}

fn sequence_format(args: &ToolArgs) -> Result<SequenceFormat, ToolError> {
    let raw = str_or(args, "output_format", "fasta").to_ascii_lowercase();
    let raw = one_of("output_format", raw, &["fasta", "genbank", "gb"])?;
    SequenceFormat::parse(&raw)
        .ok_or_else(|| ToolError::invalid_input(format!("Unsupported output_format '{raw}'")))
}

fn residue_count(sequence: &str, format: SequenceFormat) -> usize {
    match format {
        SequenceFormat::Fasta => fasta_residue_count(sequence),
        SequenceFormat::GenBank => genbank_residue_count(sequence),
    }
}

fn write_location_block(text: &mut String, resolved: &ResolvedCoordinate) {
    text.push_str(&format!(
        "📍 Genomic Location: {}:{}-{}\n",
        resolved.chromosome_accession,
        thousands(resolved.start),
        thousands(resolved.end),
    ));
    match &resolved.provenance {
        Provenance::Current => {
            text.push_str("🔄 Version: Current GenomicInfo\n");
        }
        Provenance::Historical { release, assembly } => {
            text.push_str(&format!("🔄 Version: Latest: {release} ({assembly})\n"));
            text.push_str(&format!("📋 Annotation: {release} | Assembly: {assembly}\n"));
        }
    }
    text.push_str(&format!("🏷️ Provenance: {}\n", resolved.provenance));
    if !resolved.skipped.is_empty() {
        text.push_str(&format!(
            "⚠️ Skipped {} location record(s) with missing coordinates\n",
            resolved.skipped.len(),
        ));
    }
}

fn location_json(resolved: &ResolvedCoordinate) -> Value {
    json!({
        "chromosome_accession": resolved.chromosome_accession,
        "start": resolved.start,
        "end": resolved.end,
        "provenance": resolved.provenance.to_string(),
        "skipped": resolved.skipped,
    })
}

impl<C> ToolServer for GeneServer<C>
where
    C: GeneLookup + RecordFetch + SequenceFetch + DatasetSearch,
{
    fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: SERVER_NAME,
            title: SERVER_TITLE,
            version: about::BIO_MCP_DISPLAY_VERSION,
        }
    }

    fn tool_list(&self) -> Value {
        json!([
            {
                "name": "gene_to_sequence",
                "title": "Gene to Genomic Sequence",
                "description": "Get the complete genomic DNA sequence for a gene from NCBI. Selects the latest annotation release and primary reference assembly and returns the full-length region without truncation.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "gene_name": {
                            "type": "string",
                            "description": "Gene symbol (e.g., TP53, BRCA1, EGFR, KRAS)"
                        },
                        "organism": {
                            "type": "string",
                            "description": "Organism name (default: human)",
                            "default": DEFAULT_ORGANISM
                        },
                        "output_format": {
                            "type": "string",
                            "enum": SequenceFormat::NAMES,
                            "default": "fasta"
                        }
                    },
                    "required": ["gene_name"]
                }
            },
            {
                "name": "search_gene_info",
                "title": "Search Gene Info",
                "description": "Look up a gene in NCBI Gene: id, official symbol, description, chromosome, map location and resolved genomic location.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "gene_name": {
                            "type": "string",
                            "description": "Gene symbol (e.g., TP53)"
                        },
                        "organism": {
                            "type": "string",
                            "default": DEFAULT_ORGANISM
                        }
                    },
                    "required": ["gene_name"]
                }
            },
            {
                "name": "get_genomic_sequence",
                "title": "Get Genomic Sequence",
                "description": "Fetch the sequence of a chromosome region by accession and 1-based coordinates.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "chromosome": {
                            "type": "string",
                            "description": "Chromosome accession (e.g., NC_000017.11)"
                        },
                        "start": { "type": "integer", "minimum": 1 },
                        "end": { "type": "integer", "minimum": 1 },
                        "output_format": {
                            "type": "string",
                            "enum": SequenceFormat::NAMES,
                            "default": "fasta"
                        }
                    },
                    "required": ["chromosome", "start", "end"]
                }
            },
            {
                "name": "search_geo_datasets",
                "title": "Search GEO Datasets",
                "description": "Search GEO DataSets for expression profiling studies by disease, tissue or condition, with sample counts, platforms and a single-cell/spatial/bulk classification.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Disease, tissue, condition or keyword (e.g., 'glioblastoma', 'liver')"
                        },
                        "disease": {
                            "type": "string",
                            "description": "Alias for query."
                        },
                        "organism": {
                            "type": "string",
                            "default": DEFAULT_ORGANISM
                        },
                        "study_type": {
                            "type": "string",
                            "default": geo::DEFAULT_STUDY_TYPE
                        },
                        "max_results": {
                            "type": "integer",
                            "minimum": 1,
                            "maximum": geo::MAX_RESULTS_LIMIT,
                            "default": 10
                        }
                    }
                }
            }
        ])
    }

    fn call_tool(&self, name: &str, arguments: &Value) -> Result<ToolOutput, ToolError> {
        let args = args_object(arguments)?;
        match name {
            "gene_to_sequence" => self.gene_to_sequence(&args),
            "search_gene_info" => self.search_gene_info(&args),
            "get_genomic_sequence" => self.get_genomic_sequence(&args),
            "search_geo_datasets" => self.search_geo_datasets(&args),
            other => Err(unknown_tool(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::eutils::EutilsError;
    use crate::eutils_xml::{self, GeoDataset, fixtures};
    use locus_resolver::GenomicRecord;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeNcbi {
        genes: Vec<(String, String)>,
        summaries: Vec<GeneSummary>,
        sequence: String,
        datasets: Vec<GeoDataset>,
        fetches: RefCell<Vec<(String, u64, u64, SequenceFormat)>>,
        terms: RefCell<Vec<(String, usize)>>,
    }

    impl GeneLookup for FakeNcbi {
        fn find_gene_id(&self, gene_name: &str, _organism: &str) -> Result<Option<String>, EutilsError> {
            Ok(self
                .genes
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(gene_name))
                .map(|(_, id)| id.clone()))
        }
    }

    impl RecordFetch for FakeNcbi {
        fn gene_summary(&self, gene_id: &str) -> Result<GeneSummary, EutilsError> {
            self.summaries
                .iter()
                .find(|s| s.gene_id == gene_id)
                .cloned()
                .ok_or_else(|| EutilsError::Empty {
                    what: format!("gene {gene_id}"),
                })
        }
    }

    impl SequenceFetch for FakeNcbi {
        fn fetch_sequence(
            &self,
            accession: &str,
            start: u64,
            end: u64,
            format: SequenceFormat,
        ) -> Result<String, EutilsError> {
            self.fetches
                .borrow_mut()
                .push((accession.to_string(), start, end, format));
            Ok(self.sequence.clone())
        }
    }

    impl DatasetSearch for FakeNcbi {
        fn search_datasets(&self, term: &str, max_results: usize) -> Result<Vec<GeoDataset>, EutilsError> {
            self.terms.borrow_mut().push((term.to_string(), max_results));
            Ok(self.datasets.iter().take(max_results).cloned().collect())
        }
    }

    fn tp53_server() -> GeneServer<FakeNcbi> {
        let fake = FakeNcbi {
            genes: vec![("TP53".to_string(), "7157".to_string())],
            summaries: eutils_xml::parse_gene_summaries(fixtures::TP53_ESUMMARY).expect("fixture"),
            sequence: ">NC_000017.11:7668420-7687489 Homo sapiens chromosome 17\nACGTACGTAC\nGTACG\n"
                .to_string(),
            datasets: eutils_xml::parse_geo_summaries(fixtures::GEO_ESUMMARY).expect("fixture"),
            ..FakeNcbi::default()
        };
        GeneServer::new(fake, SelectionPolicy::default())
    }

    #[test]
    fn gene_to_sequence_fetches_resolved_historical_region() {
        let server = tp53_server();
        let output = server
            .call_tool("gene_to_sequence", &json!({"gene_name": "TP53"}))
            .expect("tool output");
        assert!(output.text.contains("🧬 Gene: TP53 (human)"));
        assert!(output.text.contains("NC_000017.11:7,668,420-7,687,489"));
        assert!(output.text.contains("Latest: RS_2024_08 (GCF_000001405.40)"));
        assert!(output.text.contains("historical:RS_2024_08:GCF_000001405.40"));
        assert!(output.text.contains("Expected Length: 19,069 bp (ChrStop - ChrStart)"));
        assert!(output.text.contains("Actual Sequence Length: 15 bp"));
        assert!(output.text.ends_with("GTACG\n"));

        let fetches = server.client.fetches.borrow();
        assert_eq!(
            fetches.as_slice(),
            &[(
                "NC_000017.11".to_string(),
                7668420,
                7687489,
                SequenceFormat::Fasta
            )]
        );
        let structured = output.structured.expect("structured");
        assert_eq!(structured["gene_id"], "7157");
        assert_eq!(structured["actual_length"], 15);
    }

    #[test]
    fn current_record_is_used_when_history_does_not_qualify() {
        let fake = FakeNcbi {
            genes: vec![("KRAS".to_string(), "3845".to_string())],
            summaries: vec![GeneSummary {
                gene_id: "3845".to_string(),
                name: Some("KRAS".to_string()),
                description: None,
                organism: Some("Homo sapiens".to_string()),
                chromosome: Some("12".to_string()),
                map_location: None,
                records: vec![
                    GenomicRecord::current("NC_000012.12", 25250928, 25205245),
                    GenomicRecord::historical("RS_2019_06", "GCF_000001635.27", "NC_000072.7", 1, 2),
                ],
            }],
            sequence: ">x\nACGT\n".to_string(),
            ..FakeNcbi::default()
        };
        let server = GeneServer::new(fake, SelectionPolicy::default());
        let output = server
            .call_tool("gene_to_sequence", &json!({"gene_name": "KRAS", "organism": "human"}))
            .expect("tool output");
        assert!(output.text.contains("🔄 Version: Current GenomicInfo"));
        assert!(output.text.contains("🏷️ Provenance: current"));
        assert!(!output.text.contains("📋 Annotation"));
        assert_eq!(server.client.fetches.borrow()[0].1, 25205245);
    }

    #[test]
    fn unknown_gene_is_not_found() {
        let server = tp53_server();
        let err = server
            .call_tool("gene_to_sequence", &json!({"gene_name": "NOPE1", "organism": "mouse"}))
            .expect_err("unknown gene");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Gene 'NOPE1' not found in mouse");
    }

    #[test]
    fn gene_without_locations_is_not_found() {
        let fake = FakeNcbi {
            genes: vec![("ORPHAN1".to_string(), "99".to_string())],
            summaries: vec![GeneSummary {
                gene_id: "99".to_string(),
                name: Some("ORPHAN1".to_string()),
                description: None,
                organism: None,
                chromosome: None,
                map_location: None,
                records: vec![],
            }],
            ..FakeNcbi::default()
        };
        let server = GeneServer::new(fake, SelectionPolicy::default());
        let err = server
            .call_tool("gene_to_sequence", &json!({"gene_name": "ORPHAN1"}))
            .expect_err("no locations");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(
            err.message,
            "Genomic coordinates not found for ORPHAN1: No genomic records found"
        );
        assert!(server.client.fetches.borrow().is_empty());
    }

    #[test]
    fn empty_sequence_is_an_error() {
        let mut server = tp53_server();
        server.client.sequence = ">header only\n".to_string();
        let err = server
            .call_tool("gene_to_sequence", &json!({"gene_name": "TP53"}))
            .expect_err("empty sequence");
        assert!(err.message.contains("No sequence data available for TP53"));
    }

    #[test]
    fn genbank_format_is_passed_through() {
        let mut server = tp53_server();
        server.client.sequence = "LOCUS x\nORIGIN\n        1 acgt\n//\n".to_string();
        let output = server
            .call_tool(
                "gene_to_sequence",
                &json!({"gene_name": "TP53", "output_format": "genbank"}),
            )
            .expect("tool output");
        assert!(output.text.contains("Actual Sequence Length: 4 bp"));
        assert_eq!(server.client.fetches.borrow()[0].3, SequenceFormat::GenBank);
        assert!(
            server
                .call_tool(
                    "gene_to_sequence",
                    &json!({"gene_name": "TP53", "output_format": "embl"})
                )
                .is_err()
        );
    }

    #[test]
    fn search_gene_info_reports_summary_fields() {
        let server = tp53_server();
        let output = server
            .call_tool("search_gene_info", &json!({"gene_name": "tp53"}))
            .expect("tool output");
        assert!(output.text.contains("🆔 Gene ID: 7157"));
        assert!(output.text.contains("📝 Description: tumor protein p53"));
        assert!(output.text.contains("🗺️ Map Location: 17p13.1"));
        assert!(output.text.contains("📏 Length: 19,069 bp"));
        let structured = output.structured.expect("structured");
        assert_eq!(structured["candidate_records"], 4);
        assert_eq!(
            structured["location"]["provenance"],
            "historical:RS_2024_08:GCF_000001405.40"
        );
        assert!(server.client.fetches.borrow().is_empty());
    }

    #[test]
    fn get_genomic_sequence_normalizes_range() {
        let server = tp53_server();
        let output = server
            .call_tool(
                "get_genomic_sequence",
                &json!({"chromosome": "NC_000017.11", "start": "7687489", "end": 7668420}),
            )
            .expect("tool output");
        assert!(output.text.contains("NC_000017.11:7,668,420-7,687,489"));
        assert!(output.text.contains("📏 Requested Length: 19,070 bp"));
        assert_eq!(server.client.fetches.borrow()[0].1, 7668420);
        let err = server
            .call_tool(
                "get_genomic_sequence",
                &json!({"chromosome": "NC_000017.11", "start": 0, "end": 10}),
            )
            .expect_err("zero start");
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn geo_search_renders_datasets_and_clamps_results() {
        let server = tp53_server();
        let output = server
            .call_tool(
                "search_geo_datasets",
                &json!({"disease": "glioblastoma", "max_results": 500}),
            )
            .expect("tool output");
        assert!(output.text.contains("📊 Found: 2 datasets"));
        assert!(output.text.contains("📋 Dataset #1: GSE245678"));
        assert!(output.text.contains("🔬 Single-cell RNA-seq"));
        assert!(output.text.contains("🧪 Bulk RNA-seq"));
        assert!(output.text.contains("🏷️ Study Type: GEO Series"));
        assert!(
            output
                .text
                .contains("https://www.ncbi.nlm.nih.gov/geo/query/acc.cgi?acc=GSE111111")
        );
        let terms = server.client.terms.borrow();
        assert_eq!(terms[0].1, geo::MAX_RESULTS_LIMIT);
        assert!(terms[0].0.starts_with("\"glioblastoma\"[All Fields] AND \"human\"[Organism]"));
    }

    #[test]
    fn geo_search_requires_query_and_reports_empty_results() {
        let server = GeneServer::new(FakeNcbi::default(), SelectionPolicy::default());
        let err = server
            .call_tool("search_geo_datasets", &json!({}))
            .expect_err("missing query");
        assert_eq!(err.code, ErrorCode::InvalidInput);
        let err = server
            .call_tool("search_geo_datasets", &json!({"query": "nothing"}))
            .expect_err("no results");
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn long_geo_summaries_are_truncated() {
        let long = "x".repeat(400);
        let fake = FakeNcbi {
            datasets: vec![GeoDataset {
                accession: Some("GSE1".to_string()),
                summary: Some(long),
                ..GeoDataset::default()
            }],
            ..FakeNcbi::default()
        };
        let server = GeneServer::new(fake, SelectionPolicy::default());
        let output = server
            .call_tool("search_geo_datasets", &json!({"query": "x"}))
            .expect("tool output");
        let expected = format!("📄 Summary: {}...", "x".repeat(geo::SUMMARY_CHARS));
        assert!(output.text.contains(&expected));
    }

    #[test]
    fn tool_list_names_all_tools() {
        let server = tp53_server();
        let names = server
            .tool_list()
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|tool| tool["name"].as_str().map(ToString::to_string))
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "gene_to_sequence",
                "search_gene_info",
                "get_genomic_sequence",
                "search_geo_datasets"
            ]
        );
        assert!(server.call_tool("nope", &json!({})).is_err());
    }
}
