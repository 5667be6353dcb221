//! GEO DataSets query building and dataset classification.

use crate::eutils_xml::GeoDataset;
use serde::Serialize;

pub const DEFAULT_STUDY_TYPE: &str = "Expression profiling by high throughput sequencing";
pub const MAX_RESULTS_LIMIT: usize = 50;
pub const SUMMARY_CHARS: usize = 300;

const SINGLE_CELL_INDICATORS: &[&str] = &[
    "single cell",
    "single-cell",
    "scrna",
    "sc-rna",
    "scrnaseq",
    "drop-seq",
    "dropseq",
    "10x genomics",
    "10x chromium",
    "smart-seq",
    "cell ranger",
    "cellranger",
];

const SPATIAL_INDICATORS: &[&str] = &[
    "spatial transcriptom",
    "spatially resolved",
    "visium",
    "slide-seq",
    "slideseq",
    "merfish",
    "seqfish",
    "in situ sequencing",
    "spatial",
];

const BULK_INDICATORS: &[&str] = &["bulk", "total rna", "rna-seq", "rnaseq"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    SingleCell,
    Spatial,
    Bulk,
    Unclear,
}

impl DataType {
    pub fn label(self) -> &'static str {
        match self {
            Self::SingleCell => "🔬 Single-cell RNA-seq",
            Self::Spatial => "🗺️ Spatial transcriptomics",
            Self::Bulk => "🧪 Bulk RNA-seq",
            Self::Unclear => "🧬 RNA-seq (type unclear)",
        }
    }
}

/// Keyword classification over title, summary and platform. Single-cell
/// indicators are checked first, then spatial, then bulk.
pub fn classify(dataset: &GeoDataset) -> DataType {
    let text = [
        dataset.title.as_deref(),
        dataset.summary.as_deref(),
        dataset.platform.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase();

    let contains_any = |indicators: &[&str]| indicators.iter().any(|i| text.contains(i));
    if contains_any(SINGLE_CELL_INDICATORS) {
        DataType::SingleCell
    } else if contains_any(SPATIAL_INDICATORS) {
        DataType::Spatial
    } else if contains_any(BULK_INDICATORS) {
        DataType::Bulk
    } else {
        DataType::Unclear
    }
}

pub fn study_type_description(entry_type: &str) -> String {
    match entry_type {
        "GSE" => "GEO Series".to_string(),
        "GDS" => "GEO Curated DataSet".to_string(),
        "GPL" => "GEO Platform".to_string(),
        "GSM" => "GEO Sample".to_string(),
        "SAGE" => "SAGE (Serial Analysis of Gene Expression)".to_string(),
        "Array" => "Microarray Expression Profiling".to_string(),
        "ChIP-chip" => "ChIP-chip (Chromatin Immunoprecipitation)".to_string(),
        "Protein profiling" => "Protein Expression Profiling".to_string(),
        "SNP" => "SNP (Single Nucleotide Polymorphism) Analysis".to_string(),
        "Methylation profiling" => "DNA Methylation Profiling".to_string(),
        "RNA-Seq" => "RNA Sequencing (RNA-Seq)".to_string(),
        "ChIP-Seq" => "ChIP-Seq (Chromatin Immunoprecipitation Sequencing)".to_string(),
        "Bisulfite-Seq" => "Bisulfite Sequencing".to_string(),
        "Other" => "Other High-Throughput Study".to_string(),
        other => format!("{other} Expression Study"),
    }
}

pub fn search_term(query: &str, organism: &str, study_type: &str) -> String {
    let mut parts = vec![
        format!("\"{query}\"[All Fields]"),
        format!("\"{organism}\"[Organism]"),
    ];
    if !study_type.trim().is_empty() {
        parts.push(format!("\"{study_type}\"[DataSet Type]"));
    }
    parts.join(" AND ")
}

pub fn clamp_max_results(requested: Option<u64>) -> usize {
    let requested = requested.unwrap_or(10);
    requested.clamp(1, MAX_RESULTS_LIMIT as u64) as usize
}

pub fn geo_link(accession: &str) -> String {
    format!("https://www.ncbi.nlm.nih.gov/geo/query/acc.cgi?acc={accession}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(title: &str, summary: &str) -> GeoDataset {
        GeoDataset {
            title: Some(title.to_string()),
            summary: Some(summary.to_string()),
            ..GeoDataset::default()
        }
    }

    #[test]
    fn classification_prefers_single_cell_then_spatial_then_bulk() {
        assert_eq!(
            classify(&dataset("Spatial and single-cell atlas", "")),
            DataType::SingleCell
        );
        assert_eq!(
            classify(&dataset("Visium profiling of cortex", "")),
            DataType::Spatial
        );
        assert_eq!(classify(&dataset("Liver biopsies", "bulk RNA-seq")), DataType::Bulk);
        assert_eq!(classify(&dataset("Liver biopsies", "")), DataType::Unclear);
    }

    #[test]
    fn term_quotes_each_field() {
        assert_eq!(
            search_term("glioblastoma", "human", DEFAULT_STUDY_TYPE),
            "\"glioblastoma\"[All Fields] AND \"human\"[Organism] AND \
\"Expression profiling by high throughput sequencing\"[DataSet Type]"
        );
        assert_eq!(
            search_term("liver", "mouse", " "),
            "\"liver\"[All Fields] AND \"mouse\"[Organism]"
        );
    }

    #[test]
    fn max_results_is_clamped() {
        assert_eq!(clamp_max_results(None), 10);
        assert_eq!(clamp_max_results(Some(0)), 1);
        assert_eq!(clamp_max_results(Some(500)), MAX_RESULTS_LIMIT);
    }

    #[test]
    fn unknown_entry_types_get_generic_description() {
        assert_eq!(study_type_description("GSE"), "GEO Series");
        assert_eq!(study_type_description("Tiling"), "Tiling Expression Study");
    }
}
