use serde::{Deserialize, Serialize};

/// One candidate location for a gene, as reported by the record source.
///
/// `start` and `end` are kept in source order; reverse-strand genes are
/// commonly reported with `start > end`. Coordinate fields are optional so a
/// record that lacks one can still be carried and skipped during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomicRecord {
    pub chromosome_accession: Option<String>,
    pub start: Option<u64>,
    pub end: Option<u64>,
    pub annotation_release: Option<String>,
    pub assembly_accession: Option<String>,
    pub is_current: bool,
}

/// A record that could not be used because a coordinate field was missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedRecord {
    /// Position of the record in the resolver input.
    pub index: usize,
    pub missing: String,
}

impl GenomicRecord {
    pub fn current(chromosome_accession: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chromosome_accession: Some(chromosome_accession.into()),
            start: Some(start),
            end: Some(end),
            annotation_release: None,
            assembly_accession: None,
            is_current: true,
        }
    }

    pub fn historical(
        annotation_release: impl Into<String>,
        assembly_accession: impl Into<String>,
        chromosome_accession: impl Into<String>,
        start: u64,
        end: u64,
    ) -> Self {
        Self {
            chromosome_accession: Some(chromosome_accession.into()),
            start: Some(start),
            end: Some(end),
            annotation_release: Some(annotation_release.into()),
            assembly_accession: Some(assembly_accession.into()),
            is_current: false,
        }
    }

    /// Returns the chromosome/start/end triple, or the name of the first
    /// missing field.
    pub fn coordinates(&self) -> Result<(&str, u64, u64), &'static str> {
        let chromosome = non_empty(self.chromosome_accession.as_deref())
            .ok_or("chromosome_accession")?;
        let start = self.start.ok_or("start")?;
        let end = self.end.ok_or("end")?;
        Ok((chromosome, start, end))
    }

    pub fn release_label(&self) -> Option<&str> {
        non_empty(self.annotation_release.as_deref())
    }

    pub fn assembly_label(&self) -> Option<&str> {
        non_empty(self.assembly_accession.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
