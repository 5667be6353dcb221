use crate::{GenomicRecord, MalformedRecord, SelectionPolicy};
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// Which input record the resolved coordinate came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    Current,
    Historical { release: String, assembly: String },
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Historical { release, assembly } => {
                write!(f, "historical:{release}:{assembly}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCoordinate {
    pub chromosome_accession: String,
    /// Always `<= end`.
    pub start: u64,
    pub end: u64,
    pub provenance: Provenance,
    /// Records dropped because a coordinate field was missing.
    pub skipped: Vec<MalformedRecord>,
}

impl ResolvedCoordinate {
    pub fn span(&self) -> u64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionError {
    NoRecordsFound,
    NoCoordinatesResolved { malformed: usize },
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRecordsFound => write!(f, "No genomic records found"),
            Self::NoCoordinatesResolved { malformed } => write!(
                f,
                "No record carries a usable chromosome/start/end triple ({malformed} malformed record(s) skipped)"
            ),
        }
    }
}

impl Error for ResolutionError {}

struct Candidate<'a> {
    chromosome: &'a str,
    start: u64,
    end: u64,
}

impl<'a> Candidate<'a> {
    fn normalized((chromosome, a, b): (&'a str, u64, u64)) -> Self {
        Self {
            chromosome,
            start: a.min(b),
            end: a.max(b),
        }
    }

    fn into_resolved(self, provenance: Provenance, skipped: Vec<MalformedRecord>) -> ResolvedCoordinate {
        ResolvedCoordinate {
            chromosome_accession: self.chromosome.to_string(),
            start: self.start,
            end: self.end,
            provenance,
            skipped,
        }
    }
}

/// Resolves with the default [`SelectionPolicy`].
pub fn resolve(records: &[GenomicRecord]) -> Result<ResolvedCoordinate, ResolutionError> {
    resolve_with(&SelectionPolicy::default(), records)
}

/// Picks exactly one record.
///
/// The first usable current record is the fallback. Historical records that
/// carry both a release and an assembly label are scanned in order; one
/// replaces the running best when either the release recency rule or the
/// assembly primacy rule ranks it higher. The two rules are OR-ed, not
/// combined into a single score. A historical winner takes precedence over
/// the current record.
pub fn resolve_with(
    policy: &SelectionPolicy,
    records: &[GenomicRecord],
) -> Result<ResolvedCoordinate, ResolutionError> {
    if records.is_empty() {
        return Err(ResolutionError::NoRecordsFound);
    }

    let mut skipped = Vec::new();
    let mut baseline: Option<Candidate> = None;
    let mut best: Option<(Candidate, &str, &str)> = None;
    let mut best_release: Option<&str> = None;
    let mut best_assembly: Option<&str> = None;

    for (index, record) in records.iter().enumerate() {
        if record.is_current {
            if baseline.is_some() {
                continue;
            }
            match record.coordinates() {
                Ok(coords) => baseline = Some(Candidate::normalized(coords)),
                Err(missing) => skipped.push(MalformedRecord {
                    index,
                    missing: missing.to_string(),
                }),
            }
            continue;
        }

        let (Some(release), Some(assembly)) = (record.release_label(), record.assembly_label())
        else {
            continue;
        };
        let coords = match record.coordinates() {
            Ok(coords) => coords,
            Err(missing) => {
                skipped.push(MalformedRecord {
                    index,
                    missing: missing.to_string(),
                });
                continue;
            }
        };

        let release_wins = policy.release_outranks(release, best_release);
        let assembly_wins = policy.assembly_outranks(assembly, best_assembly);
        if release_wins || assembly_wins {
            best = Some((Candidate::normalized(coords), release, assembly));
            best_release = Some(release);
            best_assembly = Some(assembly);
        }
    }

    if let Some((candidate, release, assembly)) = best {
        let provenance = Provenance::Historical {
            release: release.to_string(),
            assembly: assembly.to_string(),
        };
        return Ok(candidate.into_resolved(provenance, skipped));
    }
    if let Some(candidate) = baseline {
        return Ok(candidate.into_resolved(Provenance::Current, skipped));
    }
    Err(ResolutionError::NoCoordinatesResolved {
        malformed: skipped.len(),
    })
}
