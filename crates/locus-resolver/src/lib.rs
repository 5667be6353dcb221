//! Selection of one genomic location per gene.
//!
//! A gene record source reports a "current" location plus a history of
//! locations tagged with the annotation release and assembly they were valid
//! under. [`resolve`] picks exactly one of them, preferring the most recent
//! release family and the primary reference assembly, and reports which path
//! was taken. The computation is pure: no I/O, no logging, no shared state.

mod policy;
mod record;
mod resolve;

pub use policy::{DEFAULT_ASSEMBLY_FAMILY, DEFAULT_RELEASE_FAMILY, SelectionPolicy};
pub use record::{GenomicRecord, MalformedRecord};
pub use resolve::{Provenance, ResolutionError, ResolvedCoordinate, resolve, resolve_with};
