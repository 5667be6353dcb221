use serde::{Deserialize, Serialize};

pub const DEFAULT_RELEASE_FAMILY: &str = "RS_2024";
pub const DEFAULT_ASSEMBLY_FAMILY: &str = "GCF_000001405.";

/// Which label families count as "most recent release" and "primary
/// assembly", and where their numeric suffix starts.
///
/// The numeric suffix of a label is the text after the last separator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPolicy {
    pub release_family_prefix: String,
    pub release_separator: char,
    pub assembly_family_prefix: String,
    pub assembly_separator: char,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            release_family_prefix: DEFAULT_RELEASE_FAMILY.to_string(),
            release_separator: '_',
            assembly_family_prefix: DEFAULT_ASSEMBLY_FAMILY.to_string(),
            assembly_separator: '.',
        }
    }
}

impl SelectionPolicy {
    pub fn with_release_family(mut self, prefix: impl Into<String>) -> Self {
        self.release_family_prefix = prefix.into();
        self
    }

    pub fn with_assembly_family(mut self, prefix: impl Into<String>) -> Self {
        self.assembly_family_prefix = prefix.into();
        self
    }

    /// Release recency rule.
    pub(crate) fn release_outranks(&self, candidate: &str, best: Option<&str>) -> bool {
        family_outranks(
            &self.release_family_prefix,
            self.release_separator,
            candidate,
            best,
        )
    }

    /// Assembly primacy rule.
    pub(crate) fn assembly_outranks(&self, candidate: &str, best: Option<&str>) -> bool {
        family_outranks(
            &self.assembly_family_prefix,
            self.assembly_separator,
            candidate,
            best,
        )
    }
}

fn trailing_number(label: &str, separator: char) -> Option<u64> {
    label.rsplit(separator).next()?.trim().parse::<u64>().ok()
}

// A candidate without a parsable suffix never wins, and neither does one that
// meets an in-family best whose own suffix cannot be parsed.
fn family_outranks(prefix: &str, separator: char, candidate: &str, best: Option<&str>) -> bool {
    if !candidate.starts_with(prefix) {
        return false;
    }
    let Some(candidate_number) = trailing_number(candidate, separator) else {
        return false;
    };
    match best {
        Some(best) if best.starts_with(prefix) => trailing_number(best, separator)
            .is_some_and(|best_number| candidate_number > best_number),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_family_label_beats_out_of_family_and_empty_best() {
        let policy = SelectionPolicy::default();
        assert!(policy.release_outranks("RS_2024_08", None));
        assert!(policy.release_outranks("RS_2024_08", Some("RS_2023_10")));
        assert!(!policy.release_outranks("RS_2023_10", None));
    }

    #[test]
    fn within_family_higher_suffix_wins() {
        let policy = SelectionPolicy::default();
        assert!(policy.release_outranks("RS_2024_08", Some("RS_2024_03")));
        assert!(!policy.release_outranks("RS_2024_03", Some("RS_2024_08")));
        assert!(!policy.release_outranks("RS_2024_08", Some("RS_2024_08")));
        assert!(policy.assembly_outranks("GCF_000001405.40", Some("GCF_000001405.39")));
        assert!(!policy.assembly_outranks("GCF_000001405.25", Some("GCF_000001405.40")));
    }

    #[test]
    fn unparsable_suffix_never_wins() {
        let policy = SelectionPolicy::default();
        assert!(!policy.release_outranks("RS_2024_final", None));
        assert!(!policy.release_outranks("RS_2024_final", Some("RS_2023_10")));
        assert!(!policy.release_outranks("RS_2024_09", Some("RS_2024_final")));
    }

    #[test]
    fn custom_family_prefix() {
        let policy = SelectionPolicy::default().with_release_family("REL_2024");
        assert!(policy.release_outranks("REL_2024_07", Some("REL_2024_03")));
        assert!(!policy.release_outranks("RS_2024_07", None));
    }
}
