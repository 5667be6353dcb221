use itertools::Itertools;

/// `7668421` -> `"7,668,421"`.
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let head = digits.len() % 3;
    let mut groups = Vec::new();
    if head > 0 {
        groups.push(&digits[..head]);
    }
    groups.extend(
        digits.as_bytes()[head..]
            .chunks(3)
            .filter_map(|chunk| std::str::from_utf8(chunk).ok()),
    );
    groups.into_iter().join(",")
}

/// Cuts `text` to at most `max_chars` characters, appending `...` when
/// anything was removed.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Number of residues in FASTA text, ignoring header lines and whitespace.
pub fn fasta_residue_count(fasta: &str) -> usize {
    fasta
        .lines()
        .filter(|line| !line.trim_start().starts_with('>'))
        .map(|line| line.chars().filter(|c| !c.is_whitespace()).count())
        .sum()
}

/// Number of residues in the `ORIGIN` block of GenBank flat-file text.
pub fn genbank_residue_count(genbank: &str) -> usize {
    genbank
        .lines()
        .skip_while(|line| !line.starts_with("ORIGIN"))
        .skip(1)
        .take_while(|line| !line.starts_with("//"))
        .map(|line| line.chars().filter(char::is_ascii_alphabetic).count())
        .sum()
}

pub fn rule(width: usize) -> String {
    "=".repeat(width)
}
