use once_cell::sync::Lazy;
use regex::Regex;

const EDUCATION_MARKER: &str = "EDUCATION";

/// A section header: a line made only of uppercase ASCII letters.
static SECTION_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[A-Z]+\n").expect("header pattern is valid"));

/// Removes the first education block from a resume.
///
/// The block starts at the first case-sensitive `EDUCATION` and runs up to,
/// but not including, the newline that opens the next header line. With no
/// later header the block runs to the end of the text. This is a heuristic
/// over typical resume layouts and is kept greedy on purpose: a resume with
/// education as its last section loses everything after the marker.
pub fn strip_education_section(text: &str) -> String {
    let Some(start) = text.find(EDUCATION_MARKER) else {
        return text.to_string();
    };
    let end = SECTION_HEADER_RE
        .find_at(text, start + EDUCATION_MARKER.len())
        .map(|m| m.start())
        .unwrap_or(text.len());

    let mut stripped = String::with_capacity(text.len() - (end - start));
    stripped.push_str(&text[..start]);
    stripped.push_str(&text[end..]);
    stripped
}
