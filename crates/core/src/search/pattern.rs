use regex::{Regex, RegexBuilder};

use super::SearchError;

/// Compile a user query as a regular expression.
pub fn compile_pattern(query: &str, case_insensitive: bool) -> Result<Regex, SearchError> {
    Ok(RegexBuilder::new(query)
        .case_insensitive(case_insensitive)
        .build()?)
}

/// Non-overlapping match spans of `regex` in `text`, left to right, as
/// `[start, end)` character offsets.
///
/// With `global` unset only the first match is returned. Empty matches
/// carry nothing to highlight and are skipped.
pub fn find_matches(regex: &Regex, text: &str, global: bool) -> Vec<[usize; 2]> {
    let mut spans = Vec::new();
    // Byte offsets to char offsets, advancing through the text once.
    let mut byte_cursor = 0;
    let mut char_cursor = 0;
    let mut to_char = |byte: usize| {
        char_cursor += text[byte_cursor..byte].chars().count();
        byte_cursor = byte;
        char_cursor
    };

    for m in regex.find_iter(text) {
        if m.is_empty() {
            continue;
        }
        let start = to_char(m.start());
        let end = to_char(m.end());
        spans.push([start, end]);
        if !global {
            break;
        }
    }
    spans
}
