//! fzf-style fuzzy matching (the v1 algorithm: one forward scan, one
//! backward scan, then scoring of the resulting window).

use flamelens_protocol::frame_name::fold_char;
use serde::{Deserialize, Serialize};

pub const SCORE_MATCH: i64 = 16;
pub const SCORE_GAP_START: i64 = -3;
pub const SCORE_GAP_EXTENSION: i64 = -1;

pub const BONUS_BOUNDARY: i64 = SCORE_MATCH / 2;
pub const BONUS_NON_WORD: i64 = SCORE_MATCH / 2;
pub const BONUS_CAMEL_123: i64 = BONUS_BOUNDARY + SCORE_GAP_EXTENSION;
pub const BONUS_CONSECUTIVE: i64 = -(SCORE_GAP_START + SCORE_GAP_EXTENSION);
/// A match on the very first character of the text outranks any other
/// boundary.
pub const BONUS_TEXT_START: i64 = BONUS_BOUNDARY + 2;
pub const BONUS_FIRST_CHAR_MULTIPLIER: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzyMatch {
    /// First matched character.
    pub start: usize,
    /// One past the last matched character.
    pub end: usize,
    pub score: i64,
    /// Matched characters as ordered, merged `[start, end)` runs.
    pub matches: Vec<[usize; 2]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    NonWord,
    Lower,
    Upper,
    Letter,
    Number,
}

fn char_class(c: char) -> CharClass {
    if c.is_lowercase() {
        CharClass::Lower
    } else if c.is_uppercase() {
        CharClass::Upper
    } else if c.is_numeric() {
        CharClass::Number
    } else if c.is_alphabetic() {
        CharClass::Letter
    } else {
        CharClass::NonWord
    }
}

fn bonus_for(prev: CharClass, class: CharClass) -> i64 {
    if prev == CharClass::NonWord && class != CharClass::NonWord {
        BONUS_BOUNDARY
    } else if (prev == CharClass::Lower && class == CharClass::Upper)
        || (prev != CharClass::Number && class == CharClass::Number)
    {
        BONUS_CAMEL_123
    } else if class == CharClass::NonWord {
        BONUS_NON_WORD
    } else {
        0
    }
}

/// Case-insensitive fuzzy match of `query` against `text`.
pub fn fuzzy_match(text: &str, query: &str) -> Option<FuzzyMatch> {
    let chars: Vec<char> = text.chars().collect();
    let folded: Vec<char> = chars.iter().copied().map(fold_char).collect();
    let pattern: Vec<char> = query.chars().map(fold_char).collect();
    fuzzy_match_folded(&chars, &folded, &pattern)
}

/// Match a pre-folded `pattern` against text given both as its original
/// characters (for scoring character classes) and its folded form.
///
/// Returns `None` unless every pattern character occurs in order.
pub fn fuzzy_match_folded(chars: &[char], folded: &[char], pattern: &[char]) -> Option<FuzzyMatch> {
    if pattern.is_empty() || pattern.len() > folded.len() {
        return None;
    }

    // Forward: end of the first complete in-order occurrence.
    let mut pidx = 0;
    let mut sidx = None;
    let mut eidx = None;
    for (idx, &c) in folded.iter().enumerate() {
        if c == pattern[pidx] {
            sidx.get_or_insert(idx);
            pidx += 1;
            if pidx == pattern.len() {
                eidx = Some(idx + 1);
                break;
            }
        }
    }
    let (mut sidx, eidx) = (sidx?, eidx?);

    // Backward from that end: the latest start still completing the match,
    // which collapses a sparse greedy window onto the tightest trailing run.
    let mut pidx = pattern.len();
    for idx in (sidx..eidx).rev() {
        if folded[idx] == pattern[pidx - 1] {
            pidx -= 1;
            if pidx == 0 {
                sidx = idx;
                break;
            }
        }
    }

    let (score, positions) = score_window(chars, folded, pattern, sidx, eidx);
    Some(FuzzyMatch {
        start: sidx,
        end: eidx,
        score,
        matches: merge_positions(&positions),
    })
}

fn score_window(
    chars: &[char],
    folded: &[char],
    pattern: &[char],
    sidx: usize,
    eidx: usize,
) -> (i64, Vec<usize>) {
    let mut score = 0;
    let mut in_gap = false;
    let mut consecutive = 0;
    let mut first_bonus = 0;
    let mut pidx = 0;
    let mut positions = Vec::with_capacity(pattern.len());
    let mut prev_class = if sidx > 0 {
        char_class(chars[sidx - 1])
    } else {
        CharClass::NonWord
    };

    for idx in sidx..eidx {
        let class = char_class(chars[idx]);
        if pidx < pattern.len() && folded[idx] == pattern[pidx] {
            positions.push(idx);
            score += SCORE_MATCH;
            let mut bonus = if idx == 0 {
                BONUS_TEXT_START
            } else {
                bonus_for(prev_class, class)
            };
            if consecutive == 0 {
                first_bonus = bonus;
            } else {
                if bonus >= BONUS_BOUNDARY {
                    first_bonus = bonus;
                }
                bonus = bonus.max(first_bonus).max(BONUS_CONSECUTIVE);
            }
            score += if pidx == 0 {
                bonus * BONUS_FIRST_CHAR_MULTIPLIER
            } else {
                bonus
            };
            in_gap = false;
            consecutive += 1;
            pidx += 1;
        } else {
            score += if in_gap {
                SCORE_GAP_EXTENSION
            } else {
                SCORE_GAP_START
            };
            in_gap = true;
            consecutive = 0;
            first_bonus = 0;
        }
        prev_class = class;
    }

    (score, positions)
}

fn merge_positions(positions: &[usize]) -> Vec<[usize; 2]> {
    let mut ranges: Vec<[usize; 2]> = Vec::new();
    for &p in positions {
        match ranges.last_mut() {
            Some(last) if last[1] == p => last[1] = p + 1,
            _ => ranges.push([p, p + 1]),
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(text: &str, query: &str) -> i64 {
        fuzzy_match(text, query).map_or(i64::MIN, |m| m.score)
    }

    #[test]
    fn requires_every_char_in_order() {
        assert!(fuzzy_match("render", "rdr").is_some());
        assert!(fuzzy_match("render", "rdx").is_none());
        assert!(fuzzy_match("render", "dr").is_some());
        assert!(fuzzy_match("abc", "cba").is_none());
        assert!(fuzzy_match("ab", "abc").is_none());
    }

    #[test]
    fn empty_query_never_matches() {
        assert!(fuzzy_match("anything", "").is_none());
        assert!(fuzzy_match("", "").is_none());
    }

    #[test]
    fn case_insensitive() {
        let m = fuzzy_match("ReactDOM.render", "dom").expect("matches");
        assert_eq!(m.matches, vec![[5, 8]]);
    }

    #[test]
    fn start_of_text_scores_higher() {
        assert!(score("f", "f") > score("of", "f"));
        assert!(score("f", "f") > score(" f", "f"));
        assert!(score("foo", "foo") > score("xfoo", "foo"));
    }

    #[test]
    fn contiguous_beats_gapped() {
        assert!(score("foo", "foo") > score("f oo", "foo"));
        assert!(score("xfoox", "foo") > score("xfoxo", "foo"));
    }

    #[test]
    fn larger_gaps_score_lower() {
        assert!(score("axb", "ab") > score("axxxb", "ab"));
    }

    #[test]
    fn resolves_to_tightest_trailing_run() {
        let m = fuzzy_match("a_____b___abc__", "abc").expect("matches");
        assert_eq!(m.matches, vec![[10, 13]]);
        assert_eq!(m.start, 10);
        assert_eq!(m.end, 13);
    }

    #[test]
    fn gapped_match_reports_each_run() {
        let m = fuzzy_match("fetch_user_data", "fud").expect("matches");
        assert_eq!(m.matches, vec![[0, 1], [6, 7], [11, 12]]);
    }

    #[test]
    fn merges_adjacent_positions() {
        assert_eq!(merge_positions(&[1, 2, 3, 7, 9, 10]), vec![[1, 4], [7, 8], [9, 11]]);
        assert!(merge_positions(&[]).is_empty());
    }
}
