//! Frame-name search: fuzzy and pattern matchers plus the highlight remapper
//! used to draw their results on trimmed labels.

pub mod fuzzy;
pub mod highlight;
pub mod pattern;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{FlattenedFrames, FrameKey};

pub use fuzzy::{FuzzyMatch, fuzzy_match};
pub use highlight::{HighlightError, compute_highlighted_bounds, highlight_ranges};
pub use pattern::{compile_pattern, find_matches};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Fuzzy,
    Pattern {
        case_insensitive: bool,
        global: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub mode: SearchMode,
}

impl SearchQuery {
    pub fn fuzzy(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: SearchMode::Fuzzy,
        }
    }

    pub fn pattern(text: impl Into<String>, case_insensitive: bool, global: bool) -> Self {
        Self {
            text: text.into(),
            mode: SearchMode::Pattern {
                case_insensitive,
                global,
            },
        }
    }

    /// Interpret search-box input. `/body/flags` is a pattern query with the
    /// `i` (case-insensitive) and `g` (every match) flags; anything else is
    /// fuzzy.
    pub fn parse(input: &str) -> Self {
        if let Some(rest) = input.strip_prefix('/')
            && let Some(slash) = rest.rfind('/')
        {
            let (body, flags) = (&rest[..slash], &rest[slash + 1..]);
            if !body.is_empty() && flags.chars().all(|c| "gmiyuvsd".contains(c)) {
                return Self::pattern(body, flags.contains('i'), flags.contains('g'));
            }
        }
        Self::fuzzy(input)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub key: FrameKey,
    pub score: i64,
    /// Ordered `[start, end)` character ranges of the frame name.
    pub ranges: Vec<[usize; 2]>,
}

/// Matches of one query, keyed by frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    matches: HashMap<FrameKey, SearchMatch>,
}

impl SearchResults {
    pub fn get(&self, key: FrameKey) -> Option<&SearchMatch> {
        self.matches.get(&key)
    }

    pub fn contains(&self, key: FrameKey) -> bool {
        self.matches.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SearchMatch> {
        self.matches.values()
    }

    /// Matches by descending score, ties broken by frame start then key.
    /// Keys absent from `frames` are dropped.
    pub fn ranked<'m>(&'m self, frames: &FlattenedFrames<'_>) -> Vec<&'m SearchMatch> {
        let mut ranked: Vec<(&SearchMatch, f64)> = self
            .matches
            .values()
            .filter_map(|m| {
                let index = frames.index_of(m.key)?;
                Some((m, frames.get(index)?.start))
            })
            .collect();
        ranked.sort_by(|(a, a_start), (b, b_start)| {
            b.score
                .cmp(&a.score)
                .then(a_start.total_cmp(b_start))
                .then(a.key.cmp(&b.key))
        });
        ranked.into_iter().map(|(m, _)| m).collect()
    }
}

impl FromIterator<SearchMatch> for SearchResults {
    fn from_iter<I: IntoIterator<Item = SearchMatch>>(iter: I) -> Self {
        let mut matches = HashMap::new();
        for m in iter {
            matches.entry(m.key).or_insert(m);
        }
        Self { matches }
    }
}

/// Run `query` over the name of every frame.
///
/// An empty query yields no results. Pattern matches score by the number of
/// characters they cover.
pub fn search_frames(
    frames: &FlattenedFrames<'_>,
    query: &SearchQuery,
) -> Result<SearchResults, SearchError> {
    if query.is_empty() {
        return Ok(SearchResults::default());
    }

    let results: SearchResults = match query.mode {
        SearchMode::Fuzzy => {
            let pattern: Vec<char> = query
                .text
                .chars()
                .map(flamelens_protocol::frame_name::fold_char)
                .collect();
            frames
                .iter()
                .filter_map(|frame| {
                    let m = fuzzy::fuzzy_match_folded(
                        frame.name.chars(),
                        frame.name.folded(),
                        &pattern,
                    )?;
                    Some(SearchMatch {
                        key: frame.key,
                        score: m.score,
                        ranges: m.matches,
                    })
                })
                .collect()
        }
        SearchMode::Pattern {
            case_insensitive,
            global,
        } => {
            let regex = compile_pattern(&query.text, case_insensitive)?;
            frames
                .iter()
                .filter_map(|frame| {
                    let ranges = find_matches(&regex, frame.name.as_str(), global);
                    if ranges.is_empty() {
                        return None;
                    }
                    let covered: usize = ranges.iter().map(|[s, e]| e - s).sum();
                    Some(SearchMatch {
                        key: frame.key,
                        score: i64::try_from(covered).unwrap_or(i64::MAX),
                        ranges,
                    })
                })
                .collect()
        }
    };

    log::debug!(
        "search {:?} over {} frames: {} hits",
        query.text,
        frames.len(),
        results.len()
    );
    Ok(results)
}
