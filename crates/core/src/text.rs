//! Center-trimming of frame labels.
//!
//! All offsets are character offsets, matching the search match ranges.

use serde::{Deserialize, Serialize};

pub const ELLIPSIS: char = '…';

/// The half-open region `[start, end)` of the untrimmed text that was
/// collapsed into a single ellipsis at `start`. `length` is `end - start`;
/// zero means nothing was trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrimRegion {
    pub start: usize,
    pub end: usize,
    pub length: usize,
}

impl TrimRegion {
    pub fn is_trimmed(&self) -> bool {
        self.length > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimmedText {
    pub text: String,
    pub trim: TrimRegion,
}

/// Shorten `text` around an ellipsis placed in the middle. The result is
/// `budget + 1` characters long counting the ellipsis.
///
/// Text that already fits is returned unchanged with an empty trim region.
/// Otherwise the result is `prefix + "…" + suffix` with `floor(budget/2)`
/// prefix characters, `budget - floor(budget/2)` suffix characters, and the
/// removed region reported for [`crate::search::highlight`].
pub fn trim_text_center(text: &str, budget: usize) -> TrimmedText {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= budget {
        return TrimmedText {
            text: text.to_string(),
            trim: TrimRegion::default(),
        };
    }

    let prefix_length = budget / 2;
    let postfix_length = budget - prefix_length - usize::from(budget > 0);
    let start = prefix_length;
    let end = chars.len() - postfix_length - usize::from(budget > 0);

    let mut trimmed = String::with_capacity(budget + 1);
    trimmed.extend(&chars[..start]);
    trimmed.push(ELLIPSIS);
    trimmed.extend(&chars[end..]);

    TrimmedText {
        text: trimmed,
        trim: TrimRegion {
            start,
            end,
            length: end - start,
        },
    }
}

/// The longest center-trimmed form of `text` whose measured width fits in
/// `max_width`, or `None` when not even a lone ellipsis fits.
///
/// `measure` returns the rendered width of a string in the same unit as
/// `max_width` and must be monotonic in the string length.
pub fn fit_text_to_width(
    text: &str,
    max_width: f64,
    measure: impl Fn(&str) -> f64,
) -> Option<TrimmedText> {
    if measure(text) <= max_width {
        return Some(trim_text_center(text, usize::MAX));
    }

    let len = text.chars().count();
    let mut best = None;
    let (mut low, mut high) = (0usize, len.saturating_sub(1));
    while low <= high {
        let mid = low + (high - low) / 2;
        let candidate = trim_text_center(text, mid);
        if measure(&candidate.text) <= max_width {
            best = Some(candidate);
            low = mid + 1;
        } else if mid == 0 {
            break;
        } else {
            high = mid - 1;
        }
    }
    best
}
