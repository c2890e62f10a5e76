//! Mapping match ranges from an untrimmed name onto its center-trimmed label.

use thiserror::Error;

use crate::text::TrimRegion;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HighlightError {
    #[error("match bounds {bounds:?} cannot be mapped through trim region {trim:?}")]
    Unmapped { bounds: [usize; 2], trim: TrimRegion },
}

/// Remap the `[b0, b1)` match `bounds` of the untrimmed text into the
/// coordinates of the trimmed text described by `trim`.
///
/// A match touching the collapsed region is drawn over the ellipsis, which
/// sits at `trim.start`; everything after the region moves left by
/// `trim.length - 1`.
pub fn compute_highlighted_bounds(
    bounds: [usize; 2],
    trim: &TrimRegion,
) -> Result<[usize; 2], HighlightError> {
    let [b0, b1] = bounds;
    if trim.length == 0 {
        return Ok(bounds);
    }
    let shift = trim.length - 1;

    let starts_before = b0 < trim.start;
    let starts_inside = b0 >= trim.start && b0 < trim.end;
    let ends_inside = b1 > trim.start && b1 <= trim.end;
    let ends_after = b1 > trim.end;

    if b0 > b1 {
        Err(HighlightError::Unmapped {
            bounds,
            trim: *trim,
        })
    } else if b1 <= trim.start {
        Ok(bounds)
    } else if b0 >= trim.end {
        Ok([b0 - shift, b1 - shift])
    } else if starts_inside && ends_inside {
        Ok([trim.start, trim.start + 1])
    } else if starts_before && ends_inside {
        Ok([b0, trim.start + 1])
    } else if starts_before && ends_after {
        Ok([b0, b1 - shift])
    } else if starts_inside && ends_after {
        Ok([trim.start, b1 - shift])
    } else {
        Err(HighlightError::Unmapped {
            bounds,
            trim: *trim,
        })
    }
}

/// Remap every range of a match, merging ranges that collapse onto the same
/// characters.
pub fn highlight_ranges(
    ranges: &[[usize; 2]],
    trim: &TrimRegion,
) -> Result<Vec<[usize; 2]>, HighlightError> {
    let mut out: Vec<[usize; 2]> = Vec::with_capacity(ranges.len());
    for &range in ranges {
        let mapped = compute_highlighted_bounds(range, trim)?;
        match out.last_mut() {
            Some(last) if mapped[0] <= last[1] => last[1] = last[1].max(mapped[1]),
            _ => out.push(mapped),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::trim_text_center;

    // "abcdefghij" at budget 5 shows "ab…hij", collapsing [2, 7).
    fn trim() -> TrimRegion {
        TrimRegion {
            start: 2,
            end: 7,
            length: 5,
        }
    }

    #[test]
    fn before_region_is_unchanged() {
        assert_eq!(compute_highlighted_bounds([0, 2], &trim()), Ok([0, 2]));
    }

    #[test]
    fn inside_region_collapses_to_ellipsis() {
        assert_eq!(compute_highlighted_bounds([3, 5], &trim()), Ok([2, 3]));
        assert_eq!(compute_highlighted_bounds([2, 7], &trim()), Ok([2, 3]));
    }

    #[test]
    fn after_region_shifts_left() {
        // "hi" is [7, 9) untrimmed and [3, 5) in "ab…hij".
        assert_eq!(compute_highlighted_bounds([7, 9], &trim()), Ok([3, 5]));
    }

    #[test]
    fn straddling_the_start_ends_on_ellipsis() {
        assert_eq!(compute_highlighted_bounds([1, 4], &trim()), Ok([1, 3]));
    }

    #[test]
    fn spanning_the_region() {
        assert_eq!(compute_highlighted_bounds([1, 9], &trim()), Ok([1, 5]));
    }

    #[test]
    fn straddling_the_end_starts_on_ellipsis() {
        assert_eq!(compute_highlighted_bounds([4, 8], &trim()), Ok([2, 4]));
    }

    #[test]
    fn untrimmed_text_is_identity() {
        let none = TrimRegion::default();
        assert_eq!(compute_highlighted_bounds([3, 8], &none), Ok([3, 8]));
    }

    #[test]
    fn inverted_bounds_fail_loudly() {
        assert_eq!(
            compute_highlighted_bounds([6, 4], &trim()),
            Err(HighlightError::Unmapped {
                bounds: [6, 4],
                trim: trim()
            })
        );
    }

    #[test]
    fn mapped_ranges_select_the_same_text() {
        let original = "abcdefghij";
        let trimmed = trim_text_center(original, 5);
        let shown: Vec<char> = trimmed.text.chars().collect();
        let mapped = compute_highlighted_bounds([8, 10], &trimmed.trim).expect("maps");
        let selected: String = shown[mapped[0]..mapped[1]].iter().collect();
        assert_eq!(selected, "ij");
    }

    #[test]
    fn collapsed_ranges_merge() {
        let ranges = [[0, 1], [3, 4], [5, 6], [8, 9]];
        assert_eq!(highlight_ranges(&ranges, &trim()), Ok(vec![[0, 1], [2, 3], [4, 5]]));
    }
}
