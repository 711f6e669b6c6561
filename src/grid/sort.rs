//! Column sorting.
//!
//! Cells are compared lower-cased; when both sides start with a finite
//! number the numeric prefixes are compared, otherwise the strings are,
//! accents folded first so `émile` sorts next to `emile`.
//! That rule is not a total order across mixed columns, so rows are
//! ordered with a merge sort that tolerates any comparator.

use std::cmp::Ordering;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

/// Glyph shown on columns that are not the active sort column.
pub const NEUTRAL_GLYPH: &str = "⇅";

/// Active sort: original column index plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: usize,
    pub direction: SortDirection,
}

impl SortKey {
    /// Sort state after a click on `column`: the same column flips, a new
    /// one starts ascending.
    pub fn after_click(current: Option<SortKey>, column: usize) -> SortKey {
        match current {
            Some(key) if key.column == column => SortKey {
                column,
                direction: key.direction.toggled(),
            },
            _ => SortKey {
                column,
                direction: SortDirection::Ascending,
            },
        }
    }
}

/// Numeric value of the longest leading decimal literal, after leading
/// whitespace. `"10px"` is 10, `"abc"` has none.
pub fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    if text[end..].starts_with("Infinity") || text[end..].starts_with("infinity") {
        return Some(if bytes.first() == Some(&b'-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok()
}

/// Compare two cell texts by the grid's sorting rule.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    match (leading_number(&a), leading_number(&b)) {
        (Some(x), Some(y)) if x.is_finite() && y.is_finite() => {
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        _ => collation_key(&a).cmp(&collation_key(&b)).then_with(|| a.cmp(&b)),
    }
}

/// Decomposed text with combining marks dropped.
fn collation_key(text: &str) -> String {
    text.nfd().filter(|ch| !is_combining_mark(*ch)).collect()
}

/// Stable merge sort that never panics on an inconsistent comparator.
pub fn stable_sort_by<T, F>(items: &mut [T], mut compare: F)
where
    T: Clone,
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() < 2 {
        return;
    }
    let mut scratch = items.to_vec();
    merge_sort(items, &mut scratch, &mut compare);
}

fn merge_sort<T, F>(items: &mut [T], scratch: &mut [T], compare: &mut F)
where
    T: Clone,
    F: FnMut(&T, &T) -> Ordering,
{
    let len = items.len();
    if len < 2 {
        return;
    }
    let mid = len / 2;
    {
        let (left, right) = items.split_at_mut(mid);
        let (scratch_left, scratch_right) = scratch.split_at_mut(mid);
        merge_sort(left, scratch_left, compare);
        merge_sort(right, scratch_right, compare);
    }

    scratch[..len].clone_from_slice(items);
    let (mut i, mut j) = (0, mid);
    for slot in items.iter_mut() {
        // Take from the right half only when strictly smaller.
        let take_right = i >= mid
            || (j < len && compare(&scratch[j], &scratch[i]) == Ordering::Less);
        if take_right {
            *slot = scratch[j].clone();
            j += 1;
        } else {
            *slot = scratch[i].clone();
            i += 1;
        }
    }
}

/// Row order for `key`, always derived from the original row order.
pub fn sorted_order(texts: &[String], direction: SortDirection) -> Vec<usize> {
    let mut order: Vec<usize> = (0..texts.len()).collect();
    stable_sort_by(&mut order, |&a, &b| {
        let ordering = compare_cells(&texts[a], &texts[b]);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accents_sort_with_base_letters() {
        assert_eq!(compare_cells("émile", "zoe"), Ordering::Less);
        assert_eq!(compare_cells("Émile", "emma"), Ordering::Less);
        assert_eq!(compare_cells("emile", "émile"), Ordering::Less);
        let texts: Vec<String> = ["zoe", "émile", "Eve"].iter().map(|t| t.to_string()).collect();
        assert_eq!(sorted_order(&texts, SortDirection::Ascending), vec![1, 2, 0]);
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("10"), Some(10.0));
        assert_eq!(leading_number("  -2.5kg"), Some(-2.5));
        assert_eq!(leading_number(".5"), Some(0.5));
        assert_eq!(leading_number("5."), Some(5.0));
        assert_eq!(leading_number("1e3x"), Some(1000.0));
        assert_eq!(leading_number("1e"), Some(1.0));
        assert_eq!(leading_number("."), None);
        assert_eq!(leading_number("abc"), None);
        assert_eq!(leading_number(""), None);
        assert_eq!(leading_number("-Infinity"), Some(f64::NEG_INFINITY));
    }

    #[test]
    fn test_numeric_before_lexicographic() {
        assert_eq!(compare_cells("2", "10"), Ordering::Less);
        assert_eq!(compare_cells("Bob", "alice"), Ordering::Greater);
        assert_eq!(compare_cells("10", "abc"), Ordering::Less);
    }

    #[test]
    fn test_sort_is_stable_both_ways() {
        let texts: Vec<String> = ["b", "a", "B", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(sorted_order(&texts, SortDirection::Ascending), vec![1, 3, 0, 2]);
        assert_eq!(sorted_order(&texts, SortDirection::Descending), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_inconsistent_comparator_does_not_panic() {
        let texts: Vec<String> = ["10", "9a", "x", "2", "b", "1e1", "", "-3"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let order = sorted_order(&texts, SortDirection::Ascending);
        let mut seen = order.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..texts.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_click_cycles_direction() {
        let key = SortKey::after_click(None, 2);
        assert_eq!(key.direction, SortDirection::Ascending);
        let key = SortKey::after_click(Some(key), 2);
        assert_eq!(key.direction, SortDirection::Descending);
        let key = SortKey::after_click(Some(key), 0);
        assert_eq!(key, SortKey { column: 0, direction: SortDirection::Ascending });
    }
}
