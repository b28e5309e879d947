//! Bracket-range hostpattern expansion.
//!
//! A hostpattern is a hostname containing zero or more numeric ranges of the
//! form `[NN-MM]`. Each range expands to every integer from `NN` to `MM`
//! inclusive, zero-padded to the width of the lower bound as written:
//!
//! ```
//! use fracture_types::hostpattern::expand;
//!
//! let hosts = expand("web[01-03].example.com").unwrap();
//! assert_eq!(hosts, ["web01.example.com", "web02.example.com", "web03.example.com"]);
//!
//! // No brackets: the pattern is a literal hostname.
//! assert_eq!(expand("db1.example.com").unwrap(), ["db1.example.com"]);
//! ```
//!
//! Several ranges in one pattern expand left to right as a cartesian product.

use crate::error::PatternError;

/// Most hostnames a single pattern may expand to.
pub const MAX_EXPANSION: usize = 100_000;

/// Expand a hostpattern into literal hostnames.
///
/// # Errors
///
/// Returns a [`PatternError`] for an empty pattern, unbalanced brackets,
/// non-numeric bounds, a reversed range, or an expansion larger than
/// [`MAX_EXPANSION`]. A malformed pattern never produces an empty or
/// partial expansion.
pub fn expand(pattern: &str) -> Result<Vec<String>, PatternError> {
    if pattern.is_empty() {
        return Err(PatternError::Empty);
    }
    expand_segment(pattern, pattern)
}

/// Expand every pattern in order and concatenate the results.
pub fn expand_all<I, S>(patterns: I) -> Result<Vec<String>, PatternError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hosts = Vec::new();
    for pattern in patterns {
        hosts.extend(expand(pattern.as_ref())?);
    }
    Ok(hosts)
}

fn expand_segment(full: &str, rest: &str) -> Result<Vec<String>, PatternError> {
    let open = match rest.find('[') {
        Some(open) => open,
        None => {
            if rest.contains(']') {
                return Err(PatternError::Unbalanced(full.to_string()));
            }
            return Ok(vec![rest.to_string()]);
        }
    };

    let prefix = &rest[..open];
    if prefix.contains(']') {
        return Err(PatternError::Unbalanced(full.to_string()));
    }

    let close = rest[open..]
        .find(']')
        .map(|offset| open + offset)
        .ok_or_else(|| PatternError::Unbalanced(full.to_string()))?;

    let range = &rest[open + 1..close];
    if range.contains('[') {
        return Err(PatternError::Unbalanced(full.to_string()));
    }

    let (start_str, end_str) = parse_bounds(full, range)?;
    let non_numeric = || PatternError::NonNumeric {
        pattern: full.to_string(),
        range: range.to_string(),
    };
    let start: u64 = start_str.parse().map_err(|_| non_numeric())?;
    let end: u64 = end_str.parse().map_err(|_| non_numeric())?;

    if end < start {
        return Err(PatternError::Reversed {
            pattern: full.to_string(),
            start: start_str.to_string(),
            end: end_str.to_string(),
        });
    }

    let suffix = &rest[close + 1..];
    let tails = if suffix.is_empty() {
        vec![String::new()]
    } else {
        expand_segment(full, suffix)?
    };

    let count = (end - start)
        .checked_add(1)
        .and_then(|span| usize::try_from(span).ok())
        .and_then(|span| span.checked_mul(tails.len()))
        .filter(|&count| count <= MAX_EXPANSION)
        .ok_or_else(|| PatternError::TooLarge {
            pattern: full.to_string(),
            limit: MAX_EXPANSION,
        })?;

    let width = start_str.len();
    let mut hosts = Vec::with_capacity(count);
    for n in start..=end {
        for tail in &tails {
            hosts.push(format!("{}{:0width$}{}", prefix, n, tail, width = width));
        }
    }
    Ok(hosts)
}

fn parse_bounds<'a>(full: &str, range: &'a str) -> Result<(&'a str, &'a str), PatternError> {
    let non_numeric = || PatternError::NonNumeric {
        pattern: full.to_string(),
        range: range.to_string(),
    };

    let (start, end) = range.split_once('-').ok_or_else(non_numeric)?;
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(start) || !is_digits(end) {
        return Err(non_numeric());
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_zero_padded_range() {
        let hosts = expand("web[01-05].fe.yahoo.com").unwrap();
        assert_eq!(
            hosts,
            [
                "web01.fe.yahoo.com",
                "web02.fe.yahoo.com",
                "web03.fe.yahoo.com",
                "web04.fe.yahoo.com",
                "web05.fe.yahoo.com",
            ]
        );
    }

    #[test]
    fn literal_pattern_is_returned_unchanged() {
        assert_eq!(
            expand("mockhost4.yahoo.com").unwrap(),
            ["mockhost4.yahoo.com"]
        );
    }

    #[test]
    fn width_follows_lower_bound() {
        assert_eq!(expand("n[8-10]").unwrap(), ["n8", "n9", "n10"]);
        assert_eq!(expand("n[008-010]").unwrap(), ["n008", "n009", "n010"]);
    }

    #[test]
    fn single_value_range() {
        assert_eq!(expand("db[07-07]").unwrap(), ["db07"]);
    }

    #[test]
    fn multiple_ranges_are_a_cartesian_product() {
        let hosts = expand("rack[1-2]-node[01-02]").unwrap();
        assert_eq!(
            hosts,
            ["rack1-node01", "rack1-node02", "rack2-node01", "rack2-node02"]
        );
    }

    #[test]
    fn reversed_range_fails() {
        let err = expand("web[05-01].example.com").unwrap_err();
        assert_eq!(
            err,
            PatternError::Reversed {
                pattern: "web[05-01].example.com".into(),
                start: "05".into(),
                end: "01".into(),
            }
        );
    }

    #[test]
    fn malformed_patterns_fail() {
        assert_eq!(expand(""), Err(PatternError::Empty));
        assert!(matches!(expand("web[01-05"), Err(PatternError::Unbalanced(_))));
        assert!(matches!(expand("web01-05]"), Err(PatternError::Unbalanced(_))));
        assert!(matches!(expand("web[[01-05]]"), Err(PatternError::Unbalanced(_))));
        assert!(matches!(expand("web[a-c]"), Err(PatternError::NonNumeric { .. })));
        assert!(matches!(expand("web[01]"), Err(PatternError::NonNumeric { .. })));
        assert!(matches!(expand("web[-05]"), Err(PatternError::NonNumeric { .. })));
    }

    #[test]
    fn error_in_later_range_fails_whole_pattern() {
        assert!(matches!(
            expand("rack[1-2]-node[09-01]"),
            Err(PatternError::Reversed { .. })
        ));
    }

    #[test]
    fn full_u64_range_is_too_large() {
        assert!(matches!(
            expand("h[0-18446744073709551615]"),
            Err(PatternError::TooLarge { limit: MAX_EXPANSION, .. })
        ));
    }

    #[test]
    fn oversized_ranges_are_rejected() {
        assert!(matches!(
            expand("web[0-9999999999]"),
            Err(PatternError::TooLarge { .. })
        ));
        // Each range fits on its own, the product does not.
        assert!(matches!(
            expand("r[1-1000]-n[1-1000]"),
            Err(PatternError::TooLarge { .. })
        ));
        assert_eq!(expand("n[1-100000]").unwrap().len(), MAX_EXPANSION);
    }

    #[test]
    fn bound_beyond_u64_is_non_numeric() {
        assert!(matches!(
            expand("h[0-99999999999999999999]"),
            Err(PatternError::NonNumeric { .. })
        ));
    }

    #[test]
    fn expand_all_keeps_declaration_order() {
        let hosts = expand_all(["b[1-2]", "a", "c[1-1]"]).unwrap();
        assert_eq!(hosts, ["b1", "b2", "a", "c1"]);
    }

    #[test]
    fn expand_all_does_not_deduplicate() {
        let hosts = expand_all(["a[1-2]", "a1"]).unwrap();
        assert_eq!(hosts, ["a1", "a2", "a1"]);
    }
}
