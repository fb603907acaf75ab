//! Parsing of compact index selections such as `1,3-5,8`

use std::collections::HashSet;
use std::num::ParseIntError;

use thiserror::Error;

/// Errors produced while parsing a selection string
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RangeError {
    #[error("Invalid range format: {0}")]
    InvalidRange(String),
    #[error("Start of range cannot be greater than end: {0}")]
    Reversed(String),
    #[error("index {index} is out of range (1-{max})")]
    OutOfBounds { index: usize, max: usize },
    #[error("Invalid number `{token}`")]
    InvalidNumber {
        token: String,
        #[source]
        source: ParseIntError,
    },
}

fn parse_number(token: &str) -> Result<usize, RangeError> {
    let token = token.trim();
    token.parse().map_err(|e| RangeError::InvalidNumber {
        token: token.to_string(),
        source: e,
    })
}

/// Parse a comma separated list of indices and inclusive `start-end` ranges,
/// none of which may exceed `max`.
///
/// The result keeps the order in which indices first appear and drops
/// duplicates, so `3,1-3` yields `[3, 1, 2]`. Ranges are bounds-checked before
/// they are expanded.
///
/// # Errors
///
/// Returns `RangeError::InvalidRange` when a token has more or fewer than two
/// `-` separated parts, `RangeError::Reversed` when a range runs backwards,
/// `RangeError::InvalidNumber` when any part is not a non-negative integer, and
/// `RangeError::OutOfBounds` with the first index above `max`.
pub fn parse_ranges(input: &str, max: usize) -> Result<Vec<usize>, RangeError> {
    let mut seen = HashSet::new();
    let mut indices = Vec::new();
    let mut push = |index: usize| {
        if seen.insert(index) {
            indices.push(index);
        }
    };

    for token in input.split(',') {
        let token = token.trim();
        if !token.contains('-') {
            let index = parse_number(token)?;
            if index > max {
                return Err(RangeError::OutOfBounds { index, max });
            }
            push(index);
            continue;
        }

        let parts: Vec<&str> = token.split('-').collect();
        let [start, end] = parts[..] else {
            return Err(RangeError::InvalidRange(token.to_string()));
        };
        let start = parse_number(start)?;
        let end = parse_number(end)?;
        if start > end {
            return Err(RangeError::Reversed(token.to_string()));
        }
        if end > max {
            return Err(RangeError::OutOfBounds {
                index: start.max(max.saturating_add(1)),
                max,
            });
        }
        for index in start..=end {
            push(index);
        }
    }

    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_numbers_and_ranges() {
        assert_eq!(parse_ranges("1,3-5,8", 10).unwrap(), vec![1, 3, 4, 5, 8]);
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        assert_eq!(parse_ranges("1,1,2", 10).unwrap(), vec![1, 2]);
        assert_eq!(parse_ranges("4,2-5,1", 10).unwrap(), vec![4, 2, 3, 5, 1]);
    }

    #[test]
    fn test_whitespace_around_tokens() {
        assert_eq!(parse_ranges(" 2 , 4 - 6 ", 10).unwrap(), vec![2, 4, 5, 6]);
    }

    #[test]
    fn test_single_element_range() {
        assert_eq!(parse_ranges("7-7", 10).unwrap(), vec![7]);
    }

    #[test]
    fn test_reversed_range_rejected() {
        assert_eq!(
            parse_ranges("5-3", 10),
            Err(RangeError::Reversed("5-3".to_string()))
        );
    }

    #[test]
    fn test_too_many_range_parts() {
        assert_eq!(
            parse_ranges("1-2-3", 10),
            Err(RangeError::InvalidRange("1-2-3".to_string()))
        );
    }

    #[test]
    fn test_open_ended_range_is_invalid_number() {
        match parse_ranges("3-", 10) {
            Err(RangeError::InvalidNumber { token, .. }) => assert_eq!(token, ""),
            other => panic!("Expected InvalidNumber, got: {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_token() {
        let err = parse_ranges("1,abc", 10).unwrap_err();
        assert_eq!(err.to_string(), "Invalid number `abc`");
    }

    #[test]
    fn test_index_above_max_rejected() {
        assert_eq!(
            parse_ranges("2,7", 3),
            Err(RangeError::OutOfBounds { index: 7, max: 3 })
        );
    }

    #[test]
    fn test_huge_range_rejected_without_expanding() {
        assert_eq!(
            parse_ranges("1-18446744073709551615", 3),
            Err(RangeError::OutOfBounds { index: 4, max: 3 })
        );
        assert_eq!(
            parse_ranges("5-4000000000", 3),
            Err(RangeError::OutOfBounds { index: 5, max: 3 })
        );
    }

    #[test]
    fn test_range_ending_at_max() {
        assert_eq!(parse_ranges("2-3", 3).unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(matches!(
            parse_ranges("1,,2", 10),
            Err(RangeError::InvalidNumber { .. })
        ));
    }
}
