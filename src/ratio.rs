//! Parsing for the `W:H` aspect-ratio notation.
//!
//! Every job carries one target ratio, written the way photographers say it:
//! `3:2`, `4:5`, `16:9`. The string is split on `:` and only the first two
//! tokens are considered, so `3:2:junk` still parses as `3:2`.
//!
//! - `"3:2"` → width=3, height=2
//! - `" 4 : 5 "` → width=4, height=5
//! - `"3"` → error (one token)
//! - `"0:2"`, `"-3:2"`, `"a:b"` → error (not a positive integer)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RatioError {
    #[error("ratio '{0}' must have the form W:H")]
    MissingSeparator(String),
    #[error("ratio '{input}': '{token}' is not a positive integer")]
    NotPositive { input: String, token: String },
}

/// Target aspect ratio as two positive integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatioSpec {
    pub width: u32,
    pub height: u32,
}

impl Default for RatioSpec {
    fn default() -> Self {
        Self {
            width: 3,
            height: 2,
        }
    }
}

impl fmt::Display for RatioSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for RatioSpec {
    type Err = RatioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_ratio(s)
    }
}

/// Parse a `W:H` string into a [`RatioSpec`].
pub fn parse_ratio(input: &str) -> Result<RatioSpec, RatioError> {
    let mut tokens = input.split(':');
    let (Some(w), Some(h)) = (tokens.next(), tokens.next()) else {
        return Err(RatioError::MissingSeparator(input.to_string()));
    };

    let width = parse_positive(input, w)?;
    let height = parse_positive(input, h)?;
    Ok(RatioSpec { width, height })
}

fn parse_positive(input: &str, token: &str) -> Result<u32, RatioError> {
    let not_positive = || RatioError::NotPositive {
        input: input.to_string(),
        token: token.trim().to_string(),
    };
    // i64 first so "-3" reports as non-positive rather than as garbage
    let value: i64 = token.trim().parse().map_err(|_| not_positive())?;
    if value <= 0 {
        return Err(not_positive());
    }
    u32::try_from(value).map_err(|_| not_positive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_ratio() {
        assert_eq!(parse_ratio("3:2").unwrap(), RatioSpec { width: 3, height: 2 });
        assert_eq!(parse_ratio("16:9").unwrap(), RatioSpec { width: 16, height: 9 });
    }

    #[test]
    fn tolerates_whitespace_around_tokens() {
        assert_eq!(parse_ratio(" 4 : 5 ").unwrap(), RatioSpec { width: 4, height: 5 });
    }

    #[test]
    fn ignores_tokens_after_the_second() {
        assert_eq!(parse_ratio("3:2:1").unwrap(), RatioSpec { width: 3, height: 2 });
    }

    #[test]
    fn single_token_is_rejected() {
        assert_eq!(
            parse_ratio("3"),
            Err(RatioError::MissingSeparator("3".to_string()))
        );
        assert!(parse_ratio("").is_err());
    }

    #[test]
    fn zero_and_negative_are_rejected() {
        assert!(matches!(
            parse_ratio("0:2"),
            Err(RatioError::NotPositive { token, .. }) if token == "0"
        ));
        assert!(matches!(
            parse_ratio("3:-2"),
            Err(RatioError::NotPositive { token, .. }) if token == "-2"
        ));
    }

    #[test]
    fn non_numeric_is_rejected() {
        assert!(parse_ratio("a:b").is_err());
        assert!(parse_ratio("3:").is_err());
        assert!(parse_ratio("1.5:1").is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        let ratio: RatioSpec = "5:4".parse().unwrap();
        assert_eq!(ratio.to_string(), "5:4");
    }

    #[test]
    fn default_is_three_by_two() {
        assert_eq!(RatioSpec::default().to_string(), "3:2");
    }
}
