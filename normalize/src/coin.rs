// normalize/src/coin.rs

//! Coin-string parsing: `"123uatom"` -> `{ amount: "123", denom: "uatom" }`.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    pub amount: String,
    pub denom: String,
}

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)([a-zA-Z/][\w/:-]*)$").expect("static regex"))
}

/// Parse a single coin string. Returns `None` if it doesn't match
/// `^(\d+)([a-zA-Z/][\w/:-]*)$`.
pub fn parse_coin(input: &str) -> Option<Coin> {
    let caps = pattern().captures(input)?;
    Some(Coin {
        amount: caps[1].to_string(),
        denom: caps[2].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_denom() {
        assert_eq!(
            parse_coin("123uatom"),
            Some(Coin {
                amount: "123".into(),
                denom: "uatom".into(),
            })
        );
    }

    #[test]
    fn parses_ibc_denom() {
        assert_eq!(
            parse_coin("42ibc/ABC123"),
            Some(Coin {
                amount: "42".into(),
                denom: "ibc/ABC123".into(),
            })
        );
    }

    #[test]
    fn rejects_denomless_input() {
        assert_eq!(parse_coin("abc"), None);
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(parse_coin(""), None);
    }
}
