//! Compact traversal path codec.
//!
//! A path records every decision taken since the start node: a choice index
//! for each choice made and `X` for each continuation. Indices 0 through 9
//! encode as a single digit; larger indices encode as a bracketed group such
//! as `[12]`.

use std::convert::Infallible;
use std::fmt::{self, Write as _};
use std::iter::Peekable;
use std::str::{Chars, FromStr};

use serde::{Deserialize, Serialize};

/// Continuation sentinel in the encoded form.
const CONTINUE: char = 'X';

/// One recorded decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathToken {
    /// Index into the node's resolved choice list.
    Choice(usize),
    /// Continuation or auto-advance.
    Continue,
}

impl fmt::Display for PathToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Choice(index) if *index < 10 => write!(f, "{index}"),
            Self::Choice(index) => write!(f, "[{index}]"),
            Self::Continue => f.write_char(CONTINUE),
        }
    }
}

/// An ordered sequence of decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<PathToken>);

impl Path {
    /// Creates an empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one decision.
    pub fn push(&mut self, token: PathToken) {
        self.0.push(token);
    }

    /// The recorded decisions.
    #[must_use]
    pub fn tokens(&self) -> &[PathToken] {
        &self.0
    }

    /// Number of recorded decisions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no decision has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keeps only the first `len` decisions.
    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    /// Forgets every decision.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Encodes the path in its compact textual form.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Decodes a compact path.
    ///
    /// Decoding never fails: unrecognized characters and malformed bracket
    /// groups are dropped.
    #[must_use]
    pub fn decode(encoded: &str) -> Self {
        let mut tokens = Vec::with_capacity(encoded.len());
        let mut chars = encoded.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                'X' | 'x' => tokens.push(PathToken::Continue),
                '[' => {
                    if let Some(index) = bracket_group(&mut chars) {
                        tokens.push(PathToken::Choice(index));
                    }
                }
                _ => {
                    if let Some(digit) = c.to_digit(10) {
                        tokens.push(PathToken::Choice(digit as usize));
                    }
                }
            }
        }
        Self(tokens)
    }
}

/// Reads the rest of a `[digits]` group. The digit run is consumed even when
/// the group turns out to be malformed.
fn bracket_group(chars: &mut Peekable<Chars<'_>>) -> Option<usize> {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    if chars.next_if_eq(&']').is_none() || digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|token| write!(f, "{token}"))
    }
}

impl FromStr for Path {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::decode(s))
    }
}

impl FromIterator<PathToken> for Path {
    fn from_iter<I: IntoIterator<Item = PathToken>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PathToken::{Choice, Continue};

    #[test]
    fn test_single_digit_paths_use_compact_form() {
        // Arrange
        let path: Path = [Choice(1), Continue, Choice(0), Choice(9)].into_iter().collect();

        // Act
        let encoded = path.encode();

        // Assert
        assert_eq!(encoded, "1X09");
    }

    #[test]
    fn test_large_indices_round_trip_through_brackets() {
        // Arrange
        let path: Path = [Choice(12), Continue, Choice(3), Choice(100)].into_iter().collect();

        // Act
        let encoded = path.encode();
        let decoded = Path::decode(&encoded);

        // Assert
        assert_eq!(encoded, "[12]X3[100]");
        assert_eq!(decoded, path);
    }

    #[test]
    fn test_decode_accepts_lowercase_continuation() {
        assert_eq!(Path::decode("x1"), [Continue, Choice(1)].into_iter().collect());
    }

    #[test]
    fn test_decode_discards_unknown_characters() {
        // Act
        let decoded = Path::decode("1Y-2 X?");

        // Assert
        assert_eq!(decoded.tokens(), &[Choice(1), Choice(2), Continue]);
    }

    #[test]
    fn test_decode_drops_malformed_bracket_groups() {
        assert_eq!(Path::decode("[]1").tokens(), &[Choice(1)]);
        assert_eq!(Path::decode("[12X").tokens(), &[Continue]);
        assert_eq!(Path::decode("[a]2").tokens(), &[Choice(2)]);
        assert_eq!(Path::decode("[99999999999999999999999]X").tokens(), &[Continue]);
    }

    #[test]
    fn test_empty_path_encodes_to_empty_string() {
        assert_eq!(Path::new().encode(), "");
        assert!(Path::decode("").is_empty());
    }

    #[test]
    fn test_from_str_matches_decode() {
        let parsed: Path = "0X[10]".parse().unwrap();

        assert_eq!(parsed, Path::decode("0X[10]"));
        assert_eq!(parsed.len(), 3);
    }
}
