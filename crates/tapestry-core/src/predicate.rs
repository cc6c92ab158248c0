//! Condition matcher.
//!
//! A predicate is a closed, total language: a map from flag name to expected
//! value. Evaluation never has side effects.

use serde::{Deserialize, Serialize};

use crate::flags::{FlagValue, Flags};

/// A flag predicate gating a variant, choice, effect or patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Predicate(Flags);

impl Predicate {
    /// Returns `true` if every key in the predicate matches `flags`.
    ///
    /// Boolean expectations treat an absent flag as `false`. Any other
    /// expectation requires a present flag of the same kind and value.
    #[must_use]
    pub fn matches(&self, flags: &Flags) -> bool {
        self.0.iter().all(|(key, expected)| match expected {
            FlagValue::Bool(expected) => {
                let actual = match flags.get(key) {
                    None => Some(false),
                    Some(value) => value.as_bool(),
                };
                actual == Some(*expected)
            }
            other => flags.get(key) == Some(other),
        })
    }

    /// Flag names referenced by this predicate.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys()
    }

    /// Returns `true` for the unconditional predicate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Predicate
where
    K: Into<String>,
    V: Into<FlagValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Evaluates an optional predicate; an absent predicate matches
/// unconditionally.
#[must_use]
pub fn matches(predicate: Option<&Predicate>, flags: &Flags) -> bool {
    predicate.is_none_or(|p| p.matches(flags))
}
