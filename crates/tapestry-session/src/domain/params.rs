//! Query-string session parameters.

use tapestry_core::flags::{FlagValue, Flags};
use tapestry_narrative::Path;
use url::form_urlencoded;

/// Decoded session parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionParams {
    /// Node to start at when there is no path.
    pub node: Option<String>,
    /// Decisions to replay.
    pub path: Path,
    /// Flags the session starts from.
    pub flags: Flags,
    /// Content version the parameters were produced against.
    pub version: Option<String>,
}

impl SessionParams {
    /// Decodes a query string. A leading `?` is ignored, unknown keys are
    /// skipped and a repeated key keeps its last value.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "node" if !value.is_empty() => params.node = Some(value.into_owned()),
                "path" => params.path = Path::decode(&value),
                "flags" => params.flags = parse_premise_flags(&value),
                "version" if !value.is_empty() => params.version = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }

    /// Encodes the parameters as a query string, without the leading `?`.
    /// Empty fields are omitted.
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(node) = &self.node {
            serializer.append_pair("node", node);
        }
        if !self.path.is_empty() {
            serializer.append_pair("path", &self.path.encode());
        }
        if !self.flags.is_empty() {
            serializer.append_pair("flags", &serialize_premise_flags(&self.flags));
        }
        if let Some(version) = &self.version {
            serializer.append_pair("version", version);
        }
        serializer.finish()
    }
}

/// Parses premise flags written as `key-value` pairs separated by commas,
/// for example `met-true,gold-30,mood-calm`.
///
/// Values `true` and `false` become booleans, finite numbers become numbers
/// and anything else stays a string. A pair without `-` sets a boolean
/// `true`. Pairs with an empty key are skipped.
#[must_use]
pub fn parse_premise_flags(encoded: &str) -> Flags {
    let mut flags = Flags::new();
    for pair in encoded.split(',') {
        let (key, value) = match pair.split_once('-') {
            Some((key, value)) => (key.trim(), Some(value.trim())),
            None => (pair.trim(), None),
        };
        if key.is_empty() {
            continue;
        }
        flags.insert(key, premise_value(value));
    }
    flags
}

fn premise_value(raw: Option<&str>) -> FlagValue {
    match raw {
        None | Some("true") => FlagValue::Bool(true),
        Some("false") => FlagValue::Bool(false),
        Some(text) => match text.parse::<f64>() {
            Ok(number) if number.is_finite() && !text.is_empty() => FlagValue::Number(number),
            _ => FlagValue::Text(text.to_owned()),
        },
    }
}

/// Serializes flags in the form [`parse_premise_flags`] reads.
#[must_use]
pub fn serialize_premise_flags(flags: &Flags) -> String {
    flags
        .iter()
        .map(|(key, value)| format!("{key}-{value}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premise_flags_are_typed() {
        // Act
        let flags = parse_premise_flags("met-true,hostile-false,gold-30,ratio-0.5,mood-calm");

        // Assert
        assert_eq!(flags.get("met"), Some(&FlagValue::Bool(true)));
        assert_eq!(flags.get("hostile"), Some(&FlagValue::Bool(false)));
        assert_eq!(flags.get("gold"), Some(&FlagValue::Number(30.0)));
        assert_eq!(flags.get("ratio"), Some(&FlagValue::Number(0.5)));
        assert_eq!(flags.get("mood"), Some(&FlagValue::Text("calm".to_owned())));
    }

    #[test]
    fn test_premise_value_splits_on_first_dash_only() {
        let flags = parse_premise_flags("name-jean-luc,delta--2");

        assert_eq!(flags.get("name"), Some(&FlagValue::Text("jean-luc".to_owned())));
        assert_eq!(flags.get("delta"), Some(&FlagValue::Number(-2.0)));
    }

    #[test]
    fn test_empty_keys_are_skipped_and_bare_keys_are_true() {
        let flags = parse_premise_flags(",-true,seen,,");

        assert_eq!(flags.len(), 1);
        assert!(flags.is_set("seen"));
    }

    #[test]
    fn test_non_finite_numbers_stay_text() {
        let flags = parse_premise_flags("a-NaN,b-inf");

        assert_eq!(flags.get("a"), Some(&FlagValue::Text("NaN".to_owned())));
        assert_eq!(flags.get("b"), Some(&FlagValue::Text("inf".to_owned())));
    }

    #[test]
    fn test_serialized_premise_flags_read_back_identically() {
        // Arrange
        let flags = parse_premise_flags("met-true,gold-30,mood-calm");

        // Act
        let serialized = serialize_premise_flags(&flags);

        // Assert
        assert_eq!(serialized, "gold-30,met-true,mood-calm");
        assert_eq!(parse_premise_flags(&serialized), flags);
    }

    #[test]
    fn test_query_decodes_every_parameter() {
        // Act
        let params = SessionParams::from_query("?node=meet&path=1X%5B12%5D&flags=met-true&version=3&utm=x");

        // Assert
        assert_eq!(params.node.as_deref(), Some("meet"));
        assert_eq!(params.path.encode(), "1X[12]");
        assert!(params.flags.is_set("met"));
        assert_eq!(params.version.as_deref(), Some("3"));
    }

    #[test]
    fn test_empty_query_yields_defaults() {
        assert_eq!(SessionParams::from_query(""), SessionParams::default());
        assert_eq!(SessionParams::from_query("?node=&version="), SessionParams::default());
    }

    #[test]
    fn test_query_round_trips() {
        // Arrange
        let params = SessionParams {
            node: Some("the end".to_owned()),
            path: Path::decode("0X[10]"),
            flags: parse_premise_flags("met-true"),
            version: Some("2".to_owned()),
        };

        // Act
        let query = params.to_query();

        // Assert
        assert_eq!(SessionParams::from_query(&query), params);
    }
}
