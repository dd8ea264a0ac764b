use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed activation value of a failpoint.
///
/// Values are parsed once from the activation spec and are immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(i64),
    Boolean(bool),
    String(String),
}

impl Value {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    /// Renders the value in activation-spec form, so a string is quoted
    /// the way it appears in the spec text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        assert_eq!(Value::Number(-7).as_number(), Some(-7));
        assert_eq!(Value::Boolean(true).as_boolean(), Some(true));
        assert_eq!(Value::String("x".to_string()).as_str(), Some("x"));
        assert_eq!(Value::Number(0).as_str(), None);
    }

    #[test]
    fn display_matches_spec_form() {
        assert_eq!(Value::Number(-1111).to_string(), "-1111");
        assert_eq!(Value::Boolean(false).to_string(), "false");
        assert_eq!(Value::String("aabdc".to_string()).to_string(), "\"aabdc\"");
    }

    #[test]
    fn serializes_untagged() {
        assert_eq!(serde_json::to_string(&Value::Number(5)).unwrap(), "5");
        assert_eq!(serde_json::to_string(&Value::Boolean(true)).unwrap(), "true");
        assert_eq!(
            serde_json::to_string(&Value::String("s".to_string())).unwrap(),
            "\"s\""
        );
    }
}
