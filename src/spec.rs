//! Activation spec parsing.
//!
//! The spec is a single `;`-separated string:
//!
//! ```text
//! spec   := entry (";" entry)*
//! entry  := NAME | NAME "=" VALUE
//! VALUE  := INTEGER | "true" | "false" | '"' chars '"'
//! ```
//!
//! A bare `NAME` activates the failpoint with `Boolean(true)`.
//!
//! Lookup takes the *first* entry whose text starts with the queried
//! name, not the first token-boundary match. If one failpoint's name is
//! a textual prefix of another's (`slow` vs `slowPath=5`), evaluating
//! the shorter name can land on the longer entry and fail with
//! [`ActivationError::MissingSeparator`]. Keep failpoint names
//! prefix-free.

use crate::error::ActivationError;
use crate::value::Value;

/// Scans `spec` for `name` and parses the matched entry's value.
///
/// Returns `Ok(None)` when no entry matches; the caller treats that as
/// "not active" and must not cache it.
pub(crate) fn lookup(spec: &str, name: &str) -> Result<Option<Value>, ActivationError> {
    let Some(entry) = spec.split(';').find(|entry| entry.starts_with(name)) else {
        return Ok(None);
    };

    if entry == name {
        return Ok(Some(Value::Boolean(true)));
    }

    let Some(term) = entry.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')) else {
        return Err(ActivationError::MissingSeparator {
            name: name.to_string(),
            term: entry.to_string(),
        });
    };

    parse_term(name, term).map(Some)
}

fn parse_term(name: &str, term: &str) -> Result<Value, ActivationError> {
    if integer_shaped(term) {
        return term
            .parse::<i64>()
            .map(Value::Number)
            .map_err(|_| ActivationError::InvalidInteger {
                name: name.to_string(),
                term: term.to_string(),
            });
    }

    if term.len() >= 2 && term.starts_with('"') && term.ends_with('"') {
        return Ok(Value::String(term[1..term.len() - 1].to_string()));
    }

    match term {
        "true" => Ok(Value::Boolean(true)),
        "false" => Ok(Value::Boolean(false)),
        _ => Err(ActivationError::UnrecognizedValue {
            name: name.to_string(),
            term: term.to_string(),
        }),
    }
}

/// Matches `-?[0-9]*`, including the empty string, so `N=` and `N=-`
/// classify as integers and then fail to parse.
fn integer_shaped(term: &str) -> bool {
    let digits = term.strip_prefix('-').unwrap_or(term);
    digits.chars().all(|c| c.is_ascii_digit())
}
