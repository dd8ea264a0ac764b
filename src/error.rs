use thiserror::Error;

/// Errors raised while resolving a failpoint name against the activation
/// spec.
///
/// A malformed activation entry is a test-authoring bug, so every variant
/// carries the failpoint name and the offending raw term and is returned
/// to the caller unchanged. Nothing here is retried, cached, or swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    /// The matched entry starts with the failpoint name but does not
    /// continue with `=`. This is how the first-entry prefix match
    /// surfaces when one failpoint name is a prefix of another.
    #[error("failpoint '{name}': activation entry '{term}' is not of the form {name}=VALUE")]
    MissingSeparator { name: String, term: String },

    /// The value looked integer-shaped but did not parse, e.g. `N=` or
    /// `N=-`.
    #[error("failpoint '{name}': activation value '{term}' is not a valid integer")]
    InvalidInteger { name: String, term: String },

    /// The value is not an integer, a quoted string, or `true`/`false`.
    #[error("failpoint '{name}': unrecognized activation value '{term}'")]
    UnrecognizedValue { name: String, term: String },
}
