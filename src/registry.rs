//! The evaluator: resolves failpoint names to typed values and caches
//! the results.
//!
//! The registry is an explicit object rather than a hidden module
//! global, so a test harness can own one per scope. The crate still
//! keeps one process-wide default registry (see [`crate::registry()`])
//! because the code generated at injection sites has to reach an
//! evaluator without being handed one.

use std::collections::HashMap;
use std::env;
use std::sync::Mutex;

use tracing::debug;

use crate::error::ActivationError;
use crate::spec;
use crate::value::Value;

/// Environment variable the default registry reads its activation spec
/// from.
pub const DEFAULT_ENV_VAR: &str = "FAILPOINTS";

/// Where a registry gets its activation spec string.
enum ActivationSource {
    /// Read the named process environment variable in full on every
    /// cache-miss lookup. Absence means the framework is inactive.
    Env(String),
    /// A harness-supplied spec string, `None` meaning inactive.
    Literal(Option<String>),
}

impl ActivationSource {
    fn current_spec(&self) -> Option<String> {
        match self {
            Self::Env(var) => env::var(var).ok(),
            Self::Literal(spec) => spec.clone(),
        }
    }
}

/// Resolves failpoint names against an activation spec, caching each
/// successfully parsed value.
///
/// Caching is sticky: while a spec exists, a name that resolved once
/// keeps its cached value across spec changes until
/// [`reset`](Self::reset) clears the cache. An absent spec deactivates
/// everything regardless of the cache. A name absent from the spec is
/// never cached, so every evaluation of an absent name re-scans the
/// spec. All three behaviors are deliberate.
pub struct FailpointRegistry {
    source: Mutex<ActivationSource>,
    cache: Mutex<HashMap<String, Value>>,
}

impl FailpointRegistry {
    /// Registry backed by the [`DEFAULT_ENV_VAR`] environment variable.
    pub fn from_env() -> Self {
        Self::from_env_var(DEFAULT_ENV_VAR)
    }

    /// Registry backed by an arbitrary environment variable.
    pub fn from_env_var(var: impl Into<String>) -> Self {
        Self::with_source(ActivationSource::Env(var.into()))
    }

    /// Registry backed by a fixed spec string.
    pub fn with_spec(spec: impl Into<String>) -> Self {
        Self::with_source(ActivationSource::Literal(Some(spec.into())))
    }

    /// Registry with no activation spec at all; every evaluation is
    /// inactive until [`set_spec`](Self::set_spec) supplies one.
    pub fn inactive() -> Self {
        Self::with_source(ActivationSource::Literal(None))
    }

    fn with_source(source: ActivationSource) -> Self {
        Self {
            source: Mutex::new(source),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves `name` to its activation value, or `Ok(None)` when the
    /// failpoint is not active.
    ///
    /// A malformed entry for `name` is returned as an error on every
    /// evaluation; it is never cached and never downgraded to
    /// "inactive".
    pub fn evaluate(&self, name: &str) -> Result<Option<Value>, ActivationError> {
        // an absent spec deactivates everything, cached or not; the
        // cache is consulted only while a spec exists
        let Some(spec_text) = self.source.lock().unwrap().current_spec() else {
            return Ok(None);
        };

        let mut cache = self.cache.lock().unwrap();
        if let Some(value) = cache.get(name) {
            debug!(name, %value, "failpoint cache hit");
            return Ok(Some(value.clone()));
        }

        match spec::lookup(&spec_text, name)? {
            Some(value) => {
                debug!(name, %value, "failpoint activated");
                cache.insert(name.to_string(), value.clone());
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Clears every cached evaluation. The activation source is left
    /// untouched.
    pub fn reset(&self) {
        let mut cache = self.cache.lock().unwrap();
        debug!(entries = cache.len(), "resetting failpoint cache");
        cache.clear();
    }

    /// Replaces the activation source with a literal spec (`None`
    /// deactivates everything not already cached).
    ///
    /// Cached values are kept; call [`reset`](Self::reset) to pick the
    /// new spec up for names that already resolved.
    pub fn set_spec(&self, spec: Option<String>) {
        *self.source.lock().unwrap() = ActivationSource::Literal(spec);
    }
}

impl Default for FailpointRegistry {
    fn default() -> Self {
        Self::from_env()
    }
}
