//! Failpoints: named fault-injection points with typed activation
//! values and a build-time injection-site rewrite.
//!
//! Production code marks a failpoint by calling [`inject`] inside a
//! function annotated with the [`failpoints`] attribute. The attribute
//! rewrites each marker call into a guard that only runs the body when
//! the named failpoint is active, so disabled failpoints cost nothing
//! beyond the guard's cache lookup and nothing at all when the
//! attribute is left off:
//!
//! ```
//! use failpoints::failpoints;
//!
//! #[failpoints]
//! fn fetch(log: &mut Vec<i64>) {
//!     failpoints::inject("fetch.delay", |v| {
//!         log.push(v.as_number().unwrap_or(0));
//!     });
//! }
//!
//! failpoints::registry().set_spec(Some("fetch.delay=250".to_string()));
//! let mut log = Vec::new();
//! fetch(&mut log);
//! assert_eq!(log, vec![250]);
//! ```
//!
//! Activation comes from a single spec string, by default the
//! `FAILPOINTS` environment variable: `;`-separated entries of the form
//! `name` (boolean true), `name=42`, `name=true`, or `name="text"`.
//! Resolved values are cached per name until [`reset`]; see
//! [`registry::FailpointRegistry`] for the exact cache semantics.
//!
//! Known sharp edges, kept on purpose:
//!
//! - Spec lookup matches the first entry whose text merely *starts
//!   with* the queried name. Keep failpoint names prefix-free (see
//!   [`ActivationError::MissingSeparator`]).
//! - The rewrite matches marker calls lexically, by the literal path
//!   `failpoints::inject` (or the configured alias), not by resolved
//!   symbol.
//! - Parameter substitution in a one-parameter body is textual, not
//!   scope-aware, and an `inject` nested inside another `inject`'s body
//!   is left as the inert marker.

pub mod error;
pub mod registry;
mod spec;
pub mod value;

pub use error::ActivationError;
pub use registry::{FailpointRegistry, DEFAULT_ENV_VAR};
pub use value::Value;

/// Rewrites `inject` marker calls in the annotated function into
/// activation guards. Accepts `alias = "..."` when the marker crate is
/// imported under another name.
pub use failpoints_macros::failpoints;

use once_cell::sync::Lazy;

static DEFAULT_REGISTRY: Lazy<FailpointRegistry> = Lazy::new(FailpointRegistry::from_env);

/// The process-wide default registry. Guards generated by
/// [`failpoints`] evaluate against it.
pub fn registry() -> &'static FailpointRegistry {
    &DEFAULT_REGISTRY
}

/// Marker trait for the two accepted failpoint body shapes: a closure
/// taking nothing, or a closure taking the active [`Value`].
pub trait InjectBody<Args> {}

impl<F: FnOnce()> InjectBody<()> for F {}
impl<F: FnOnce(Value)> InjectBody<(Value,)> for F {}

/// Marks a failpoint.
///
/// Inert by itself: the body is dropped unexecuted. Inside a
/// [`failpoints`]-annotated function the call is rewritten at build
/// time into a guard that runs `body` only while `name` is active; a
/// one-parameter body receives the activation [`Value`].
pub fn inject<A, F: InjectBody<A>>(name: &str, body: F) {
    let _ = (name, body);
}

/// Resolves `name` against the default registry.
pub fn evaluate(name: &str) -> Result<Option<Value>, ActivationError> {
    DEFAULT_REGISTRY.evaluate(name)
}

/// Clears the default registry's evaluation cache.
pub fn reset() {
    DEFAULT_REGISTRY.reset()
}

// Runtime entry point for generated guards. A malformed activation
// entry panics here: generated code has nowhere to propagate a Result,
// and a broken spec string must fail loudly rather than silently skip
// the intended fault.
#[doc(hidden)]
pub fn __evaluate_active(name: &str) -> Option<Value> {
    match DEFAULT_REGISTRY.evaluate(name) {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}
