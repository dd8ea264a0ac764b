//! End-to-end tests of the attribute rewrite against the default
//! registry.
//!
//! The default registry is process-wide state, so every test touching
//! it serializes on one lock and installs its own spec before running.

use std::sync::{Mutex, MutexGuard};

use failpoints::{failpoints, registry, FailpointRegistry, Value};

static DEFAULT_REGISTRY_LOCK: Mutex<()> = Mutex::new(());

fn with_spec(spec: Option<&str>) -> MutexGuard<'static, ()> {
    // a should_panic test below poisons the lock on purpose
    let guard = DEFAULT_REGISTRY_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    registry().set_spec(spec.map(str::to_string));
    registry().reset();
    guard
}

#[failpoints]
fn run_guarded(log: &mut Vec<String>) {
    failpoints::inject("guard.plain", || {
        log.push("plain".to_string());
    });
    failpoints::inject("guard.typed", |v| {
        log.push(format!("typed:{}", v));
    });
}

#[failpoints]
fn run_nested(log: &mut Vec<String>) {
    failpoints::inject("nest.outer", || {
        log.push("outer".to_string());
        failpoints::inject("nest.inner", || {
            log.push("inner".to_string());
        });
    });
}

#[test]
fn guard_body_runs_only_while_active() {
    let _g = with_spec(None);
    let mut log = Vec::new();
    run_guarded(&mut log);
    assert!(log.is_empty());

    registry().set_spec(Some("guard.plain".to_string()));
    run_guarded(&mut log);
    assert_eq!(log, vec!["plain".to_string()]);

    // removing the spec entirely silences the guard again, cached or not
    registry().set_spec(None);
    run_guarded(&mut log);
    assert_eq!(log, vec!["plain".to_string()]);
}

#[test]
fn typed_guard_observes_the_activation_value() {
    let _g = with_spec(Some("guard.typed=-42"));
    let mut log = Vec::new();
    run_guarded(&mut log);
    assert_eq!(log, vec!["typed:-42".to_string()]);
}

#[test]
fn typed_guard_observes_string_values_verbatim() {
    let _g = with_spec(Some("guard.typed=\"aabdc\""));
    let mut log = Vec::new();
    run_guarded(&mut log);
    assert_eq!(log, vec!["typed:\"aabdc\"".to_string()]);
}

#[test]
fn both_guards_fire_from_one_spec() {
    let _g = with_spec(Some("guard.plain;guard.typed=true"));
    let mut log = Vec::new();
    run_guarded(&mut log);
    assert_eq!(log, vec!["plain".to_string(), "typed:true".to_string()]);
}

#[test]
fn nested_marker_stays_inert() {
    let _g = with_spec(Some("nest.outer;nest.inner"));
    let mut log = Vec::new();
    run_nested(&mut log);
    // the inner inject sits inside the outer body and is not expanded
    assert_eq!(log, vec!["outer".to_string()]);
}

#[test]
#[should_panic(expected = "unrecognized activation value")]
fn malformed_activation_fails_loudly_inside_the_guard() {
    let _g = with_spec(Some("guard.plain=0aa"));
    let mut log = Vec::new();
    run_guarded(&mut log);
}

#[test]
fn untransformed_marker_is_a_no_op() {
    let _g = with_spec(Some("guard.plain"));
    let mut log: Vec<String> = Vec::new();
    // no attribute on this call site: the marker drops its body
    failpoints::inject("guard.plain", || {
        log.push("ran".to_string());
    });
    assert!(log.is_empty());
}

#[test]
fn environment_variable_backs_a_registry() {
    const VAR: &str = "FAILPOINTS_INTEGRATION_TEST";
    std::env::set_var(VAR, "env.point=\"on\"");
    let env_registry = FailpointRegistry::from_env_var(VAR);
    assert_eq!(
        env_registry.evaluate("env.point").unwrap(),
        Some(Value::String("on".to_string()))
    );
    std::env::remove_var(VAR);
}
