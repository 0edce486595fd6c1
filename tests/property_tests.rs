//! Property tests for the enforcement decision.
//!
//! These tests check that the decision is a function of the credential's
//! scheme and the configured table/fallback, and that every request emits
//! exactly one diagnostic event whose level matches the outcome.

use std::sync::Arc;

use http::StatusCode;
use proptest::prelude::*;
use scheme_gate::diagnostics::{Level, MemorySink};
use scheme_gate::validator::{allow_all, validator_fn};
use scheme_gate::{
    Credential, Decision, Enforcer, FallbackPolicy, RequestContext, Token, ValidationError,
};

// Strategy: scheme names drawn from a small pool so lookups both hit and miss
fn arb_scheme() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Bearer".to_string()),
        Just("Basic".to_string()),
        Just("Digest".to_string()),
        prop::string::string_regex("[A-Z][a-z]{2,8}").unwrap(),
    ]
}

fn arb_fallback() -> impl Strategy<Value = FallbackPolicy> {
    prop_oneof![Just(FallbackPolicy::Deny), Just(FallbackPolicy::Permit)]
}

/// Registered schemes, each mapped to "passes" or "fails".
fn arb_table() -> impl Strategy<Value = Vec<(String, bool)>> {
    prop::collection::vec((arb_scheme(), any::<bool>()), 0..4)
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

fn build(table: &[(String, bool)], fallback: FallbackPolicy, sink: Arc<MemorySink>) -> Enforcer {
    table
        .iter()
        .fold(Enforcer::builder().fallback(fallback), |builder, (scheme, passes)| {
            let passes = *passes;
            builder.policy(
                scheme.as_str(),
                validator_fn(move |_, _| {
                    if passes {
                        Ok(())
                    } else {
                        Err(ValidationError::new("rejected by test chain"))
                    }
                }),
            )
        })
        .default_sink(sink)
        .build()
}

/// The chain that ends up registered for `scheme`: the last one wins.
fn effective(table: &[(String, bool)], scheme: &str) -> Option<bool> {
    table
        .iter()
        .rev()
        .find(|(s, _)| s == scheme)
        .map(|(_, passes)| *passes)
}

proptest! {
    /// Property: no credential is always 403, whatever the configuration
    #[test]
    fn proptest_missing_credential_always_forbidden(
        table in arb_table(),
        fallback in arb_fallback(),
    ) {
        let sink = Arc::new(MemorySink::new());
        let enforcer = build(&table, fallback, sink.clone());

        let decision = block_on(enforcer.enforce(&RequestContext::new("req-prop")));

        prop_assert_eq!(decision.status(), Some(StatusCode::FORBIDDEN));
        prop_assert_eq!(sink.len(), 1);
        prop_assert_eq!(sink.events()[0].level(), Level::Error);
    }

    /// Property: the decision matches the table, fallback and last registration
    #[test]
    fn proptest_decision_matches_configuration(
        table in arb_table(),
        fallback in arb_fallback(),
        scheme in arb_scheme(),
        principal in "[a-z]{1,12}",
    ) {
        let sink = Arc::new(MemorySink::new());
        let enforcer = build(&table, fallback, sink.clone());
        let ctx = RequestContext::new("req-prop")
            .with_credential(Credential::new(scheme.as_str(), Token::new("jwt", principal)));

        let decision = block_on(enforcer.enforce(&ctx));

        let expected = match (effective(&table, &scheme), fallback) {
            (Some(true), _) | (None, FallbackPolicy::Permit) => None,
            (Some(false), _) => Some(StatusCode::UNAUTHORIZED),
            (None, FallbackPolicy::Deny) => Some(StatusCode::FORBIDDEN),
        };
        prop_assert_eq!(decision.status(), expected);

        let events = sink.events();
        prop_assert_eq!(events.len(), 1);
        let expected_level = if decision == Decision::Accept { Level::Debug } else { Level::Error };
        prop_assert_eq!(events[0].level(), expected_level);
    }

    /// Property: the same request twice yields the same decision
    #[test]
    fn proptest_decision_is_deterministic(
        table in arb_table(),
        fallback in arb_fallback(),
        scheme in arb_scheme(),
    ) {
        let sink = Arc::new(MemorySink::new());
        let enforcer = build(&table, fallback, sink);
        let ctx = RequestContext::new("req-prop")
            .with_credential(Credential::new(scheme.as_str(), Token::new("jwt", "p")));

        let first = block_on(enforcer.enforce(&ctx));
        let second = block_on(enforcer.enforce(&ctx));

        prop_assert_eq!(first, second);
    }
}

#[test]
fn allow_all_accepts_any_principal() {
    let enforcer = Enforcer::builder()
        .policy("Bearer", allow_all())
        .default_sink(Arc::new(MemorySink::new()))
        .build();

    for principal in ["", "root", "ünïcödé"] {
        let ctx = RequestContext::new("req")
            .with_credential(Credential::new("Bearer", Token::new("jwt", principal)));
        assert!(block_on(enforcer.enforce(&ctx)).is_accept());
    }
}
