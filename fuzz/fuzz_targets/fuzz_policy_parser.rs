#![no_main]

use libfuzzer_sys::fuzz_target;
use medgate_abac::{AttributeContext, EngineError, parse};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let policy = match parse(text) {
        Ok(policy) => policy,
        Err(EngineError::Lex(err)) => {
            assert!(err.offset() <= text.len(), "lex offset past input: {err}");
            return;
        }
        Err(EngineError::Parse(err)) => {
            assert!(err.offset <= text.len(), "parse offset past input: {err}");
            return;
        }
    };

    // Canonical form must re-parse to the same tree.
    let canonical = policy.to_string();
    let reparsed = parse(&canonical)
        .unwrap_or_else(|e| panic!("canonical form {canonical:?} failed to parse: {e}"));
    assert_eq!(policy.expr(), reparsed.expr(), "round trip changed {text:?}");

    // An empty context resolves nothing; the decision must still be total.
    let decision = policy.evaluate(&AttributeContext::new());
    assert!(decision.diagnostics.is_empty());
});
