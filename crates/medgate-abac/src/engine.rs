//! Policy compilation and the request-facing engine.
//!
//! The free functions ([`parse`], [`evaluate`], [`evaluate_compiled`]) are
//! the whole contract: text in, decision out, no state. [`PolicyEngine`]
//! adds a bounded cache of compiled policies, configurable limits and an
//! audit trail on top.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::ast::Expr;
use crate::attributes::{Principal, ResourceAttributes};
use crate::cache::SieveCache;
use crate::context::{AttributeContext, DEFAULT_MAX_ATTRIBUTES};
use crate::error::{ContextError, EnforcementError, EngineError};
use crate::evaluator::{self, Decision};
use crate::lexer::DEFAULT_MAX_POLICY_BYTES;
use crate::parser::parse_expr_with_limit;
use crate::value::AttributeValue;

/// Default number of compiled policies kept by a [`PolicyEngine`].
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

// ============================================================================
// Compiled Policy
// ============================================================================

/// A parsed policy, ready to evaluate any number of times.
///
/// Immutable once built; share it freely across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPolicy {
    source: String,
    root: Expr,
}

impl CompiledPolicy {
    /// The policy text this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.root
    }

    pub fn evaluate(&self, ctx: &AttributeContext) -> Decision {
        evaluator::evaluate(&self.root, ctx)
    }
}

/// Prints the canonical form.
impl fmt::Display for CompiledPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Creates an empty context with the default capacity.
pub fn create_context() -> AttributeContext {
    AttributeContext::new()
}

/// Stores an attribute, overwriting any previous value under `name`.
pub fn set_attribute(
    ctx: &mut AttributeContext,
    name: &str,
    value: impl Into<AttributeValue>,
) -> Result<(), ContextError> {
    ctx.set(name, value)
}

/// Compiles policy text.
pub fn parse(policy_text: &str) -> Result<CompiledPolicy, EngineError> {
    compile_with_limit(policy_text, DEFAULT_MAX_POLICY_BYTES)
}

/// Compiles and evaluates in one step.
///
/// A policy that fails to compile is an `Err`, never a decision.
pub fn evaluate(policy_text: &str, ctx: &AttributeContext) -> Result<Decision, EngineError> {
    Ok(parse(policy_text)?.evaluate(ctx))
}

/// Evaluates a previously compiled policy.
pub fn evaluate_compiled(policy: &CompiledPolicy, ctx: &AttributeContext) -> Decision {
    policy.evaluate(ctx)
}

fn compile_with_limit(policy_text: &str, max_bytes: usize) -> Result<CompiledPolicy, EngineError> {
    let root = parse_expr_with_limit(policy_text, max_bytes)?;
    Ok(CompiledPolicy {
        source: policy_text.to_string(),
        root,
    })
}

// ============================================================================
// Policy Engine
// ============================================================================

/// Cache counters reported by [`PolicyEngine::cache_stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
    pub capacity: usize,
}

/// Compiles, caches and evaluates policies, logging every decision.
///
/// Safe to share between threads. The cache lock is only held for lookups
/// and inserts, never while parsing or evaluating.
///
/// # Example
///
/// ```
/// use medgate_abac::{PolicyEngine, StandardPolicies};
///
/// let engine = PolicyEngine::new().without_audit();
/// let ctx = engine.new_context().with("role", "Nurse").unwrap();
///
/// assert!(engine.enforce(StandardPolicies::ORDER_LABS, &ctx).is_ok());
/// assert!(engine.enforce(StandardPolicies::ADMIN_ONLY, &ctx).is_err());
/// ```
#[derive(Debug)]
pub struct PolicyEngine {
    cache: Option<Mutex<SieveCache<String, Arc<CompiledPolicy>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    max_policy_bytes: usize,
    max_attributes: usize,
    audit_enabled: bool,
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyEngine {
    /// Creates an engine with default limits, caching and auditing enabled.
    pub fn new() -> Self {
        Self {
            cache: NonZeroUsize::new(DEFAULT_CACHE_CAPACITY)
                .map(|cap| Mutex::new(SieveCache::new(cap))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            max_policy_bytes: DEFAULT_MAX_POLICY_BYTES,
            max_attributes: DEFAULT_MAX_ATTRIBUTES,
            audit_enabled: true,
        }
    }

    /// Sets the number of cached policies. `0` disables the cache.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = NonZeroUsize::new(capacity).map(|cap| Mutex::new(SieveCache::new(cap)));
        self
    }

    pub fn with_max_policy_bytes(mut self, max_bytes: usize) -> Self {
        self.max_policy_bytes = max_bytes;
        self
    }

    /// Capacity of contexts handed out by [`new_context`](Self::new_context).
    pub fn with_max_attributes(mut self, max_attributes: usize) -> Self {
        self.max_attributes = max_attributes;
        self
    }

    /// Disables audit logging (for testing).
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self
    }

    pub fn max_policy_bytes(&self) -> usize {
        self.max_policy_bytes
    }

    pub fn max_attributes(&self) -> usize {
        self.max_attributes
    }

    /// Creates an empty context sized for this engine.
    pub fn new_context(&self) -> AttributeContext {
        AttributeContext::with_capacity(self.max_attributes)
    }

    /// Builds a request context sized for this engine.
    ///
    /// Same attributes as [`AttributeContext::for_request`], but the
    /// configured `max_attributes` bound applies.
    pub fn context_for_request(
        &self,
        principal: &Principal,
        resource: Option<&ResourceAttributes>,
    ) -> Result<AttributeContext, ContextError> {
        AttributeContext::for_request_in(self.new_context(), principal, resource)
    }

    /// Compiles `policy_text`, reusing a cached compilation when present.
    pub fn compile(&self, policy_text: &str) -> Result<Arc<CompiledPolicy>, EngineError> {
        if let Some(hit) = self.lock_cache().and_then(|mut cache| cache.get(policy_text)) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(policy = %policy_text, "Policy cache hit");
            return Ok(hit);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let compiled = match compile_with_limit(policy_text, self.max_policy_bytes) {
            Ok(compiled) => Arc::new(compiled),
            Err(err) => {
                if self.audit_enabled {
                    error!(policy = %policy_text, error = %err, "Policy failed to compile");
                }
                return Err(err);
            }
        };

        if let Some(mut cache) = self.lock_cache() {
            if let Some(evicted) = cache.insert(policy_text.to_string(), Arc::clone(&compiled)) {
                debug!(evicted = %evicted, "Policy evicted from cache");
            }
        }
        debug!(policy = %policy_text, nodes = compiled.expr().node_count(), "Policy compiled");
        Ok(compiled)
    }

    /// Compiles (through the cache) and evaluates, recording the decision
    /// in the audit log.
    pub fn evaluate(
        &self,
        policy_text: &str,
        ctx: &AttributeContext,
    ) -> Result<Decision, EngineError> {
        let policy = self.compile(policy_text)?;
        let decision = policy.evaluate(ctx);
        self.audit(&policy, ctx, &decision);
        Ok(decision)
    }

    /// Collapses every outcome other than ALLOW into an error for the
    /// request layer.
    ///
    /// An uncompilable policy is [`EnforcementError::InvalidPolicy`]; both a
    /// plain DENY and a DENY caused by an evaluation error are
    /// [`EnforcementError::AccessDenied`].
    pub fn enforce(
        &self,
        policy_text: &str,
        ctx: &AttributeContext,
    ) -> Result<(), EnforcementError> {
        let decision = self.evaluate(policy_text, ctx)?;
        if decision.is_allowed() {
            return Ok(());
        }
        let reason = decision
            .diagnostic()
            .unwrap_or_else(|| format!("policy `{policy_text}` evaluated to DENY"));
        Err(EnforcementError::AccessDenied { reason })
    }

    pub fn cache_stats(&self) -> CacheStats {
        let (len, capacity) = self
            .lock_cache()
            .map_or((0, 0), |cache| (cache.len(), cache.capacity()));
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            len,
            capacity,
        }
    }

    /// Drops every cached compilation. Counters are kept.
    pub fn clear_cache(&self) {
        if let Some(mut cache) = self.lock_cache() {
            cache.clear();
        }
    }

    /// Returns `true` if `policy_text` is currently cached.
    pub fn is_cached(&self, policy_text: &str) -> bool {
        self.lock_cache()
            .is_some_and(|cache| cache.contains(policy_text))
    }

    fn lock_cache(&self) -> Option<MutexGuard<'_, SieveCache<String, Arc<CompiledPolicy>>>> {
        // Entries are immutable, so a poisoned lock still guards valid data.
        self.cache
            .as_ref()
            .map(|cache| cache.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn audit(&self, policy: &CompiledPolicy, ctx: &AttributeContext, decision: &Decision) {
        if !self.audit_enabled {
            return;
        }
        let role = ctx.get("role").and_then(AttributeValue::as_str).unwrap_or("-");
        if decision.is_allowed() {
            info!(
                policy = %policy.source(),
                role = %role,
                recovered = decision.diagnostics.len(),
                "Access granted"
            );
        } else {
            warn!(
                policy = %policy.source(),
                role = %role,
                diagnostics = ?decision.diagnostic(),
                "Access denied"
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Role;
    use crate::error::{LexError, ParseError};
    use crate::evaluator::Effect;

    #[test]
    fn test_free_function_flow() {
        let mut ctx = create_context();
        set_attribute(&mut ctx, "role", "Doctor").unwrap();
        set_attribute(&mut ctx, "level", 5).unwrap();

        let decision = evaluate("role == 'Doctor' AND level > 3", &ctx).unwrap();
        assert_eq!(decision.effect, Effect::Allow);

        let compiled = parse("role == 'Doctor' AND level > 3").unwrap();
        assert_eq!(evaluate_compiled(&compiled, &ctx), decision);
    }

    #[test]
    fn test_parse_failure_is_error_not_decision() {
        let ctx = create_context();
        assert!(matches!(
            evaluate("role ==", &ctx),
            Err(EngineError::Parse(ParseError { position: 2, .. }))
        ));
        assert!(matches!(
            evaluate("role == 'Doctor", &ctx),
            Err(EngineError::Lex(LexError::UnterminatedString { .. }))
        ));
    }

    #[test]
    fn test_compiled_policy_accessors() {
        let compiled = parse("NOT (role == 'Nurse')").unwrap();
        assert_eq!(compiled.source(), "NOT (role == 'Nurse')");
        assert_eq!(compiled.to_string(), "NOT role == \"Nurse\"");
        assert_eq!(compiled.expr().node_count(), 2);
    }

    #[test]
    fn test_engine_caches_compilations() {
        let engine = PolicyEngine::new().without_audit();
        let first = engine.compile("role == 'Doctor'").unwrap();
        let second = engine.compile("role == 'Doctor'").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(engine.is_cached("role == 'Doctor'"));
        let stats = engine.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.len, 1);
        assert_eq!(stats.capacity, DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn test_engine_failed_compile_not_cached() {
        let engine = PolicyEngine::new().without_audit();
        assert!(engine.compile("role ==").is_err());
        assert!(engine.compile("role ==").is_err());
        assert!(!engine.is_cached("role =="));
        assert_eq!(engine.cache_stats().misses, 2);
    }

    #[test]
    fn test_engine_without_cache() {
        let engine = PolicyEngine::new().with_cache_capacity(0).without_audit();
        let first = engine.compile("role == 'Doctor'").unwrap();
        let second = engine.compile("role == 'Doctor'").unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
        assert_eq!(engine.cache_stats().capacity, 0);
        assert!(!engine.is_cached("role == 'Doctor'"));
    }

    #[test]
    fn test_engine_cache_eviction_and_clear() {
        let engine = PolicyEngine::new().with_cache_capacity(1).without_audit();
        engine.compile("a == 1").unwrap();
        engine.compile("b == 2").unwrap();
        assert!(!engine.is_cached("a == 1"));
        assert!(engine.is_cached("b == 2"));

        engine.clear_cache();
        assert_eq!(engine.cache_stats().len, 0);
        assert_eq!(engine.cache_stats().misses, 2);
    }

    #[test]
    fn test_engine_policy_size_limit() {
        let engine = PolicyEngine::new().with_max_policy_bytes(8).without_audit();
        assert!(matches!(
            engine.compile("role == 'Doctor'"),
            Err(EngineError::Lex(LexError::InputTooLong { limit: 8, .. }))
        ));
        assert!(engine.compile("a == 1").is_ok());
    }

    #[test]
    fn test_engine_context_capacity() {
        let engine = PolicyEngine::new().with_max_attributes(1).without_audit();
        let mut ctx = engine.new_context();
        ctx.set("role", "Doctor").unwrap();
        assert!(ctx.set("level", 3).is_err());
        assert_eq!(engine.max_attributes(), 1);
    }

    #[test]
    fn test_context_for_request_honours_capacity() {
        let doctor = Principal::new(7, Role::Doctor)
            .with_department("Cardiology")
            .with_clearance(4);
        let chart = ResourceAttributes::new("patient_record").with_department("Cardiology");

        let engine = PolicyEngine::new().with_max_attributes(3).without_audit();
        assert_eq!(
            engine.context_for_request(&doctor, Some(&chart)),
            Err(ContextError::CapacityExceeded { capacity: 3 })
        );

        let engine = PolicyEngine::new().without_audit();
        let ctx = engine.context_for_request(&doctor, Some(&chart)).unwrap();
        assert_eq!(ctx.capacity(), DEFAULT_MAX_ATTRIBUTES);
        assert!(
            engine
                .evaluate(crate::StandardPolicies::SENSITIVE_RECORD, &ctx)
                .unwrap()
                .is_allowed()
        );
    }

    #[test]
    fn test_long_chain_is_parse_error_under_raised_limit() {
        let engine = PolicyEngine::new()
            .with_max_policy_bytes(1 << 20)
            .without_audit();
        let policy = vec!["a == 1"; 50_000].join(" AND ");
        let ctx = create_context().with("a", 1).unwrap();

        let err = engine.evaluate(&policy, &ctx).unwrap_err();
        assert!(matches!(err, EngineError::Parse(ref e) if e.expected.contains("expression nodes")));
        assert!(!engine.is_cached(&policy));
    }

    #[test]
    fn test_enforce_allow() {
        let engine = PolicyEngine::new().without_audit();
        let ctx = create_context().with("role", "Admin").unwrap();
        assert!(engine.enforce("role == 'Admin'", &ctx).is_ok());
    }

    #[test]
    fn test_enforce_plain_deny() {
        let engine = PolicyEngine::new().without_audit();
        let ctx = create_context().with("role", "Nurse").unwrap();
        let err = engine.enforce("role == 'Admin'", &ctx).unwrap_err();
        assert!(matches!(err, EnforcementError::AccessDenied { .. }));
        assert!(err.to_string().starts_with("Access denied"));
    }

    #[test]
    fn test_enforce_error_deny_carries_diagnostic() {
        let engine = PolicyEngine::new().without_audit();
        let ctx = create_context().with("level", "high").unwrap();
        let Err(EnforcementError::AccessDenied { reason }) = engine.enforce("level > 3", &ctx)
        else {
            panic!("expected denial");
        };
        assert!(reason.contains("type mismatch"));
    }

    #[test]
    fn test_enforce_invalid_policy() {
        let engine = PolicyEngine::new().without_audit();
        let err = engine.enforce("role", &create_context()).unwrap_err();
        assert!(matches!(err, EnforcementError::InvalidPolicy(_)));
    }

    #[test]
    fn test_engine_shared_across_threads() {
        let engine = Arc::new(PolicyEngine::new().without_audit());
        let handles: Vec<_> = (0..4_i64)
            .map(|level| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    let ctx = create_context().with("level", level).unwrap();
                    engine.evaluate("level >= 2", &ctx).unwrap().is_allowed()
                })
            })
            .collect();
        let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, vec![false, false, true, true]);
        assert_eq!(engine.cache_stats().len, 1);
    }

    #[test]
    fn test_audit_path_runs() {
        let engine = PolicyEngine::new();
        let ctx = create_context().with("role", "Doctor").unwrap();
        assert!(engine.evaluate("role == 'Doctor'", &ctx).unwrap().is_allowed());
        assert!(engine.evaluate("role == 'Nurse'", &ctx).unwrap().is_denied());
        assert!(engine.evaluate("role ==", &ctx).is_err());
    }
}
