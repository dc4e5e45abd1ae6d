//! Scope matching strategies.

use crate::scope::ScopeSet;
use std::sync::Arc;
use tollgate_core::PolicyKind;

/// Decides whether granted scopes satisfy a non-empty required set.
///
/// Closures of the form `Fn(&[String], &ScopeSet) -> bool` implement this
/// trait, so one-off rules need no named type.
pub trait ScopePolicy: Send + Sync {
    fn permits(&self, granted: &[String], required: &ScopeSet) -> bool;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// At least one required scope must be granted.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyOf;

impl ScopePolicy for AnyOf {
    fn permits(&self, granted: &[String], required: &ScopeSet) -> bool {
        granted.iter().any(|s| required.contains(s))
    }

    fn name(&self) -> &'static str {
        "any_of"
    }
}

/// Every required scope must be granted.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllOf;

impl ScopePolicy for AllOf {
    fn permits(&self, granted: &[String], required: &ScopeSet) -> bool {
        required.iter().all(|r| granted.iter().any(|s| s == r))
    }

    fn name(&self) -> &'static str {
        "all_of"
    }
}

impl<F> ScopePolicy for F
where
    F: Fn(&[String], &ScopeSet) -> bool + Send + Sync,
{
    fn permits(&self, granted: &[String], required: &ScopeSet) -> bool {
        self(granted, required)
    }
}

/// Policy for a configured resource.
pub fn policy_for(kind: PolicyKind) -> Arc<dyn ScopePolicy> {
    match kind {
        PolicyKind::AnyOf => Arc::new(AnyOf),
        PolicyKind::AllOf => Arc::new(AllOf),
    }
}
