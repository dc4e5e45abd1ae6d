//! Required-scope sets.

use std::collections::BTreeSet;
use std::fmt;

/// The scopes an operation requires. An empty set marks an open endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet(BTreeSet<String>);

impl ScopeSet {
    /// A set with no requirements.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(scopes.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Space-separated, as used in `WWW-Authenticate` and token claims.
impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_set_dedupes_and_displays() {
        let set = ScopeSet::new(["b", "a", "b"]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("a"));
        assert_eq!(set.to_string(), "a b");
        assert!(ScopeSet::empty().is_empty());
    }
}
