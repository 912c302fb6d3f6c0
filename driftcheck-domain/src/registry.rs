use crate::kinds::{LookupSpec, PASSIVE_KINDS, builtin_lookup};
use crate::ports::Verifier;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

struct Registration {
    lookup: LookupSpec,
    verifier: Arc<dyn Verifier>,
}

/// Mapping from resource kind to the verifier that checks it.
///
/// Populated at startup. The dispatcher only asks whether a registration
/// exists; it never needs the full set of kinds.
pub struct VerifierRegistry {
    verifiers: BTreeMap<String, Registration>,
    passive: BTreeSet<String>,
}

/// How a kind is handled.
pub enum Resolution<'a> {
    /// Data or local-only kind; no check is performed.
    Passive,
    Unregistered,
    Registered {
        lookup: &'a LookupSpec,
        verifier: Arc<dyn Verifier>,
    },
}

impl Default for VerifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VerifierRegistry {
    /// Empty registry that already knows the built-in passive kinds.
    pub fn new() -> Self {
        Self {
            verifiers: BTreeMap::new(),
            passive: PASSIVE_KINDS.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn with_passive_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.passive.extend(kinds.into_iter().map(Into::into));
        self
    }

    pub fn register(
        &mut self,
        kind: impl Into<String>,
        lookup: LookupSpec,
        verifier: Arc<dyn Verifier>,
    ) {
        self.verifiers
            .insert(kind.into(), Registration { lookup, verifier });
    }

    /// Register `verifier` for a kind from the built-in table.
    ///
    /// Returns `false` when the kind has no built-in lookup specification.
    pub fn register_builtin(&mut self, kind: &str, verifier: Arc<dyn Verifier>) -> bool {
        match builtin_lookup(kind) {
            Some(lookup) => {
                self.register(kind, lookup, verifier);
                true
            }
            None => false,
        }
    }

    pub fn resolve(&self, kind: &str) -> Resolution<'_> {
        if self.passive.contains(kind) {
            return Resolution::Passive;
        }
        match self.verifiers.get(kind) {
            Some(r) => Resolution::Registered {
                lookup: &r.lookup,
                verifier: Arc::clone(&r.verifier),
            },
            None => Resolution::Unregistered,
        }
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.verifiers.keys().map(String::as_str)
    }

    pub fn passive_kinds(&self) -> impl Iterator<Item = &str> {
        self.passive.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.verifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verifiers.is_empty()
    }
}
