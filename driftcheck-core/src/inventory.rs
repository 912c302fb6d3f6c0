//! Inventory provider backed by a JSON document of live resources.
//!
//! ```json
//! {
//!   "resources":    { "aws_instance": { "i-0abc": "i-0abc" } },
//!   "inaccessible": { "aws_s3_bucket": ["locked-bucket"] },
//!   "failing":      { "aws_vpc": { "vpc-1": "throttled" } }
//! }
//! ```
//!
//! Keys are the lookup values of a resource joined with `/`; values under
//! `resources` are the live identifiers.

use anyhow::Context;
use async_trait::async_trait;
use camino::Utf8Path;
use driftcheck_domain::kinds::builtin_lookup;
use driftcheck_domain::{Lookup, Verifier, VerifierRegistry, VerifyError};
use fs_err as fs;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InventoryFile {
    /// Live resources per kind: lookup key to live id.
    pub resources: BTreeMap<String, BTreeMap<String, String>>,
    /// Keys that exist but cannot be read (permission denied).
    pub inaccessible: BTreeMap<String, BTreeSet<String>>,
    /// Keys whose lookup fails with the given message.
    pub failing: BTreeMap<String, BTreeMap<String, String>>,
}

impl InventoryFile {
    pub fn load(path: &Utf8Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("read inventory {}", path))?;
        Self::parse(&text).with_context(|| format!("parse inventory {}", path))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Every kind mentioned anywhere in the document.
    pub fn kinds(&self) -> BTreeSet<&str> {
        self.resources
            .keys()
            .chain(self.inaccessible.keys())
            .chain(self.failing.keys())
            .map(String::as_str)
            .collect()
    }

    /// Register one verifier per kind that has a built-in lookup.
    ///
    /// Kinds without one are skipped with a warning and will classify as
    /// unsupported.
    pub fn into_registry(self) -> VerifierRegistry {
        let kinds: Vec<String> = self.kinds().into_iter().map(str::to_string).collect();
        let inventory = Arc::new(self);
        let mut registry = VerifierRegistry::new();

        for kind in kinds {
            let verifier = Arc::new(InventoryVerifier {
                kind: kind.clone(),
                inventory: Arc::clone(&inventory),
            });
            if registry.register_builtin(&kind, verifier) {
                debug!(kind = %kind, "registered inventory verifier");
            } else {
                warn!(kind = %kind, "inventory lists a kind with no lookup definition; ignoring");
            }
        }
        registry
    }
}

/// Verifier for one kind, answering from a shared [`InventoryFile`].
pub struct InventoryVerifier {
    kind: String,
    inventory: Arc<InventoryFile>,
}

#[async_trait]
impl Verifier for InventoryVerifier {
    async fn verify(&self, lookup: &Lookup) -> Result<String, VerifyError> {
        let key = lookup.joined();

        if let Some(message) = self.inventory.failing.get(&self.kind).and_then(|m| m.get(&key)) {
            return Err(VerifyError::other(message.clone()));
        }

        if self
            .inventory
            .inaccessible
            .get(&self.kind)
            .is_some_and(|keys| keys.contains(&key))
        {
            warn!(
                address = %lookup.address,
                key = %key,
                "access denied while checking resource; assuming it exists"
            );
            return Ok(lookup.primary_id().to_string());
        }

        self.inventory
            .resources
            .get(&self.kind)
            .and_then(|m| m.get(&key))
            .cloned()
            .ok_or(VerifyError::NotFound)
    }
}

/// Kinds in `inventory` that the registry will verify.
pub fn verifiable_kinds(inventory: &InventoryFile) -> Vec<&str> {
    inventory
        .kinds()
        .into_iter()
        .filter(|k| builtin_lookup(k).is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftcheck_domain::{Dispatcher, Resolution};
    use driftcheck_types::{AttributeMap, Category, WorkItem};
    use pretty_assertions::assert_eq;

    fn inventory() -> InventoryFile {
        InventoryFile::parse(
            r#"{
              "resources": { "aws_instance": { "i-1": "i-1", "i-2": "i-2b" } },
              "inaccessible": { "aws_s3_bucket": ["locked"] },
              "failing": { "aws_vpc": { "vpc-1": "throttled" }, "aws_glue_job": {} }
            }"#,
        )
        .expect("parse")
    }

    fn lookup(kind: &str, value: &str) -> Lookup {
        Lookup {
            kind: kind.to_string(),
            address: format!("{kind}.x"),
            declared_id: value.to_string(),
            values: vec![("id".to_string(), value.to_string())],
        }
    }

    fn verifier(kind: &str) -> InventoryVerifier {
        InventoryVerifier {
            kind: kind.to_string(),
            inventory: Arc::new(inventory()),
        }
    }

    #[tokio::test]
    async fn answers_from_document() {
        let v = verifier("aws_instance");
        assert_eq!(v.verify(&lookup("aws_instance", "i-1")).await, Ok("i-1".to_string()));
        assert_eq!(v.verify(&lookup("aws_instance", "i-2")).await, Ok("i-2b".to_string()));
        assert_eq!(
            v.verify(&lookup("aws_instance", "i-3")).await,
            Err(VerifyError::NotFound)
        );
    }

    #[tokio::test]
    async fn inaccessible_entries_are_assumed_to_exist() {
        let v = verifier("aws_s3_bucket");
        assert_eq!(
            v.verify(&lookup("aws_s3_bucket", "locked")).await,
            Ok("locked".to_string())
        );
    }

    #[tokio::test]
    async fn inaccessible_composite_key_reports_own_identifier() {
        let inv = InventoryFile::parse(
            r#"{ "inaccessible": { "aws_security_group": ["sg-1/web"] } }"#,
        )
        .expect("parse");
        let registry = Arc::new(inv.into_registry());
        let attributes: AttributeMap =
            serde_json::from_value(serde_json::json!({"id": "sg-1", "name": "web"}))
                .expect("object");
        let item = WorkItem::new("aws_security_group.web", "aws_security_group")
            .with_declared_id("sg-1")
            .with_attributes(attributes);

        let outcome = Dispatcher::new(registry, "us-west-2", 2)
            .dispatch(vec![item])
            .await
            .expect("dispatch");

        assert_eq!(outcome.results.len(), 1);
        let result = &outcome.results[0];
        assert_eq!(result.category, Category::Ok);
        assert_eq!(result.live_id, "sg-1");
        assert_eq!(result.command, None);
    }

    #[tokio::test]
    async fn failing_entries_return_typed_errors() {
        let v = verifier("aws_vpc");
        let err = v.verify(&lookup("aws_vpc", "vpc-1")).await.expect_err("fails");
        assert_eq!(err, VerifyError::other("throttled"));
        assert_eq!(err.error_code(), "VERIFY_FAILED");
    }

    #[test]
    fn registry_covers_only_known_kinds() {
        let inv = inventory();
        assert_eq!(
            verifiable_kinds(&inv),
            vec!["aws_instance", "aws_s3_bucket", "aws_vpc"]
        );

        let registry = inv.into_registry();
        assert_eq!(registry.len(), 3);
        assert!(matches!(
            registry.resolve("aws_glue_job"),
            Resolution::Unregistered
        ));
        assert!(matches!(
            registry.resolve("aws_instance"),
            Resolution::Registered { .. }
        ));
    }

    #[test]
    fn empty_document_is_valid() {
        let inv = InventoryFile::parse("{}").expect("parse");
        assert_eq!(inv, InventoryFile::default());
        assert!(inv.into_registry().is_empty());
    }
}
