use async_trait::async_trait;
use thiserror::Error;

/// Identifying attribute values handed to a [`Verifier`].
///
/// Values keep the order of the kind's lookup attribute list; absent or
/// empty attributes are left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub kind: String,
    pub address: String,
    /// Identifier the state records for the item; may be empty.
    pub declared_id: String,
    pub values: Vec<(String, String)>,
}

impl Lookup {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The resource's own identifier: the declared id, else the first
    /// lookup value.
    pub fn primary_id(&self) -> &str {
        if !self.declared_id.is_empty() {
            return &self.declared_id;
        }
        self.values.first().map_or("", |(_, v)| v.as_str())
    }

    /// All values joined with `/`, in lookup order.
    pub fn joined(&self) -> String {
        self.values
            .iter()
            .map(|(_, v)| v.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Typed failure contract at the inventory provider boundary.
///
/// Providers classify their own failures; the core never inspects error text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("resource not found")]
    NotFound,

    #[error("could not find {} attribute for {kind}", expected_list(.expected, .all))]
    MissingIdentifyingAttribute {
        kind: String,
        expected: Vec<String>,
        all: bool,
    },

    /// The kind has no usable identifier in state; a person has to check it.
    #[error(
        "verification is complex and {} not found in state attributes",
        expected_list(.expected, &false)
    )]
    ManualVerificationRequired { kind: String, expected: Vec<String> },

    #[error("{message}")]
    Other { message: String },
}

fn expected_list(expected: &[String], all: &bool) -> String {
    let sep = if *all { " and " } else { " or " };
    expected
        .iter()
        .map(|e| format!("'{e}'"))
        .collect::<Vec<_>>()
        .join(sep)
}

impl VerifyError {
    pub fn other(message: impl Into<String>) -> Self {
        VerifyError::Other {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            VerifyError::NotFound => "NOT_FOUND",
            VerifyError::MissingIdentifyingAttribute { .. } => "MISSING_IDENTIFYING_ATTRIBUTE",
            VerifyError::ManualVerificationRequired { .. } => "MANUAL_VERIFICATION_REQUIRED",
            VerifyError::Other { .. } => "VERIFY_FAILED",
        }
    }
}

/// Existence check for one resource kind against the live inventory.
///
/// Return the live identifier when the resource exists, [`VerifyError::NotFound`]
/// when it does not, and [`VerifyError::Other`] for anything else. When a
/// permission denial makes "exists" and "inaccessible" indistinguishable, an
/// implementation may report the resource as existing and log a warning.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, lookup: &Lookup) -> Result<String, VerifyError>;
}
