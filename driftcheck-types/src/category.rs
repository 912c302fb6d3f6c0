use serde::{Deserialize, Serialize};
use std::fmt;

/// Action category assigned to every work item.
///
/// Variant order is the order categories appear in reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Data or local-only resource; nothing to verify remotely.
    Info,
    Ok,
    /// Resource kind has no registered verifier.
    Warning,
    Error,
    RegionMismatch,
    /// Live resource exists under a different identity.
    PotentialImport,
    /// Declared in the snapshot but missing remotely.
    Dangerous,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Info,
        Category::Ok,
        Category::Warning,
        Category::Error,
        Category::RegionMismatch,
        Category::PotentialImport,
        Category::Dangerous,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Info => "INFO",
            Category::Ok => "OK",
            Category::Warning => "WARNING",
            Category::Error => "ERROR",
            Category::RegionMismatch => "REGION_MISMATCH",
            Category::PotentialImport => "POTENTIAL_IMPORT",
            Category::Dangerous => "DANGEROUS",
        }
    }

    /// Section title used by the text report.
    pub fn title(self) -> &'static str {
        match self {
            Category::Info => "INFO",
            Category::Ok => "OK",
            Category::Warning => "WARNING",
            Category::Error => "ERROR",
            Category::RegionMismatch => "REGION MISMATCH",
            Category::PotentialImport => "POTENTIAL IMPORT",
            Category::Dangerous => "DANGEROUS",
        }
    }

    /// Whether results in this category may carry a remediation command.
    pub fn carries_command(self) -> bool {
        matches!(
            self,
            Category::RegionMismatch | Category::PotentialImport | Category::Dangerous
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
