use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Whether a resource is managed by the tool or read through a data source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceMode {
    #[default]
    Managed,
    Data,
}

impl ResourceMode {
    /// Parse the snapshot's `mode` string. Anything other than `data` is managed.
    pub fn from_mode(mode: &str) -> Self {
        if mode == "data" {
            ResourceMode::Data
        } else {
            ResourceMode::Managed
        }
    }

    /// Label used in the machine-readable report.
    pub fn report_kind(self) -> &'static str {
        match self {
            ResourceMode::Managed => "resource",
            ResourceMode::Data => "data",
        }
    }
}

/// Decoded attributes of one resource instance.
///
/// Attribute schemas differ per resource kind, so values stay as loose JSON
/// and callers pull out the fields they need.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap(Map<String, Value>);

impl AttributeMap {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// String value of `name`, if present and a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// String value of `name`, ignoring empty strings.
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get_str(name).filter(|s| !s.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Map<String, Value>> for AttributeMap {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One declared resource instance awaiting classification.
///
/// `address` is unique within a run and is the sort/join key for every
/// downstream structure.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub address: String,
    /// Resource type, e.g. `aws_s3_bucket`.
    pub kind: String,
    pub mode: ResourceMode,
    /// Value of the `id` attribute, empty when absent.
    pub declared_id: String,
    /// Region-qualified identifier embedded in the attributes, if any.
    pub embedded_identifier: Option<String>,
    pub attributes: AttributeMap,
    /// Set when the instance attributes could not be decoded.
    pub attribute_error: Option<String>,
}

impl WorkItem {
    pub fn new(address: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            kind: kind.into(),
            mode: ResourceMode::Managed,
            declared_id: String::new(),
            embedded_identifier: None,
            attributes: AttributeMap::default(),
            attribute_error: None,
        }
    }

    pub fn with_declared_id(mut self, id: impl Into<String>) -> Self {
        self.declared_id = id.into();
        self
    }

    pub fn with_attributes(mut self, attributes: AttributeMap) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_mode(mut self, mode: ResourceMode) -> Self {
        self.mode = mode;
        self
    }
}
