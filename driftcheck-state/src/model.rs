use driftcheck_types::AttributeMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use serde_json::value::RawValue;
use std::collections::BTreeMap;
use std::fmt;

/// Canonical in-memory form of a version 4 state document.
///
/// Fields the model does not name are dropped during decoding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StateSnapshot {
    pub version: u64,

    #[serde(default)]
    pub terraform_version: String,

    #[serde(default)]
    pub serial: u64,

    #[serde(default)]
    pub lineage: String,

    #[serde(default)]
    pub outputs: BTreeMap<String, OutputValue>,

    #[serde(default)]
    pub resources: Vec<ResourceRecord>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub check_results: Vec<CheckResult>,
}

impl StateSnapshot {
    pub fn instance_count(&self) -> usize {
        self.resources.iter().map(|r| r.instances.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputValue {
    pub value: Value,

    #[serde(rename = "type", default)]
    pub value_type: Value,

    #[serde(default)]
    pub sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResourceRecord {
    #[serde(default)]
    pub module: String,

    #[serde(default = "default_mode")]
    pub mode: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub name: String,

    #[serde(default)]
    pub each: Option<String>,

    #[serde(default)]
    pub provider: String,

    #[serde(default)]
    pub instances: Vec<InstanceRecord>,
}

fn default_mode() -> String {
    "managed".to_string()
}

impl ResourceRecord {
    /// Address of `instance`: `[module.][data.]kind.name[index]`.
    pub fn instance_address(&self, instance: &InstanceRecord) -> String {
        let mut address = format!("{}.{}", self.kind, self.name);
        if self.mode == "data" {
            address = format!("data.{address}");
        }
        if !self.module.is_empty() {
            address = format!("{}.{}", self.module, address);
        }
        if let Some(key) = &instance.index_key {
            address.push_str(&key.to_string());
        }
        address
    }
}

/// `count` or `for_each` key of an instance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IndexKey {
    Str(String),
    Int(i64),
    Other(Value),
}

impl fmt::Display for IndexKey {
    /// Renders the bracketed address suffix.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Str(s) => write!(f, "[\"{s}\"]"),
            IndexKey::Int(n) => write!(f, "[{n}]"),
            IndexKey::Other(v) => write!(f, "[{v}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstanceRecord {
    #[serde(default)]
    pub index_key: Option<IndexKey>,

    #[serde(default)]
    pub schema_version: u64,

    #[serde(default)]
    pub attributes: Option<RawAttributes>,

    /// Legacy flatmap attributes, consulted when `attributes` is absent.
    #[serde(default)]
    pub attributes_flat: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub sensitive_attributes: Option<Value>,

    #[serde(default)]
    pub private: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub deposed: Option<String>,

    #[serde(default)]
    pub create_before_destroy: bool,
}

impl InstanceRecord {
    /// Decode the attribute document on demand.
    pub fn decode_attributes(&self) -> Result<AttributeMap, serde_json::Error> {
        if let Some(raw) = &self.attributes {
            return raw.decode();
        }
        Ok(self
            .attributes_flat
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect())
    }
}

/// Undecoded attribute document, kept verbatim until a field is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttributes(String);

impl RawAttributes {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn decode(&self) -> Result<AttributeMap, serde_json::Error> {
        serde_json::from_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RawAttributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Ok(Self(raw.get().to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckResult {
    pub object_kind: String,
    pub config_addr: String,
    pub status: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub objects: Vec<CheckObject>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckObject {
    pub object_addr: String,
    pub status: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub failure_messages: Vec<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
