use serde::{Deserialize, Serialize};
use workspace::ConfigurationId;

/// REST paths of the configuration store. `{id}` and `{path}` are replaced
/// with the url-encoded lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub object_by_id: String,
    pub object_by_path: String,
    pub objects: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            object_by_id: "/v2/workspace/object?id={id}".to_string(),
            object_by_path: "/v2/workspace/object?path={path}".to_string(),
            objects: "/v2/workspace/object".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationRef {
    Id(ConfigurationId),
    Path(String),
}

impl Endpoints {
    pub fn object_path(&self, target: &ConfigurationRef) -> String {
        match target {
            ConfigurationRef::Id(id) => self
                .object_by_id
                .replace("{id}", &encode_component(&id.to_string())),
            ConfigurationRef::Path(path) => self
                .object_by_path
                .replace("{path}", &encode_component(path)),
        }
    }
}

fn encode_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
