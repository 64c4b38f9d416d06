//! Adapter for the natively typed state encoding written by Terraform 0.12+.
//!
//! Resources sit in one flat list with one or more instances each, and
//! attributes are first-class JSON values, so lists and maps are read
//! directly instead of being reconstructed from dotted keys. Identity lives
//! in the attribute bag (`inventory_hostname` / `inventory_group_name`);
//! instances missing their identity attribute are skipped. Absent, `null`,
//! or wrongly-typed attributes read as empty.

use super::{GROUP_RESOURCE, HOST_RESOURCE, StateError};
use serde::Deserialize;
use serde_json::{Map, Value};

const HOST_ID_ATTR: &str = "inventory_hostname";
const GROUP_ID_ATTR: &str = "inventory_group_name";

/// Top-level shape of a version-4 state payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModernState {
    #[serde(default)]
    pub resources: Vec<ModernResource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModernResource {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub instances: Vec<ModernInstance>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModernInstance {
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl ModernInstance {
    fn string_attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    fn string_list(&self, name: &str) -> Vec<String> {
        match self.attributes.get(name) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn object(&self, name: &str) -> Map<String, Value> {
        match self.attributes.get(name) {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        }
    }
}

impl ModernState {
    fn instances_of(&self, kind: &str) -> impl Iterator<Item = &ModernInstance> {
        self.resources
            .iter()
            .filter(move |resource| resource.kind == kind)
            .flat_map(|resource| resource.instances.iter())
    }

    fn ids_of(&self, kind: &str, id_attr: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .instances_of(kind)
            .filter_map(|instance| instance.string_attr(id_attr))
            .map(str::to_string)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn groups(&self) -> Vec<String> {
        self.ids_of(GROUP_RESOURCE, GROUP_ID_ATTR)
    }

    pub fn hosts(&self) -> Vec<String> {
        self.ids_of(HOST_RESOURCE, HOST_ID_ATTR)
    }

    /// Find the instance backing a specific group.
    pub fn group(&self, id: &str) -> Result<&ModernInstance, StateError> {
        self.instances_of(GROUP_RESOURCE)
            .find(|instance| instance.string_attr(GROUP_ID_ATTR) == Some(id))
            .ok_or_else(|| StateError::GroupNotFound(id.to_string()))
    }

    /// Find the instance backing a specific host.
    pub fn host(&self, id: &str) -> Result<&ModernInstance, StateError> {
        self.instances_of(HOST_RESOURCE)
            .find(|instance| instance.string_attr(HOST_ID_ATTR) == Some(id))
            .ok_or_else(|| StateError::HostNotFound(id.to_string()))
    }

    pub fn children_of(&self, group: &str) -> Result<Vec<String>, StateError> {
        let mut children = self.group(group)?.string_list("children");
        children.sort();
        children.dedup();
        Ok(children)
    }

    pub fn group_vars(&self, group: &str) -> Result<Map<String, Value>, StateError> {
        Ok(self.group(group)?.object("vars"))
    }

    pub fn host_vars(&self, host: &str) -> Result<Map<String, Value>, StateError> {
        Ok(self.host(host)?.object("vars"))
    }

    pub fn groups_of_host(&self, host: &str) -> Result<Vec<String>, StateError> {
        Ok(self.host(host)?.string_list("groups"))
    }

    pub fn hosts_of_group(&self, group: &str) -> Vec<String> {
        let mut hosts: Vec<String> = self
            .instances_of(HOST_RESOURCE)
            .filter_map(|instance| {
                let hostname = instance.string_attr(HOST_ID_ATTR)?;
                instance
                    .string_list("groups")
                    .iter()
                    .any(|member| member == group)
                    .then(|| hostname.to_string())
            })
            .collect();
        hosts.sort();
        hosts.dedup();
        hosts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_state() -> ModernState {
        let payload = json!({
            "version": 4,
            "resources": [
                {
                    "mode": "managed",
                    "type": "ansible_group",
                    "name": "group_1",
                    "provider": "provider.ansible",
                    "instances": [
                        {
                            "schema_version": 0,
                            "attributes": {
                                "id": "group_1",
                                "inventory_group_name": "group_1",
                                "children": ["group_2"],
                                "vars": {"foo": "bar"}
                            }
                        }
                    ]
                },
                {
                    "type": "ansible_group",
                    "name": "group_2",
                    "instances": [
                        {
                            "attributes": {
                                "id": "group_2",
                                "inventory_group_name": "group_2",
                                "children": null,
                                "vars": null
                            }
                        }
                    ]
                },
                {
                    "type": "ansible_host",
                    "name": "hosts",
                    "instances": [
                        {
                            "attributes": {
                                "id": "host_1",
                                "inventory_hostname": "host_1",
                                "groups": ["group_1"],
                                "vars": {"ansible_host": "1.2.3.4", "port": 22}
                            }
                        },
                        {
                            "attributes": {
                                "id": "host_2",
                                "inventory_hostname": "host_2",
                                "groups": ["group_1"],
                                "vars": {"ansible_host": "1.2.3.5"}
                            }
                        }
                    ]
                },
                {
                    "type": "ansible_host",
                    "name": "nameless",
                    "instances": [
                        {"attributes": {"id": "orphan"}}
                    ]
                }
            ]
        });
        serde_json::from_value(payload).expect("fixture deserializes")
    }

    #[test]
    fn lists_ids_from_identity_attributes() {
        let state = sample_state();
        assert_eq!(state.groups(), vec!["group_1", "group_2"]);
        // The instance without inventory_hostname is skipped entirely.
        assert_eq!(state.hosts(), vec!["host_1", "host_2"]);
    }

    #[test]
    fn native_attributes_read_directly() {
        let state = sample_state();
        assert_eq!(state.children_of("group_1").unwrap(), vec!["group_2"]);
        let vars = state.host_vars("host_1").unwrap();
        assert_eq!(vars.get("ansible_host"), Some(&json!("1.2.3.4")));
        assert_eq!(vars.get("port"), Some(&json!(22)));
    }

    #[test]
    fn null_attributes_read_as_empty() {
        let state = sample_state();
        assert!(state.children_of("group_2").unwrap().is_empty());
        assert!(state.group_vars("group_2").unwrap().is_empty());
    }

    #[test]
    fn reverse_scan_finds_group_members() {
        let state = sample_state();
        assert_eq!(state.hosts_of_group("group_1"), vec!["host_1", "host_2"]);
        assert!(state.hosts_of_group("group_2").is_empty());
    }

    #[test]
    fn missing_resources_are_not_found() {
        let state = sample_state();
        assert!(matches!(
            state.group("group_9"),
            Err(StateError::GroupNotFound(_))
        ));
        assert!(matches!(
            state.host("orphan"),
            Err(StateError::HostNotFound(_))
        ));
    }
}
