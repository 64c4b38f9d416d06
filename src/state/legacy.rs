//! Adapter for the flattened state encoding written by Terraform up to 0.11.
//!
//! Resources are grouped into modules and every attribute is a flat mapping
//! from dotted names to string values; structured attributes (lists, maps)
//! have to be reconstructed from that mapping. The reconstruction helpers
//! return typed results instead of downcasting through a generic value, so a
//! malformed bag degrades to "empty" rather than panicking.

use super::{GROUP_RESOURCE, HOST_RESOURCE, StateError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Top-level shape of a version-3 state payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyState {
    #[serde(default)]
    pub modules: Vec<LegacyModule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyModule {
    #[serde(default)]
    pub resources: BTreeMap<String, LegacyResource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyResource {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub primary: LegacyInstance,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyInstance {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl LegacyState {
    fn resources_of(&self, kind: &str) -> impl Iterator<Item = &LegacyResource> {
        self.modules
            .iter()
            .flat_map(|module| module.resources.values())
            .filter(move |resource| resource.kind == kind)
    }

    fn ids_of(&self, kind: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .resources_of(kind)
            .map(|resource| resource.primary.id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn groups(&self) -> Vec<String> {
        self.ids_of(GROUP_RESOURCE)
    }

    pub fn hosts(&self) -> Vec<String> {
        self.ids_of(HOST_RESOURCE)
    }

    /// Find a specific group resource by id.
    pub fn group(&self, id: &str) -> Result<&LegacyResource, StateError> {
        self.resources_of(GROUP_RESOURCE)
            .find(|resource| resource.primary.id == id)
            .ok_or_else(|| StateError::GroupNotFound(id.to_string()))
    }

    /// Find a specific host resource by id.
    pub fn host(&self, id: &str) -> Result<&LegacyResource, StateError> {
        self.resources_of(HOST_RESOURCE)
            .find(|resource| resource.primary.id == id)
            .ok_or_else(|| StateError::HostNotFound(id.to_string()))
    }

    pub fn children_of(&self, group: &str) -> Result<Vec<String>, StateError> {
        let resource = self.group(group)?;
        let mut children = indexed_list(&resource.primary.attributes, "children");
        children.sort();
        children.dedup();
        Ok(children)
    }

    pub fn group_vars(&self, group: &str) -> Result<Map<String, Value>, StateError> {
        Ok(keyed_map(&self.group(group)?.primary.attributes, "vars"))
    }

    pub fn host_vars(&self, host: &str) -> Result<Map<String, Value>, StateError> {
        Ok(keyed_map(&self.host(host)?.primary.attributes, "vars"))
    }

    pub fn groups_of_host(&self, host: &str) -> Result<Vec<String>, StateError> {
        Ok(indexed_list(&self.host(host)?.primary.attributes, "groups"))
    }

    pub fn hosts_of_group(&self, group: &str) -> Vec<String> {
        let mut hosts: Vec<String> = self
            .resources_of(HOST_RESOURCE)
            .filter(|resource| {
                indexed_list(&resource.primary.attributes, "groups")
                    .iter()
                    .any(|member| member == group)
            })
            .map(|resource| resource.primary.id.clone())
            .collect();
        hosts.sort();
        hosts.dedup();
        hosts
    }
}

/// Reconstruct a list attribute `name` from its `name.<index>` keys, skipping
/// the `name.#` counter.
///
/// Elements come back in ascending full-key order, which is lexicographic
/// over the index: `groups.10` sorts before `groups.2`. Consumers of the
/// emitted inventory have only ever seen that order, so it is kept as-is
/// instead of re-sorting numerically.
fn indexed_list(attributes: &BTreeMap<String, String>, name: &str) -> Vec<String> {
    let prefix = format!("{name}.");
    let counter = format!("{name}.#");
    attributes
        .iter()
        .filter(|(key, _)| key.starts_with(&prefix) && key.as_str() != counter)
        .map(|(_, value)| value.clone())
        .collect()
}

/// Reconstruct a map attribute `name` from its `name.<field>` keys, skipping
/// the `name.%` counter. Values stay verbatim strings; this encoding never
/// carries anything else.
fn keyed_map(attributes: &BTreeMap<String, String>, name: &str) -> Map<String, Value> {
    let prefix = format!("{name}.");
    let counter = format!("{name}.%");
    let mut map = Map::new();
    for (key, value) in attributes {
        if !key.starts_with(&prefix) || key.as_str() == counter {
            continue;
        }
        map.insert(key[prefix.len()..].to_string(), Value::String(value.clone()));
    }
    map
}
