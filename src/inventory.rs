//! Inventory construction over the schema contract.
//!
//! The builder is a pure function from any [`StateSchema`] to the canonical
//! inventory document of the Ansible inventory-script protocol: group id →
//! `{hosts?, children?, vars}` plus the reserved `_meta.hostvars` bag.
//! Everything is keyed through `BTreeMap`, so identical state always
//! serializes to identical bytes.

use crate::state::{StateError, StateSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Reserved group holding every host; synthesized only when the state does
/// not define a group of this name itself.
pub const ALL_GROUP: &str = "all";

/// Reserved group holding hosts with no declared membership.
pub const UNGROUPED_GROUP: &str = "ungrouped";

/// One group's slice of the inventory document.
///
/// `hosts` and `children` are omitted from the serialized form when empty;
/// `vars` is always present, defaulting to an empty mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupEntry {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    #[serde(default)]
    pub vars: Map<String, Value>,
}

/// The reserved `_meta` entry; `hostvars` keys are exactly the host ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub hostvars: BTreeMap<String, Map<String, Value>>,
}

/// The assembled inventory document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(flatten)]
    pub groups: BTreeMap<String, GroupEntry>,
    #[serde(rename = "_meta")]
    pub meta: Meta,
}

impl Inventory {
    /// Serialize to the compact one-line form consumed by Ansible. Values
    /// pass through exactly as the adapter produced them.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Assemble the canonical inventory from a decoded state.
///
/// Deterministic and side-effect free; any resolution failure aborts the
/// whole build, no partial inventory is ever returned.
pub fn build_inventory<S: StateSchema + ?Sized>(state: &S) -> Result<Inventory, StateError> {
    let mut groups: BTreeMap<String, GroupEntry> = BTreeMap::new();
    let mut hostvars: BTreeMap<String, Map<String, Value>> = BTreeMap::new();

    // Explicitly defined groups first. Membership always lives on the host
    // side, so the reverse scan is the authoritative source here.
    for group in state.groups() {
        let entry = GroupEntry {
            hosts: state.hosts_of_group(&group),
            children: state.children_of(&group)?,
            vars: state.group_vars(&group)?,
        };
        groups.insert(group, entry);
    }

    // Walk the hosts to record hostvars, collect the ungrouped set, and
    // materialize implicit groups that exist only as host-side references.
    let hosts = state.hosts();
    let mut ungrouped: Vec<String> = Vec::new();

    for host in &hosts {
        hostvars.insert(host.clone(), state.host_vars(host)?);

        let memberships = state.groups_of_host(host)?;
        if memberships.is_empty() {
            ungrouped.push(host.clone());
        }

        for group in memberships {
            match groups.get_mut(&group) {
                Some(entry) => {
                    // The reverse scan already produced full membership for
                    // explicit groups; first seen wins on duplicates.
                    if !entry.hosts.iter().any(|member| member == host) {
                        entry.hosts.push(host.clone());
                    }
                }
                None => {
                    groups.insert(
                        group,
                        GroupEntry {
                            hosts: vec![host.clone()],
                            ..GroupEntry::default()
                        },
                    );
                }
            }
        }
    }

    if !ungrouped.is_empty() {
        groups.insert(
            UNGROUPED_GROUP.to_string(),
            GroupEntry {
                hosts: ungrouped,
                ..GroupEntry::default()
            },
        );
    }

    // An explicit "all" group is authoritative even when its membership does
    // not cover every host; only synthesize one when none was defined.
    if !groups.contains_key(ALL_GROUP) {
        groups.insert(
            ALL_GROUP.to_string(),
            GroupEntry {
                hosts: hosts.clone(),
                ..GroupEntry::default()
            },
        );
    }

    Ok(Inventory {
        groups,
        meta: Meta { hostvars },
    })
}
