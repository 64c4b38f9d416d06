//! State decoding and the schema capability contract.
//!
//! Terraform has shipped two structurally incompatible state encodings: the
//! flattened dotted-key attribute form written up to 0.11 and the natively
//! typed form written from 0.12 on. Both are hidden behind [`StateSchema`];
//! the adapter is picked exactly once per run by sniffing the top-level
//! `version` field of the generically decoded payload, and the inventory
//! builder never learns which one it holds.

use serde_json::{Map, Value};
use std::fmt;

pub mod legacy;
pub mod modern;

pub use legacy::LegacyState;
pub use modern::ModernState;

/// Resource type carrying group definitions in either encoding.
pub const GROUP_RESOURCE: &str = "ansible_group";
/// Resource type carrying host definitions in either encoding.
pub const HOST_RESOURCE: &str = "ansible_host";

// State version 3 is the last of the flattened-attribute generation; every
// other value (or a missing field) decodes as the modern form.
const LEGACY_STATE_VERSION: f64 = 3.0;

// Remote-state backends wrap pulled payloads with this sigil.
const REMOTE_STATE_SIGIL: &[u8] = b"o:";

/// Errors surfaced while decoding state or resolving resources in it.
#[derive(Debug)]
pub enum StateError {
    GroupNotFound(String),
    HostNotFound(String),
    Decode(serde_json::Error),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::GroupNotFound(group) => write!(f, "unable to find group {group}"),
            StateError::HostNotFound(host) => write!(f, "unable to find host {host}"),
            StateError::Decode(err) => write!(f, "error unmarshaling state: {err}"),
        }
    }
}

impl std::error::Error for StateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StateError::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Decode(err)
    }
}

/// Capability contract shared by both state encodings.
///
/// Id-listing operations return ascending, duplicate-free sequences.
/// Membership is only ever declared on the host side (`groups_of_host`);
/// `hosts_of_group` is always the reverse scan over every host, never a
/// forward pointer stored on the group.
pub trait StateSchema {
    /// All group ids found in group-typed resources, ascending.
    fn groups(&self) -> Vec<String>;

    /// All host ids found in host-typed resources, ascending.
    fn hosts(&self) -> Vec<String>;

    /// Child group ids declared on a group, ascending. Fails when the group
    /// itself is absent.
    fn children_of(&self, group: &str) -> Result<Vec<String>, StateError>;

    /// Host ids declaring membership in `group`, ascending. A group with no
    /// members (or no resource of its own) yields an empty sequence.
    fn hosts_of_group(&self, group: &str) -> Vec<String>;

    /// Group ids a host declares membership in, in declared order. Fails when
    /// the host itself is absent.
    fn groups_of_host(&self, host: &str) -> Result<Vec<String>, StateError>;

    /// Variables declared on a group; empty mapping when none.
    fn group_vars(&self, group: &str) -> Result<Map<String, Value>, StateError>;

    /// Variables declared on a host; empty mapping when none.
    fn host_vars(&self, host: &str) -> Result<Map<String, Value>, StateError>;
}

/// A decoded state payload with its schema adapter chosen.
#[derive(Debug, Clone)]
pub enum State {
    Legacy(LegacyState),
    Modern(ModernState),
}

impl StateSchema for State {
    fn groups(&self) -> Vec<String> {
        match self {
            State::Legacy(state) => state.groups(),
            State::Modern(state) => state.groups(),
        }
    }

    fn hosts(&self) -> Vec<String> {
        match self {
            State::Legacy(state) => state.hosts(),
            State::Modern(state) => state.hosts(),
        }
    }

    fn children_of(&self, group: &str) -> Result<Vec<String>, StateError> {
        match self {
            State::Legacy(state) => state.children_of(group),
            State::Modern(state) => state.children_of(group),
        }
    }

    fn hosts_of_group(&self, group: &str) -> Vec<String> {
        match self {
            State::Legacy(state) => state.hosts_of_group(group),
            State::Modern(state) => state.hosts_of_group(group),
        }
    }

    fn groups_of_host(&self, host: &str) -> Result<Vec<String>, StateError> {
        match self {
            State::Legacy(state) => state.groups_of_host(host),
            State::Modern(state) => state.groups_of_host(host),
        }
    }

    fn group_vars(&self, group: &str) -> Result<Map<String, Value>, StateError> {
        match self {
            State::Legacy(state) => state.group_vars(group),
            State::Modern(state) => state.group_vars(group),
        }
    }

    fn host_vars(&self, host: &str) -> Result<Map<String, Value>, StateError> {
        match self {
            State::Legacy(state) => state.host_vars(host),
            State::Modern(state) => state.host_vars(host),
        }
    }
}

/// Decode captured state bytes and pick the schema adapter.
///
/// An entirely empty capture is the distinguished "no state" outcome and maps
/// to `Ok(None)`. The `o:` remote-state sigil is stripped before decoding
/// when present. The whole payload is decoded generically once to sniff the
/// version, then deserialized into the selected typed representation.
pub fn decode_state(bytes: &[u8]) -> Result<Option<State>, StateError> {
    if bytes.is_empty() {
        return Ok(None);
    }

    let payload = bytes.strip_prefix(REMOTE_STATE_SIGIL).unwrap_or(bytes);
    let generic: Value = serde_json::from_slice(payload)?;

    let state = if is_legacy_version(&generic) {
        State::Legacy(serde_json::from_value(generic)?)
    } else {
        State::Modern(serde_json::from_value(generic)?)
    };

    Ok(Some(state))
}

fn is_legacy_version(value: &Value) -> bool {
    value.get("version").and_then(Value::as_f64) == Some(LEGACY_STATE_VERSION)
}
