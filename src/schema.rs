//! JSON Schema check for the emitted inventory document.
//!
//! The schema in `schema/inventory_document.json` is the written-down form of
//! the inventory-script contract: every group entry carries `vars`, `hosts`
//! and `children` appear only as non-empty unique string arrays, and
//! `_meta.hostvars` maps host ids to objects. The test suite runs every built
//! inventory through it so contract drift surfaces as a schema violation
//! rather than a downstream Ansible failure.

use anyhow::{Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;

const INVENTORY_SCHEMA: &str = include_str!("../schema/inventory_document.json");

/// Compile the shipped inventory document schema.
pub fn inventory_schema() -> Result<JSONSchema> {
    let raw: Value = serde_json::from_str(INVENTORY_SCHEMA)
        .map_err(|err| anyhow!("inventory schema is not valid JSON: {err}"))?;
    JSONSchema::compile(&raw).map_err(|err| anyhow!("inventory schema failed to compile: {err}"))
}

/// Validate a built inventory document, aggregating every violation into one
/// error message.
pub fn validate_inventory_document(document: &Value) -> Result<()> {
    let compiled = inventory_schema()?;
    let failures: Vec<String> = match compiled.validate(document) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|error| format!("{}: {error}", error.instance_path))
            .collect(),
    };

    if failures.is_empty() {
        Ok(())
    } else {
        bail!(
            "inventory document violates the schema: {}",
            failures.join("; ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shipped_schema_compiles() {
        inventory_schema().expect("schema compiles");
    }

    #[test]
    fn minimal_document_passes() {
        let document = json!({
            "all": {"hosts": ["host_1"], "vars": {}},
            "_meta": {"hostvars": {"host_1": {}}}
        });
        validate_inventory_document(&document).expect("minimal document is valid");
    }

    #[test]
    fn group_entry_without_vars_fails() {
        let document = json!({
            "all": {"hosts": ["host_1"]},
            "_meta": {"hostvars": {}}
        });
        let err = validate_inventory_document(&document).expect_err("vars is required");
        assert!(err.to_string().contains("violates the schema"));
    }

    #[test]
    fn empty_hosts_sequence_fails() {
        // The builder omits empty sequences entirely; an empty array in the
        // output would mean that rule regressed.
        let document = json!({
            "all": {"hosts": [], "vars": {}},
            "_meta": {"hostvars": {}}
        });
        validate_inventory_document(&document).expect_err("empty hosts array is invalid");
    }

    #[test]
    fn missing_meta_fails() {
        let document = json!({"all": {"vars": {}}});
        validate_inventory_document(&document).expect_err("_meta is required");
    }
}
