//! Shared library for the tf-ansible-inventory helper.
//!
//! The crate exposes the pieces the CLI binary is assembled from: state
//! retrieval via the Terraform/Terragrunt CLI, decoding across the two state
//! schema generations behind one capability contract, the inventory
//! construction algorithm, and a JSON Schema check for the emitted document.
//! Public functions here form the contract the binary and the test suite
//! depend on.

pub mod inventory;
pub mod pull;
pub mod schema;
pub mod state;

pub use inventory::{GroupEntry, Inventory, Meta, build_inventory};
pub use pull::{StateCommand, pull_state};
pub use schema::{inventory_schema, validate_inventory_document};
pub use state::{State, StateError, StateSchema, decode_state};
