//! Loading metric definitions and governance rules from disk
//!
//! Definition files and governance schemas may be TOML, YAML, or JSON; the format is chosen by
//! file extension. The engine itself never touches the file system, so everything in this
//! module runs once, before a registry is built.

mod definitions;
mod schema;

pub use definitions::{load_definitions, load_document};
pub use schema::{DEFAULT_SCHEMA_YAML, DivisionRule, EdgeCaseRules, GovernanceSchema, TestRules, TimeSemanticsRules};
