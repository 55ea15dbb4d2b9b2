//! Command-line interface for metric-engine
//!
//! Three commands sit on top of the library:
//!
//! - **validate**: load a raw definition document, check it against a governance schema, run its
//!   embedded test cases through the engine, and print a PASS/FAIL report
//! - **execute**: build a registry from definition files and run one execution request,
//!   printing the result as JSON
//! - **init**: write the built-in governance schema to a file for customization
//!
//! All output goes through a [`Host`] so commands can be exercised in tests without touching the
//! real stdout, stderr, or process exit.

mod common;
mod execute;
mod host;
mod init;
mod run;
mod validate;

pub use common::{LogLevel, init_logging};
pub use execute::{ExecuteArgs, execute_metric};
pub use host::Host;
pub use init::{InitArgs, init_schema};
pub use run::run;
pub use validate::{ValidateArgs, validate_metric};
