//! A tool to execute and govern business metric definitions.
//!
//! # Overview
//!
//! `metric-engine` loads metric definitions written in YAML, TOML, or JSON, and executes them
//! deterministically. Every execution is gated by the caller's access tier, pinned to an explicit
//! time window, and computed by one of three strategies chosen by the definition's `formula`:
//!
//! - an arithmetic expression over named inputs, with derived variables and edge-case rules
//! - `MOVEMENT_CLASSIFICATION`, which labels an item by its average daily movement
//! - `ABC_CLASSIFICATION`, which ranks items by annual usage value into cumulative classes
//!
//! # Commands
//!
//! **Execute a request:**
//! ```bash
//! metric-engine execute --definitions metrics/ --request request.json
//! ```
//!
//! The request names the metric, the caller's tier, the time context, and the inputs:
//!
//! ```json
//! {
//!   "metric_id": "INVENTORY_TURNOVER",
//!   "requesting_user_tier": "TIER_2",
//!   "context": {
//!     "period_start": "2024-01-01",
//!     "period_end": "2024-03-31",
//!     "filters": { "warehouse": "WH1" }
//!   },
//!   "inputs": { "COGS": 1000, "InventoryBegin": 100, "InventoryEnd": 200 }
//! }
//! ```
//!
//! The result is printed as JSON. A failed execution prints its error kind
//! (`metric_not_found`, `unauthorized_tier`, `invalid_time_context`, `missing_inputs`, or
//! `internal`) to stderr and exits with status 1.
//!
//! **Validate a definition against governance rules:**
//! ```bash
//! metric-engine validate metrics/inventory_turnover.yml
//! metric-engine validate metrics/inventory_turnover.yml --schema metric_schema.yml
//! ```
//!
//! Validation checks required fields, tiers, time semantics, test and edge-case coverage, and
//! the audit trail, then runs the definition's `tests` through the engine. Numeric expectations
//! pass within a tolerance of 0.01.
//!
//! **Generate a governance schema to customize:**
//! ```bash
//! metric-engine init metric_schema.yml
//! ```
//!
//! # Logging
//!
//! Diagnostic output goes to stderr and is off by default. Use `--log-level` with `error`,
//! `warn`, `info`, `debug`, or `trace`; `RUST_LOG` overrides it when set.

use metric_engine::{Host, run};
use std::io::Write;
use std::io::{stderr, stdout};

/// Default host that talks to the real process.
#[derive(Debug, Clone, Default)]
pub struct RealHost;

impl Host for RealHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }

    fn exit(&mut self, code: i32) {
        std::process::exit(code);
    }
}

fn main() -> Result<(), ohno::AppError> {
    run(&mut RealHost, std::env::args())
}
