//! portfoli-rebalancer: how much cash a brokerage export needs to reach a
//! target allocation without selling.
//!
//! Reads a Fidelity positions CSV, merges it into a named policy, runs the
//! cash-only rebalance from `portfoli`, and renders the result as text or JSON.

pub mod config;
pub mod error;
pub mod import;
pub mod report;
pub mod run;
pub mod source;
