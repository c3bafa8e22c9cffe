//! AWS-facing side of the Config rules.
//!
//! This crate owns the runtime integration details (SDK adapters for the core
//! client traits, Config event parsing, evaluation reporting). The rule logic
//! itself lives in `config_rules_core` and never sees the SDK.

pub mod adapters;
pub mod handlers;
pub mod settings;
