//! Pure evaluation engine for periodic AWS Config rules.
//!
//! This crate owns pagination, configuration filtering, the all-of compliance
//! reduction and the two rule evaluators. It intentionally excludes AWS SDK and
//! Lambda runtime concerns: every remote call goes through the traits in
//! [`clients`], which `config_rules_lambda` implements on top of the SDK.

pub mod clients;
pub mod contract;
pub mod evaluation;
pub mod filter;
pub mod logging;
pub mod pagination;
pub mod parameters;
pub mod reduction;
pub mod rules;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;
