pub mod application;
pub mod artifacts;
pub mod config;
pub mod contracts;
pub mod domain;
pub mod gas_report;
pub mod harness;
pub mod infrastructure;
pub mod startup;
#[cfg(test)]
pub mod test_utils;
