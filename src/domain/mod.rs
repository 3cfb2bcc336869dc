pub mod deployment;
pub mod errors;
