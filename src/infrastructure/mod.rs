pub mod ethereum_adapter;
pub mod explorer_verifier;
pub mod observability;
