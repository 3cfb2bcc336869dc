pub mod context;
pub mod deploy_seeker;
pub mod deploy_teller;
pub mod deployer;
pub mod ports;
