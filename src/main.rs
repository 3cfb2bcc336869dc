use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use ethers::types::Address;
use fortune_harness::{
    application::{
        context::TaskContext, deploy_seeker::deploy_fortune_seeker,
        deploy_teller::deploy_fortune_teller,
    },
    infrastructure::observability,
    startup,
};
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(about = "Deploys FortuneTeller and FortuneSeeker")]
struct Args {
    /// YAML network configuration; built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Network to deploy to (hardhat, localhost, fuji, ...)
    #[arg(long, global = true)]
    network: Option<String>,

    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand, Debug)]
enum Task {
    /// deploys FortuneTeller.sol
    DeployTeller,
    /// deploys FortuneSeeker.sol
    DeploySeeker {
        /// Fortune Teller's Contract Address
        #[arg(long)]
        fortuneteller: Address,
    },
}

async fn run_task(ctx: &TaskContext, task: &Task) -> Result<()> {
    match task {
        Task::DeployTeller => {
            let deployment = deploy_fortune_teller(ctx).await?;
            info!(
                teller = ?deployment.teller,
                subscription_id = deployment.oracle.subscription_id,
                verified = deployment.verified,
                "deploy-teller finished"
            );
        }
        Task::DeploySeeker { fortuneteller } => {
            let deployment = deploy_fortune_seeker(ctx, *fortuneteller).await?;
            info!(
                seeker = ?deployment.seeker,
                verified = deployment.verified,
                "deploy-seeker finished"
            );
        }
    }
    ctx.finish()
}

async fn run(args: &Args) -> Result<()> {
    let ctx = startup::build(args.config.as_deref(), args.network.as_deref()).await?;
    run_task(&ctx, &args.task).await
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    observability::init_tracing();

    let args = Args::parse();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
