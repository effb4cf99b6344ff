use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gh_metrics::config::Config;
use gh_metrics::github::GitHubClient;
use gh_metrics::pipeline;
use gh_metrics::submit::FormClient;

/// Collects GitHub activity and submits metrics records to collection forms.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Post a lead-time record for each merged pull request
    LeadTime,
    /// Post a deployment record for each workflow run
    DeploymentFrequency,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    // Initialize tracing (logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gh_metrics=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(cli).await {
        tracing::error!("Error during execution: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing::info!(
        owner = %config.github_repo_owner,
        repo = %config.github_repo_name,
        "starting"
    );

    let github = GitHubClient::new(config.github_token.clone())?;
    let form = FormClient::new();

    match cli.command {
        Command::LeadTime => pipeline::run_lead_time(&config, &github, &form).await,
        Command::DeploymentFrequency => {
            pipeline::run_deployment_frequency(&config, &github, &form).await
        }
    }
}
