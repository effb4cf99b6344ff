//! Fetch -> transform -> submit orchestration for the two pipelines.
//!
//! These functions separate pipeline logic from the CLI layer: clients are
//! constructed by the caller and passed in.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::github::GitHubClient;
use crate::records;
use crate::submit::FormClient;
use crate::util::parse_id_list;

const WORKFLOW_RUN_EVENT: &str = "workflow_run";

/// Collects merged pull requests and posts one lead-time record per PR.
pub async fn run_lead_time(
    config: &Config,
    github: &GitHubClient,
    form: &FormClient,
) -> Result<()> {
    let url = config
        .lead_time_url
        .as_deref()
        .context("LEAD_TIME_URL is not set")?;
    let owner = &config.github_repo_owner;
    let repo = &config.github_repo_name;

    let prs = match config.pr_numbers.as_deref() {
        Some(input) => {
            let numbers = parse_id_list(input)?;
            tracing::info!(?numbers, "fetching pull requests by number");
            github
                .merged_pull_requests_by_number(owner, repo, &numbers)
                .await?
        }
        None => {
            tracing::info!("scanning all merged pull requests");
            github
                .scan_merged_pull_requests(owner, repo, config.max_api_pages)
                .await?
        }
    };

    let records = records::lead_time_records(prs)?;
    form.submit_all(url, &records).await
}

/// Collects workflow runs and posts one deployment record per run.
///
/// Run selection: explicit `RUN_IDS` first; otherwise, on a `workflow_run`
/// event, the single triggering run; otherwise a scan of the deploy workflow's
/// successful runs.
pub async fn run_deployment_frequency(
    config: &Config,
    github: &GitHubClient,
    form: &FormClient,
) -> Result<()> {
    let url = config
        .deployment_frequency_url
        .as_deref()
        .context("DEPLOYMENT_FREQUENCY_URL is not set")?;
    let owner = &config.github_repo_owner;
    let repo = &config.github_repo_name;

    let runs = if let Some(input) = config.run_ids.as_deref() {
        let run_ids = parse_id_list(input)?;
        tracing::info!(?run_ids, "fetching workflow runs by ID");
        github.workflow_runs_by_id(owner, repo, &run_ids).await?
    } else if config.event_name.as_deref() == Some(WORKFLOW_RUN_EVENT) {
        let run_id = config
            .workflow_run_id
            .context("WORKFLOW_RUN_ID is not set for a workflow_run event")?;
        tracing::info!(run_id, "fetching triggering workflow run");
        vec![github.workflow_run(owner, repo, run_id).await?]
    } else {
        tracing::info!(
            workflow = %config.deploy_workflow_file,
            "scanning successful workflow runs"
        );
        github
            .scan_workflow_runs(
                owner,
                repo,
                &config.deploy_workflow_file,
                config.max_api_pages,
            )
            .await?
    };

    let records = records::deployment_records(runs)?;
    form.submit_all(url, &records).await
}
