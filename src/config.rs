//! Configuration loaded from the process environment.
//!
//! All settings come from environment variables (optionally via a `.env`
//! file), matching the variable names the CI workflows export. Pipeline-only
//! settings are optional here and checked by the pipeline that needs them.

use serde::Deserialize;

/// Tool configuration deserialized from environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Owner of the repository to query (e.g., "octocat").
    pub github_repo_owner: String,

    /// Name of the repository to query.
    pub github_repo_name: String,

    /// Optional GitHub Personal Access Token for API authentication.
    pub github_token: Option<String>,

    /// Comma-separated pull request numbers to fetch explicitly.
    /// When absent, the lead-time pipeline scans all merged PRs.
    pub pr_numbers: Option<String>,

    /// Comma-separated workflow run IDs to fetch explicitly.
    /// When absent, the deployment pipeline scans runs of the deploy workflow.
    pub run_ids: Option<String>,

    /// CI event that triggered this invocation. `workflow_run` selects the
    /// single triggering run named by `workflow_run_id`.
    pub event_name: Option<String>,

    /// ID of the run that triggered a `workflow_run` event.
    pub workflow_run_id: Option<u64>,

    /// Workflow file whose successful runs count as deployments.
    #[serde(default = "default_deploy_workflow_file")]
    pub deploy_workflow_file: String,

    /// Form endpoint for pull request lead-time records.
    pub lead_time_url: Option<String>,

    /// Form endpoint for deployment-frequency records.
    pub deployment_frequency_url: Option<String>,

    /// Hard limit on the number of paginated API requests per scan.
    #[serde(default = "default_max_api_pages")]
    pub max_api_pages: u32,
}

fn default_deploy_workflow_file() -> String {
    "hadolint.yml".to_string()
}

fn default_max_api_pages() -> u32 {
    100
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}
