//! Authenticated GitHub API client.
//!
//! Pull request data comes from the GraphQL API (merge state and first-commit
//! dates are not available together through the REST listing), workflow runs
//! from the Actions REST API. Response models are declared by hand with the
//! fields the pipelines consume.

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};

const PAGE_SIZE: u32 = 100;

const PULL_REQUEST_QUERY: &str = r#"
    query ($owner: String!, $repo: String!, $number: Int!) {
        repository(owner: $owner, name: $repo) {
            pullRequest(number: $number) {
                number
                createdAt
                mergedAt
                baseRefName
                headRefName
                author {
                    login
                }
                repository {
                    nameWithOwner
                }
                commits(first: 1) {
                    nodes {
                        commit {
                            authoredDate
                            committedDate
                        }
                    }
                }
            }
        }
    }
"#;

const MERGED_PULL_REQUESTS_QUERY: &str = r#"
    query ($owner: String!, $repo: String!, $cursor: String) {
        repository(owner: $owner, name: $repo) {
            pullRequests(states: MERGED, first: 100, after: $cursor) {
                edges {
                    node {
                        number
                        createdAt
                        mergedAt
                        baseRefName
                        headRefName
                        author {
                            login
                        }
                        repository {
                            nameWithOwner
                        }
                        commits(first: 1) {
                            nodes {
                                commit {
                                    authoredDate
                                    committedDate
                                }
                            }
                        }
                    }
                }
                pageInfo {
                    endCursor
                    hasNextPage
                }
            }
        }
    }
"#;

/// A pull request node as returned by the GraphQL queries above.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestNode {
    pub number: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub base_ref_name: String,
    pub head_ref_name: String,
    pub author: Option<Actor>,
    pub repository: RepositoryRef,
    pub commits: CommitConnection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRef {
    pub name_with_owner: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitConnection {
    pub nodes: Vec<CommitNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitNode {
    pub commit: CommitInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    pub authored_date: Option<DateTime<Utc>>,
    pub committed_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct PullRequestResponse {
    data: PullRequestData,
}

#[derive(Debug, Deserialize)]
struct PullRequestData {
    repository: PullRequestRepository,
}

#[derive(Debug, Deserialize)]
struct PullRequestRepository {
    #[serde(rename = "pullRequest")]
    pull_request: Option<PullRequestNode>,
}

#[derive(Debug, Deserialize)]
struct MergedPullRequestsResponse {
    data: MergedPullRequestsData,
}

#[derive(Debug, Deserialize)]
struct MergedPullRequestsData {
    repository: MergedPullRequestsRepository,
}

#[derive(Debug, Deserialize)]
struct MergedPullRequestsRepository {
    #[serde(rename = "pullRequests")]
    pull_requests: PullRequestConnection,
}

#[derive(Debug, Deserialize)]
struct PullRequestConnection {
    edges: Vec<PullRequestEdge>,
    #[serde(rename = "pageInfo")]
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct PullRequestEdge {
    node: PullRequestNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

/// A workflow run as returned by the Actions REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub run_number: u64,
    pub updated_at: DateTime<Utc>,
    pub repository: RepositorySummary,
    pub triggering_actor: Actor,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositorySummary {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct WorkflowRunsPage {
    workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Serialize)]
struct ListRunsParams {
    status: &'static str,
    per_page: u32,
    page: u32,
}

pub struct GitHubClient {
    octocrab: Octocrab,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Result<Self> {
        let mut builder = Octocrab::builder();
        if let Some(token) = token {
            builder = builder.personal_token(token);
        }

        Ok(Self {
            octocrab: builder.build()?,
        })
    }

    /// Looks up a single pull request by number. `None` when it doesn't exist.
    pub async fn pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Option<PullRequestNode>> {
        let response: PullRequestResponse = self
            .octocrab
            .graphql(&serde_json::json!({
                "query": PULL_REQUEST_QUERY,
                "variables": {
                    "owner": owner,
                    "repo": repo,
                    "number": number
                }
            }))
            .await?;

        Ok(response.data.repository.pull_request)
    }

    /// Fetches the given pull requests one by one, keeping only merged ones.
    ///
    /// The by-number query cannot filter on merge state, so it is re-checked
    /// per result here.
    pub async fn merged_pull_requests_by_number(
        &self,
        owner: &str,
        repo: &str,
        numbers: &[u64],
    ) -> Result<Vec<PullRequestNode>> {
        let mut prs = Vec::new();
        for &number in numbers {
            match self.pull_request(owner, repo, number).await? {
                Some(pr) if pr.merged_at.is_some() => prs.push(pr),
                Some(_) => {
                    tracing::debug!(number, "skipping unmerged pull request");
                }
                None => {
                    tracing::debug!(number, "pull request not found");
                }
            }
        }
        Ok(prs)
    }

    /// Scans every merged pull request in the repository, following the
    /// connection cursor until the last page or the page cap.
    pub async fn scan_merged_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        max_pages: u32,
    ) -> Result<Vec<PullRequestNode>> {
        let mut prs = Vec::new();
        let mut cursor: Option<String> = None;
        let mut hit_page_limit = true;

        for page in 1..=max_pages {
            let response: MergedPullRequestsResponse = self
                .octocrab
                .graphql(&serde_json::json!({
                    "query": MERGED_PULL_REQUESTS_QUERY,
                    "variables": {
                        "owner": owner,
                        "repo": repo,
                        "cursor": cursor
                    }
                }))
                .await?;

            let connection = response.data.repository.pull_requests;
            tracing::debug!(page, count = connection.edges.len(), "fetched PR page");
            prs.extend(connection.edges.into_iter().map(|edge| edge.node));

            if !connection.page_info.has_next_page {
                hit_page_limit = false;
                break;
            }
            cursor = connection.page_info.end_cursor;
        }

        if hit_page_limit {
            tracing::warn!(
                "Hit max_api_pages ({}) for {}/{} before the last PR page. Data may be incomplete.",
                max_pages,
                owner,
                repo
            );
        }

        Ok(prs)
    }

    /// Looks up a single workflow run by ID.
    pub async fn workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<WorkflowRun> {
        let run = self
            .octocrab
            .get(
                format!("/repos/{owner}/{repo}/actions/runs/{run_id}"),
                None::<&()>,
            )
            .await?;
        Ok(run)
    }

    /// Fetches the given workflow runs concurrently.
    ///
    /// Runs cannot be fetched by ID in bulk, so one request is issued per ID;
    /// results come back in the order the IDs were given.
    pub async fn workflow_runs_by_id(
        &self,
        owner: &str,
        repo: &str,
        run_ids: &[u64],
    ) -> Result<Vec<WorkflowRun>> {
        try_join_all(
            run_ids
                .iter()
                .map(|&run_id| self.workflow_run(owner, repo, run_id)),
        )
        .await
    }

    /// Scans the successful runs of one workflow, page by page until an empty
    /// page or the page cap.
    pub async fn scan_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        workflow_file: &str,
        max_pages: u32,
    ) -> Result<Vec<WorkflowRun>> {
        let mut runs = Vec::new();
        let mut hit_page_limit = true;

        for page in 1..=max_pages {
            let response: WorkflowRunsPage = self
                .octocrab
                .get(
                    format!("/repos/{owner}/{repo}/actions/workflows/{workflow_file}/runs"),
                    Some(&ListRunsParams {
                        status: "success",
                        per_page: PAGE_SIZE,
                        page,
                    }),
                )
                .await?;

            if response.workflow_runs.is_empty() {
                hit_page_limit = false;
                break;
            }

            tracing::debug!(page, count = response.workflow_runs.len(), "fetched run page");
            runs.extend(response.workflow_runs);
        }

        if hit_page_limit {
            tracing::warn!(
                "Hit max_api_pages ({}) for workflow {} before an empty page. Data may be incomplete.",
                max_pages,
                workflow_file
            );
        }

        Ok(runs)
    }
}
