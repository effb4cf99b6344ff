//! Flat records submitted to the collection forms, and the transforms that
//! build them from raw API nodes.

use anyhow::{bail, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::github::{PullRequestNode, WorkflowRun};
use crate::submit::FormRecord;
use crate::util::{min_date, to_jst_string};

/// One merged pull request, flattened for the lead-time form.
#[derive(Debug, Clone)]
pub struct PullRequestRecord {
    pub number: u64,
    pub created_at: DateTime<Utc>,
    pub merged_at: DateTime<Utc>,
    pub first_commit_at: DateTime<Utc>,
    pub first_commit_authored_at: DateTime<Utc>,
    pub repository: String,
    pub author: String,
    pub base: String,
    pub head: String,
    pub jst_merged_at: String,
    pub jst_first_created: String,
}

/// One workflow run, flattened for the deployment-frequency form.
#[derive(Debug, Clone)]
pub struct WorkflowRunRecord {
    pub number: u64,
    pub run_id: u64,
    pub released_at: DateTime<Utc>,
    pub repository: String,
    pub author: String,
    pub jst_released_at: String,
}

/// Builds lead-time records from raw pull request nodes.
///
/// Nodes that cannot produce a complete record are dropped; an empty result
/// set is fatal.
pub fn lead_time_records(prs: Vec<PullRequestNode>) -> Result<Vec<PullRequestRecord>> {
    let mut records: Vec<_> = prs.into_iter().filter_map(pull_request_record).collect();
    records.sort_by_key(|record| record.number);

    if records.is_empty() {
        bail!("no merged pull requests found");
    }
    tracing::info!(count = records.len(), "built lead-time records");
    Ok(records)
}

fn pull_request_record(pr: PullRequestNode) -> Option<PullRequestRecord> {
    // A missing author usually means the PR was closed without merging.
    let author = pr.author?;
    // Some PRs carry no commits at all.
    let first_commit = &pr.commits.nodes.first()?.commit;

    let created_at = pr.created_at?;
    let merged_at = pr.merged_at?;
    let first_commit_at = first_commit.committed_date?;
    let first_commit_authored_at = first_commit.authored_date?;

    // Lead time starts at the earliest recorded activity: PR creation or the
    // first commit's committed/authored dates. The author date is assumed not
    // to be rewritten after the fact.
    let first_created = min_date(&[
        Some(created_at),
        Some(first_commit_at),
        Some(first_commit_authored_at),
    ])?;

    Some(PullRequestRecord {
        number: pr.number,
        created_at,
        merged_at,
        first_commit_at,
        first_commit_authored_at,
        repository: pr.repository.name_with_owner,
        author: author.login,
        base: pr.base_ref_name,
        head: pr.head_ref_name,
        jst_merged_at: to_jst_string(Some(merged_at))?,
        jst_first_created: to_jst_string(Some(first_created))?,
    })
}

/// Builds deployment-frequency records from raw workflow runs.
pub fn deployment_records(runs: Vec<WorkflowRun>) -> Result<Vec<WorkflowRunRecord>> {
    let mut records: Vec<_> = runs
        .into_iter()
        .map(|run| WorkflowRunRecord {
            number: run.run_number,
            run_id: run.id,
            released_at: run.updated_at,
            repository: run.repository.name,
            author: run.triggering_actor.login,
            jst_released_at: to_jst_string(Some(run.updated_at))
                .unwrap_or_default(),
        })
        .collect();
    records.sort_by_key(|record| record.number);

    if records.is_empty() {
        bail!("no workflow runs found");
    }
    tracing::info!(count = records.len(), "built deployment records");
    Ok(records)
}

fn rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl FormRecord for PullRequestRecord {
    fn id(&self) -> u64 {
        self.number
    }

    fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("entry.1737429438", self.number.to_string()),
            ("entry.696990060", rfc3339(self.created_at)),
            ("entry.883568870", rfc3339(self.merged_at)),
            ("entry.1542610687", rfc3339(self.first_commit_at)),
            ("entry.400445109", rfc3339(self.first_commit_authored_at)),
            ("entry.1770012755", self.repository.clone()),
            ("entry.1888619409", self.author.clone()),
            ("entry.864339788", self.base.clone()),
            ("entry.1775356616", self.head.clone()),
            ("entry.1457774321", self.jst_merged_at.clone()),
            ("entry.1401680068", self.jst_first_created.clone()),
        ]
    }
}

impl FormRecord for WorkflowRunRecord {
    fn id(&self) -> u64 {
        self.run_id
    }

    fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("entry.1465423696", self.number.to_string()),
            ("entry.1787920898", self.run_id.to_string()),
            ("entry.1253201792", rfc3339(self.released_at)),
            ("entry.151897309", self.repository.clone()),
            ("entry.1926035146", self.author.clone()),
            ("entry.1447505964", self.jst_released_at.clone()),
        ]
    }
}
