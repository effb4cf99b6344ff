//! Sequential submission of records to a form-collection endpoint.

use anyhow::{bail, Result};

/// A record that can be serialized into named form entries.
pub trait FormRecord {
    /// Source identifier, used in logs.
    fn id(&self) -> u64;

    /// Named form entries for one submission.
    fn entries(&self) -> Vec<(&'static str, String)>;
}

pub struct FormClient {
    http: reqwest::Client,
}

impl FormClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Posts every record to `url`, one `application/x-www-form-urlencoded`
    /// request per record.
    ///
    /// A failed submission does not stop the loop; after all records are
    /// attempted, any failure raises a single aggregate error.
    pub async fn submit_all<R: FormRecord>(&self, url: &str, records: &[R]) -> Result<()> {
        let mut error_occurred = false;

        for record in records {
            let entries = record.entries();
            match self.http.post(url).form(&entries).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::info!(id = record.id(), "submitted record");
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    tracing::error!(
                        id = record.id(),
                        %status,
                        body = %body,
                        "failed to post record"
                    );
                    error_occurred = true;
                }
                Err(e) => {
                    tracing::error!(id = record.id(), error = %e, "failed to post record");
                    error_occurred = true;
                }
            }
        }

        if error_occurred {
            bail!("one or more records failed to submit");
        }
        Ok(())
    }
}

impl Default for FormClient {
    fn default() -> Self {
        Self::new()
    }
}
