//! High-level Cribl Search operations

use std::time::{Duration, Instant};

use compact_str::CompactString;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use super::{
    api::SearchApi,
    auth::TokenManager,
    config::{QueryOptions, SearchConfig},
    error::{ClientError, Result},
};
use crate::{
    domain::{JobStatus, Record, ResultTable},
    id::JobId,
};

/// Client for Cribl Search
///
/// Authenticates against Cribl.Cloud with OAuth2 client credentials, submits
/// search jobs, polls them to completion, and collects NDJSON results into a
/// [`ResultTable`]. One HTTP request is in flight at a time; nothing is
/// retried automatically.
#[derive(Debug)]
pub struct CriblSearch {
    api: SearchApi,
    tokens: TokenManager,
}

impl CriblSearch {
    /// Create a client from a validated configuration
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.request.timeout)
            .build()
            .map_err(|e| {
                ClientError::configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        let tokens = TokenManager::new(client.clone(), config.clone());
        let api = SearchApi::new(client, config);
        Ok(Self { api, tokens })
    }

    /// Resolve credentials from the environment and create a client
    pub fn from_env() -> Result<Self> {
        Self::new(SearchConfig::from_env()?)
    }

    /// Organization the client is bound to
    pub fn org_id(&self) -> &str {
        self.api.config().org_id.as_str()
    }

    /// Workspace the client is bound to
    pub fn workspace(&self) -> &str {
        self.api.config().workspace.as_str()
    }

    /// Run a query over the default one-hour window
    pub async fn query(&self, query: &str) -> Result<ResultTable> {
        self.query_with(query, QueryOptions::default()).await
    }

    /// Run a query: submit, poll to completion, fetch every result page
    #[instrument(
        skip(self, options),
        fields(earliest = %options.earliest, latest = %options.latest)
    )]
    pub async fn query_with(&self, query: &str, options: QueryOptions) -> Result<ResultTable> {
        let timeout = options
            .timeout
            .unwrap_or(self.api.config().request.query_timeout);

        info!("Submitting search query");
        let token = self.tokens.bearer_token().await?;
        let job_id = self
            .api
            .submit_job(&token, query, &options.earliest, &options.latest)
            .await?;

        self.wait_for_job(&job_id, timeout).await?;

        match self.fetch_results(&job_id).await {
            Ok(table) => {
                debug!(job_id = %job_id, rows = table.row_count(), "Query completed");
                Ok(table)
            },
            Err(e) => {
                error!(error = %e, job_id = %job_id, "Failed to collect query results");
                Err(e)
            },
        }
    }

    /// Verify credentials by forcing a fresh token exchange
    ///
    /// Authentication failures propagate unchanged; anything else is wrapped
    /// as one, since reaching the token endpoint is what is being tested.
    #[instrument(skip(self))]
    pub async fn test_connection(&self) -> Result<bool> {
        self.tokens.invalidate().await;

        match self.tokens.bearer_token().await {
            Ok(_) => {
                info!("Connection test succeeded");
                Ok(true)
            },
            Err(e @ ClientError::Authentication { .. }) => {
                error!(error = %e, "Connection test rejected credentials");
                Err(e)
            },
            Err(e) => {
                error!(error = %e, "Connection test failed");
                Err(ClientError::authentication(format!("Connection test failed: {e}")))
            },
        }
    }

    /// List the datasets available to this workspace
    #[instrument(skip(self))]
    pub async fn list_datasets(&self) -> Result<Vec<CompactString>> {
        let token = self.tokens.bearer_token().await?;

        match self.api.datasets(&token).await {
            Ok(datasets) => {
                debug!(dataset_count = datasets.len(), "Listed datasets");
                Ok(datasets.iter().map(|dataset| dataset.query_name()).collect())
            },
            Err(e) => {
                error!(error = %e, "Failed to list datasets");
                Err(e)
            },
        }
    }

    /// Poll job status until completion, a failure verdict, or the deadline
    ///
    /// The deadline is wall clock, checked before each status fetch, so a
    /// zero timeout fails without ever asking the server.
    #[instrument(skip(self), fields(job_id = %job_id, timeout_secs = timeout.as_secs()))]
    async fn wait_for_job(&self, job_id: &JobId, timeout: Duration) -> Result<()> {
        let poll_interval = self.api.config().request.poll_interval;
        let started = Instant::now();
        let token = self.tokens.bearer_token().await?;

        loop {
            if started.elapsed() > timeout {
                warn!(job_id = %job_id, "Search job exceeded its deadline");
                return Err(ClientError::timeout(timeout));
            }

            let status = self.api.job_status(&token, job_id).await?;
            match status.status {
                JobStatus::Completed => {
                    debug!(job_id = %job_id, "Search job completed");
                    return Ok(());
                },
                JobStatus::Failed => {
                    let message = status.error.unwrap_or_else(|| "Unknown error".into());
                    error!(job_id = %job_id, error = %message, "Search job failed");
                    return Err(ClientError::query_for_job(
                        format!("Query failed: {message}"),
                        job_id.clone(),
                    ));
                },
                JobStatus::Canceled => {
                    warn!(job_id = %job_id, "Search job was canceled");
                    return Err(ClientError::query_for_job(
                        "Query was canceled",
                        job_id.clone(),
                    ));
                },
                in_progress => {
                    debug!(job_id = %job_id, status = ?in_progress, "Search job in progress");
                    sleep(poll_interval).await;
                },
            }
        }
    }

    /// Page through every result and assemble the table
    ///
    /// Offsets step by the page size; fetching stops once the offset reaches
    /// the server's running `totalEventCount`. Nothing partial is returned:
    /// any page failure drops the records collected so far.
    #[instrument(skip(self), fields(job_id = %job_id))]
    async fn fetch_results(&self, job_id: &JobId) -> Result<ResultTable> {
        let page_size = self.api.config().request.page_size;
        let token = self.tokens.bearer_token().await?;

        let mut records: Vec<Record> = Vec::new();
        let mut offset: u64 = 0;
        let total_count;

        loop {
            let page = self
                .api
                .results_page(&token, job_id, page_size, offset)
                .await?;
            records.extend(page.records);

            offset += u64::from(page_size);
            if offset >= page.metadata.total_event_count {
                total_count = page.metadata.total_event_count;
                break;
            }
        }

        debug!(
            job_id = %job_id,
            record_count = records.len(),
            total_count,
            "Collected all result pages"
        );
        Ok(ResultTable::from_records(records, total_count))
    }
}
