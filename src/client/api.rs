//! HTTP layer for the Cribl Search API

use compact_str::format_compact;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use tracing::{debug, instrument};

use super::{
    config::SearchConfig,
    error::{ClientError, Result},
};
use crate::{
    domain::{DatasetDto, DatasetsResponse, JobStatusDto, Record, ResultsMetadata, ResultsPage,
        StatusResponse, SubmitResponse},
    id::JobId,
};

/// Pure HTTP client for the Cribl Search API
///
/// Holds no token state; callers pass a bearer token into every method.
/// Failures are classified per endpoint: submit and dataset listing turn a
/// 401 into an authentication error, while status and result fetches report
/// every failure as a query error.
#[derive(Debug, Clone)]
pub struct SearchApi {
    client: Client,
    config: SearchConfig,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    query: &'a str,
    earliest: &'a str,
    latest: &'a str,
    #[serde(rename = "sampleRate")]
    sample_rate: u32,
}

impl SearchApi {
    /// Create an API client over a shared HTTP connection pool
    pub fn new(client: Client, config: SearchConfig) -> Self {
        Self { client, config }
    }

    /// Get current configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Submit a search job and return its id
    #[instrument(skip(self, token), fields(query = %query, earliest = %earliest, latest = %latest))]
    pub async fn submit_job(
        &self,
        token: &str,
        query: &str,
        earliest: &str,
        latest: &str,
    ) -> Result<JobId> {
        let url = format_compact!("{}/search/jobs", self.config.api_base_url);
        let payload = SubmitRequest { query, earliest, latest, sample_rate: 1 };

        let request = self.client.post(url.as_str()).bearer_auth(token).json(&payload);
        let (status, body) = self.execute(request, "Job submission failed").await?;

        if status == StatusCode::BAD_REQUEST {
            return Err(ClientError::query(format!("Invalid query syntax: {body}")));
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::authentication("Authentication failed"));
        }
        if !status.is_success() {
            return Err(ClientError::query(format!(
                "Job submission failed: {status}: {body}"
            )));
        }

        let parsed: SubmitResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::query(format!("Job submission failed: {e}")))?;
        let job = parsed.items.into_iter().next().ok_or_else(|| {
            ClientError::query("Job submission failed: response contained no job")
        })?;

        debug!(job_id = %job.id, "Search job submitted");
        Ok(job.id)
    }

    /// Fetch the current status of a job
    ///
    /// Every failure here is a query error, a 401 included; only submission
    /// and dataset listing treat a 401 as an authentication failure.
    #[instrument(skip(self, token), fields(job_id = %job_id))]
    pub async fn job_status(&self, token: &str, job_id: &JobId) -> Result<JobStatusDto> {
        let url = format_compact!(
            "{}/search/jobs/{}/status",
            self.config.api_base_url,
            job_id
        );

        let request = self.client.get(url.as_str()).bearer_auth(token);
        let (status, body) = self.execute(request, "Failed to check job status").await?;

        if !status.is_success() {
            return Err(ClientError::query(format!(
                "Failed to check job status: {status}: {body}"
            )));
        }

        let parsed: StatusResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::query(format!("Failed to check job status: {e}")))?;
        parsed.items.into_iter().next().ok_or_else(|| {
            ClientError::query("Failed to check job status: response contained no items")
        })
    }

    /// Fetch one NDJSON page of results
    #[instrument(skip(self, token), fields(job_id = %job_id))]
    pub async fn results_page(
        &self,
        token: &str,
        job_id: &JobId,
        limit: u32,
        offset: u64,
    ) -> Result<ResultsPage> {
        let url = format_compact!(
            "{}/search/jobs/{}/results",
            self.config.api_base_url,
            job_id
        );

        let request = self
            .client
            .get(url.as_str())
            .query(&[("limit", u64::from(limit)), ("offset", offset)])
            .bearer_auth(token)
            .header("Accept", "application/x-ndjson")
            .timeout(self.config.request.results_timeout);
        let (status, body) = self.execute(request, "Failed to retrieve results").await?;

        if !status.is_success() {
            return Err(ClientError::query(format!(
                "Failed to retrieve results: {status}: {body}"
            )));
        }

        parse_results_page(&body)
    }

    /// List the datasets available to the workspace
    #[instrument(skip(self, token))]
    pub async fn datasets(&self, token: &str) -> Result<Vec<DatasetDto>> {
        let url = format_compact!("{}/datasets", self.config.api_base_url);

        let request = self.client.get(url.as_str()).bearer_auth(token);
        let (status, body) = self.execute(request, "Failed to list datasets").await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::authentication("Authentication failed"));
        }
        if !status.is_success() {
            return Err(ClientError::query(format!(
                "Failed to list datasets: {status}: {body}"
            )));
        }

        let parsed: DatasetsResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::query(format!("Failed to list datasets: {e}")))?;
        debug!(dataset_count = parsed.items.len(), "Fetched datasets");
        Ok(parsed.items)
    }

    /// Send a request and read status plus body, mapping transport failures
    /// to a query error with the given context
    async fn execute(&self, request: RequestBuilder, context: &str) -> Result<(StatusCode, String)> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::query(format!("{context}: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::query(format!("{context}: {e}")))?;
        Ok((status, body))
    }
}

/// Split an NDJSON page into its metadata record and event records
///
/// The first non-empty line is the metadata record; every other non-empty
/// line is one event. Blank lines are skipped.
fn parse_results_page(body: &str) -> Result<ResultsPage> {
    let mut lines = body.lines().map(str::trim).filter(|line| !line.is_empty());

    let metadata_line = lines.next().ok_or_else(|| {
        ClientError::query("Failed to retrieve results: page was missing its metadata record")
    })?;
    let metadata: ResultsMetadata = serde_json::from_str(metadata_line)
        .map_err(|e| ClientError::query(format!("Failed to retrieve results: {e}")))?;

    let records = lines
        .map(|line| {
            serde_json::from_str::<Record>(line)
                .map_err(|e| ClientError::query(format!("Failed to retrieve results: {e}")))
        })
        .collect::<Result<Vec<Record>>>()?;

    Ok(ResultsPage { metadata, records })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_submit_payload_shape() {
        let payload = SubmitRequest {
            query: "cribl dataset=\"main\"",
            earliest: "-1h",
            latest: "now",
            sample_rate: 1,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "query": "cribl dataset=\"main\"",
                "earliest": "-1h",
                "latest": "now",
                "sampleRate": 1,
            })
        );
    }

    #[test]
    fn test_parse_results_page() {
        let body = "{\"isFinished\": true, \"totalEventCount\": 2, \"offset\": 0}\n\
                    {\"_time\": 1704067200, \"message\": \"log1\"}\n\
                    {\"_time\": 1704067201, \"message\": \"log2\"}\n";
        let page = parse_results_page(body).unwrap();
        assert_eq!(page.metadata.total_event_count, 2);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[1]["message"], "log2");
    }

    #[test]
    fn test_parse_results_page_skips_blank_lines() {
        let body = "{\"totalEventCount\": 1}\n\n   \n{\"message\": \"log1\"}\n\n";
        let page = parse_results_page(body).unwrap();
        assert_eq!(page.records.len(), 1);
    }

    #[test]
    fn test_parse_results_page_metadata_only() {
        let page = parse_results_page("{\"totalEventCount\": 0}\n").unwrap();
        assert_eq!(page.metadata.total_event_count, 0);
        assert!(page.records.is_empty());
    }

    #[test]
    fn test_parse_results_page_rejects_empty_body() {
        let err = parse_results_page("").unwrap_err();
        assert!(err.to_string().contains("missing its metadata record"));

        let err = parse_results_page("   \n  \n").unwrap_err();
        assert!(err.to_string().contains("missing its metadata record"));
    }

    #[test]
    fn test_parse_results_page_rejects_malformed_record() {
        let body = "{\"totalEventCount\": 1}\nnot-json\n";
        let err = parse_results_page(body).unwrap_err();
        assert!(err.to_string().starts_with("Failed to retrieve results:"));
        assert!(matches!(err, ClientError::Query { job_id: None, .. }));
    }
}
