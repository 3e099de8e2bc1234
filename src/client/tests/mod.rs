//! Test utilities and common test fixtures for client modules

use serde_json::json;


/// Create a token exchange response body
pub fn token_json_response() -> serde_json::Value {
    json!({
        "access_token": "test-access-token",
        "token_type": "Bearer",
        "expires_in": 86400
    })
}

/// Create a submit response carrying one job id
pub fn submit_json_response(job_id: &str) -> serde_json::Value {
    json!({
        "items": [
            { "id": job_id }
        ]
    })
}

/// Create a status response for a job still in flight or completed
pub fn status_json_response(status: &str) -> serde_json::Value {
    json!({
        "items": [
            { "status": status }
        ]
    })
}

/// Create a failed status response with the server's error message
pub fn failed_status_json_response(error: &str) -> serde_json::Value {
    json!({
        "items": [
            { "status": "failed", "error": error }
        ]
    })
}

/// Create a datasets response covering the id and name fallbacks
pub fn datasets_json_response() -> serde_json::Value {
    json!({
        "items": [
            { "id": "main", "name": "Main" },
            { "name": "edge_logs" },
            {}
        ]
    })
}

/// Create an NDJSON results page: one metadata line, then one line per record
pub fn ndjson_page(total_event_count: u64, offset: u64, records: &[serde_json::Value]) -> String {
    let metadata = json!({
        "isFinished": true,
        "totalEventCount": total_event_count,
        "offset": offset
    });
    let mut body = metadata.to_string();
    body.push('\n');
    for record in records {
        body.push_str(&record.to_string());
        body.push('\n');
    }
    body
}

/// Two-record results page used by the happy-path tests
pub fn sample_results_body() -> String {
    ndjson_page(
        2,
        0,
        &[
            json!({"_time": 1704067200, "message": "log1"}),
            json!({"_time": 1704067201, "message": "log2"}),
        ],
    )
}

/// Mock HTTP server for testing
#[cfg(test)]
#[allow(dead_code)]
pub struct MockServer {
    pub server: wiremock::MockServer,
}

#[cfg(test)]
#[allow(dead_code)]
impl MockServer {
    /// Start a new mock server
    pub async fn start() -> Self {
        let server = wiremock::MockServer::start().await;
        Self { server }
    }

    /// Get the base URL of the mock server
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Create a test config pointing to this mock server
    ///
    /// The poll interval is shrunk so polling tests finish quickly.
    pub fn test_config(&self) -> crate::client::config::SearchConfig {
        crate::client::config::SearchConfig::builder()
            .client_id("test-client-id")
            .client_secret("test-client-secret")
            .org_id("test-org")
            .workspace("test-workspace")
            .auth_url(format!("{}/oauth/token", self.base_url()))
            .api_base_url(self.base_url())
            .poll_interval(std::time::Duration::from_millis(10))
            .build()
            .unwrap()
    }
}

#[cfg(test)]
#[allow(clippy::module_inception)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_shapes() {
        let token = token_json_response();
        assert_eq!(token["access_token"], "test-access-token");

        let submit = submit_json_response("job-1");
        assert_eq!(submit["items"][0]["id"], "job-1");

        let failed = failed_status_json_response("Dataset not found");
        assert_eq!(failed["items"][0]["status"], "failed");
        assert_eq!(failed["items"][0]["error"], "Dataset not found");
    }

    #[test]
    fn test_ndjson_page_layout() {
        let body = ndjson_page(1, 0, &[json!({"message": "log1"})]);
        let mut lines = body.lines();
        assert!(lines.next().unwrap().contains("\"totalEventCount\":1"));
        assert!(lines.next().unwrap().contains("log1"));
        assert_eq!(lines.next(), None);
    }
}
