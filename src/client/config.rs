//! Configuration management for the Cribl Search client

use std::time::Duration;

use compact_str::{format_compact, CompactString};

use super::error::{ClientError, Result};

/// OAuth2 token endpoint for Cribl.Cloud
pub const AUTH_URL: &str = "https://login.cribl.cloud/oauth/token";

/// Audience claim sent with every token exchange
pub const AUTH_AUDIENCE: &str = "https://api.cribl.cloud";

const CREDENTIAL_FIELDS: [(&str, &str); 4] = [
    ("client_id", "CRIBL_CLIENT_ID"),
    ("client_secret", "CRIBL_CLIENT_SECRET"),
    ("org_id", "CRIBL_ORG_ID"),
    ("workspace", "CRIBL_WORKSPACE"),
];

/// Main configuration for the Cribl Search client
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// OAuth2 client ID from Cribl.Cloud
    pub client_id: CompactString,
    /// OAuth2 client secret
    pub client_secret: CompactString,
    /// Cribl organization identifier
    pub org_id: CompactString,
    /// Cribl workspace name
    pub workspace: CompactString,
    /// OAuth2 token endpoint
    pub auth_url: CompactString,
    /// API base URL, derived from workspace and org unless overridden
    pub api_base_url: CompactString,
    /// Request configuration
    pub request: RequestConfig,
}

/// HTTP request and polling configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Per-call timeout for auth, submit, status, and dataset requests
    pub timeout: Duration,
    /// Per-call timeout for result page requests
    pub results_timeout: Duration,
    /// Delay between job status polls
    pub poll_interval: Duration,
    /// Number of result records requested per page
    pub page_size: u32,
    /// Default wall-clock deadline for a whole query
    pub query_timeout: Duration,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            results_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(2),
            page_size: 1000,
            query_timeout: Duration::from_secs(300),
        }
    }
}

/// Parameters for a single query
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Start of the search time range, relative or absolute
    pub earliest: CompactString,
    /// End of the search time range
    pub latest: CompactString,
    /// Wall-clock deadline override; falls back to the configured default
    pub timeout: Option<Duration>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            earliest: "-1h".into(),
            latest: "now".into(),
            timeout: None,
        }
    }
}

impl QueryOptions {
    /// Create query options with the default one-hour window
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the start of the time range
    pub fn with_earliest(mut self, earliest: impl Into<CompactString>) -> Self {
        self.earliest = earliest.into();
        self
    }

    /// Set the end of the time range
    pub fn with_latest(mut self, latest: impl Into<CompactString>) -> Self {
        self.latest = latest.into();
        self
    }

    /// Set the overall deadline for this query
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl SearchConfig {
    /// Create a configuration from explicit credentials
    pub fn new(
        client_id: impl Into<CompactString>,
        client_secret: impl Into<CompactString>,
        org_id: impl Into<CompactString>,
        workspace: impl Into<CompactString>,
    ) -> Self {
        let org_id = org_id.into();
        let workspace = workspace.into();
        let api_base_url = derive_api_base_url(&workspace, &org_id);
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            org_id,
            workspace,
            auth_url: AUTH_URL.into(),
            api_base_url,
            request: RequestConfig::default(),
        }
    }

    /// Resolve every credential from its environment variable
    pub fn from_env() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for per-field override with environment fallback
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Replace the request configuration
    pub fn with_request(mut self, request: RequestConfig) -> Self {
        self.request = request;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let values = [
            &self.client_id,
            &self.client_secret,
            &self.org_id,
            &self.workspace,
        ];
        let missing: Vec<(&str, &str)> = CREDENTIAL_FIELDS
            .into_iter()
            .zip(values)
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| field)
            .collect();
        if !missing.is_empty() {
            return Err(missing_credentials_error(&missing));
        }

        if !self.auth_url.starts_with("http://") && !self.auth_url.starts_with("https://") {
            return Err(ClientError::configuration(
                "Invalid auth_url: must start with http:// or https://",
            ));
        }

        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(ClientError::configuration(
                "Invalid api_base_url: must start with http:// or https://",
            ));
        }

        if self.request.page_size == 0 {
            return Err(ClientError::configuration(
                "Invalid page_size: must be greater than zero",
            ));
        }

        if self.request.timeout.is_zero() || self.request.results_timeout.is_zero() {
            return Err(ClientError::configuration(
                "Invalid timeout: must be greater than zero",
            ));
        }

        Ok(())
    }
}

fn derive_api_base_url(workspace: &str, org_id: &str) -> CompactString {
    format_compact!("https://{workspace}-{org_id}.cribl.cloud/api/v1/m/default_search")
}

fn missing_credentials_error(missing: &[(&str, &str)]) -> ClientError {
    let fields: Vec<&str> = missing.iter().map(|(field, _)| *field).collect();
    let env_vars: Vec<&str> = missing.iter().map(|(_, var)| *var).collect();
    ClientError::configuration(format!(
        "Missing required credentials: {}\n\
         Either pass them as parameters or set environment variables: {}",
        fields.join(", "),
        env_vars.join(", ")
    ))
}

/// Builder for SearchConfig
#[derive(Debug, Default)]
pub struct SearchConfigBuilder {
    client_id: Option<CompactString>,
    client_secret: Option<CompactString>,
    org_id: Option<CompactString>,
    workspace: Option<CompactString>,
    auth_url: Option<CompactString>,
    api_base_url: Option<CompactString>,
    request: Option<RequestConfig>,
}

impl SearchConfigBuilder {
    /// Set the OAuth2 client ID
    pub fn client_id(mut self, client_id: impl Into<CompactString>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the OAuth2 client secret
    pub fn client_secret(mut self, client_secret: impl Into<CompactString>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Set the organization identifier
    pub fn org_id(mut self, org_id: impl Into<CompactString>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Set the workspace name
    pub fn workspace(mut self, workspace: impl Into<CompactString>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    /// Override the OAuth2 token endpoint
    pub fn auth_url(mut self, url: impl Into<CompactString>) -> Self {
        self.auth_url = Some(url.into());
        self
    }

    /// Override the API base URL instead of deriving it
    pub fn api_base_url(mut self, url: impl Into<CompactString>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Set the request configuration
    pub fn request(mut self, request: RequestConfig) -> Self {
        self.request = Some(request);
        self
    }

    /// Set the delay between job status polls
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        let mut request = self.request.unwrap_or_default();
        request.poll_interval = interval;
        self.request = Some(request);
        self
    }

    /// Set the number of result records requested per page
    pub fn page_size(mut self, page_size: u32) -> Self {
        let mut request = self.request.unwrap_or_default();
        request.page_size = page_size;
        self.request = Some(request);
        self
    }

    /// Set the per-call HTTP timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let mut request = self.request.unwrap_or_default();
        request.timeout = timeout;
        self.request = Some(request);
        self
    }

    /// Set the default wall-clock deadline for whole queries
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        let mut request = self.request.unwrap_or_default();
        request.query_timeout = timeout;
        self.request = Some(request);
        self
    }

    /// Build the configuration, filling unset credentials from the environment
    ///
    /// Each credential resolves independently: an explicit non-empty value
    /// wins, otherwise the matching environment variable is consulted. Empty
    /// values count as unset. All unresolved fields are reported in one error.
    pub fn build(self) -> Result<SearchConfig> {
        let client_id = resolve_credential(self.client_id, CREDENTIAL_FIELDS[0].1);
        let client_secret = resolve_credential(self.client_secret, CREDENTIAL_FIELDS[1].1);
        let org_id = resolve_credential(self.org_id, CREDENTIAL_FIELDS[2].1);
        let workspace = resolve_credential(self.workspace, CREDENTIAL_FIELDS[3].1);

        let (client_id, client_secret, org_id, workspace) =
            match (client_id, client_secret, org_id, workspace) {
                (Some(id), Some(secret), Some(org), Some(ws)) => (id, secret, org, ws),
                (id, secret, org, ws) => {
                    let resolved = [&id, &secret, &org, &ws];
                    let missing: Vec<(&str, &str)> = CREDENTIAL_FIELDS
                        .into_iter()
                        .zip(resolved)
                        .filter(|(_, value)| value.is_none())
                        .map(|(field, _)| field)
                        .collect();
                    return Err(missing_credentials_error(&missing));
                }
            };

        let api_base_url = self
            .api_base_url
            .unwrap_or_else(|| derive_api_base_url(&workspace, &org_id));
        let config = SearchConfig {
            client_id,
            client_secret,
            org_id,
            workspace,
            auth_url: self.auth_url.unwrap_or_else(|| AUTH_URL.into()),
            api_base_url,
            request: self.request.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

fn resolve_credential(explicit: Option<CompactString>, env_var: &str) -> Option<CompactString> {
    explicit
        .filter(|value| !value.is_empty())
        .or_else(|| {
            std::env::var(env_var)
                .ok()
                .filter(|value| !value.is_empty())
                .map(CompactString::from)
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    // Serializes tests that touch CRIBL_* process environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_cribl_env() {
        for (_, var) in CREDENTIAL_FIELDS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_api_base_url_derivation() {
        let config = SearchConfig::new("id", "secret", "test-org", "test-workspace");
        assert_eq!(
            config.api_base_url,
            "https://test-workspace-test-org.cribl.cloud/api/v1/m/default_search"
        );
        assert_eq!(config.auth_url, "https://login.cribl.cloud/oauth/token");
    }

    #[test]
    fn test_explicit_credentials_win_over_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_cribl_env();
        std::env::set_var("CRIBL_CLIENT_ID", "env-id");
        std::env::set_var("CRIBL_CLIENT_SECRET", "env-secret");
        std::env::set_var("CRIBL_ORG_ID", "env-org");
        std::env::set_var("CRIBL_WORKSPACE", "env-workspace");

        let config = SearchConfig::builder()
            .client_id("param-id")
            .build()
            .unwrap();

        assert_eq!(config.client_id, "param-id");
        assert_eq!(config.client_secret, "env-secret");
        assert_eq!(config.org_id, "env-org");
        assert_eq!(config.workspace, "env-workspace");
        clear_cribl_env();
    }

    #[test]
    fn test_missing_credentials_all_reported() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_cribl_env();

        let err = SearchConfig::builder()
            .client_id("only-id")
            .build()
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("Missing required credentials: client_secret, org_id, workspace"));
        assert!(msg.contains(
            "set environment variables: CRIBL_CLIENT_SECRET, CRIBL_ORG_ID, CRIBL_WORKSPACE"
        ));
    }

    #[test]
    fn test_empty_explicit_value_falls_back_to_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_cribl_env();
        std::env::set_var("CRIBL_CLIENT_ID", "env-id");
        std::env::set_var("CRIBL_CLIENT_SECRET", "env-secret");
        std::env::set_var("CRIBL_ORG_ID", "env-org");
        std::env::set_var("CRIBL_WORKSPACE", "env-workspace");

        let config = SearchConfig::builder().client_id("").build().unwrap();

        assert_eq!(config.client_id, "env-id");
        clear_cribl_env();
    }

    #[test]
    fn test_endpoint_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_cribl_env();

        let config = SearchConfig::builder()
            .client_id("id")
            .client_secret("secret")
            .org_id("org")
            .workspace("main")
            .auth_url("http://127.0.0.1:9000/oauth/token")
            .api_base_url("http://127.0.0.1:9000/api/v1/m/default_search")
            .build()
            .unwrap();

        assert_eq!(config.auth_url, "http://127.0.0.1:9000/oauth/token");
        assert_eq!(
            config.api_base_url,
            "http://127.0.0.1:9000/api/v1/m/default_search"
        );
    }

    #[test]
    fn test_config_validation() {
        let config = SearchConfig::new("id", "secret", "org", "main");
        assert!(config.validate().is_ok());

        let config = SearchConfig::new("id", "", "org", "main");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("client_secret"));

        let mut config = SearchConfig::new("id", "secret", "org", "main");
        config.auth_url = "login.cribl.cloud/oauth/token".into();
        assert!(config.validate().is_err());

        let mut config = SearchConfig::new("id", "secret", "org", "main");
        config.request.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_defaults() {
        let request = RequestConfig::default();
        assert_eq!(request.timeout, Duration::from_secs(30));
        assert_eq!(request.results_timeout, Duration::from_secs(60));
        assert_eq!(request.poll_interval, Duration::from_secs(2));
        assert_eq!(request.page_size, 1000);
        assert_eq!(request.query_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_query_options_defaults() {
        let options = QueryOptions::new();
        assert_eq!(options.earliest, "-1h");
        assert_eq!(options.latest, "now");
        assert_eq!(options.timeout, None);

        let options = QueryOptions::new()
            .with_earliest("-24h")
            .with_latest("-1h")
            .with_timeout(Duration::from_secs(60));
        assert_eq!(options.earliest, "-24h");
        assert_eq!(options.latest, "-1h");
        assert_eq!(options.timeout, Some(Duration::from_secs(60)));
    }
}
