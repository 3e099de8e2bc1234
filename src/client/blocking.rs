//! Synchronous facade for scripts that do not run their own async runtime

use compact_str::CompactString;
use tokio::runtime::Runtime;

use super::{
    config::{QueryOptions, SearchConfig},
    error::Result,
    service::CriblSearch,
};
use crate::domain::ResultTable;

/// Blocking wrapper around [`CriblSearch`]
///
/// Owns a dedicated runtime and drives each operation to completion on it,
/// so every call blocks the caller until the response arrives.
#[derive(Debug)]
pub struct BlockingClient {
    client: CriblSearch,
    rt: Runtime,
}

impl BlockingClient {
    /// Create a blocking client from a validated configuration
    ///
    /// # Panics
    ///
    /// Panics if the runtime backing the client cannot be created.
    pub fn new(config: SearchConfig) -> Result<Self> {
        let rt = Runtime::new().expect("Failed to create Tokio runtime");
        let client = CriblSearch::new(config)?;
        Ok(Self { client, rt })
    }

    /// Resolve credentials from the environment and create a client
    pub fn from_env() -> Result<Self> {
        Self::new(SearchConfig::from_env()?)
    }

    /// Organization the client is bound to
    pub fn org_id(&self) -> &str {
        self.client.org_id()
    }

    /// Workspace the client is bound to
    pub fn workspace(&self) -> &str {
        self.client.workspace()
    }

    /// Run a query over the default one-hour window
    pub fn query(&self, query: &str) -> Result<ResultTable> {
        self.rt.block_on(self.client.query(query))
    }

    /// Run a query with an explicit time range or deadline
    pub fn query_with(&self, query: &str, options: QueryOptions) -> Result<ResultTable> {
        self.rt.block_on(self.client.query_with(query, options))
    }

    /// Verify credentials by forcing a fresh token exchange
    pub fn test_connection(&self) -> Result<bool> {
        self.rt.block_on(self.client.test_connection())
    }

    /// List the datasets available to this workspace
    pub fn list_datasets(&self) -> Result<Vec<CompactString>> {
        self.rt.block_on(self.client.list_datasets())
    }
}
