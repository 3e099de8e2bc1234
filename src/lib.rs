//! Client library for Cribl Search.
//!
//! Authenticates against Cribl.Cloud with OAuth2 client credentials, submits
//! search jobs, polls them to completion, and collects NDJSON results into a
//! flat [`ResultTable`].
//!
//! ```no_run
//! use searchgoat::{CriblSearch, QueryOptions};
//!
//! # async fn run() -> searchgoat::Result<()> {
//! let client = CriblSearch::from_env()?;
//! let options = QueryOptions::new().with_earliest("-24h");
//! let table = client
//!     .query_with("cribl dataset=\"main\" | limit 100", options)
//!     .await?;
//! println!("{} rows", table.row_count());
//! # Ok(())
//! # }
//! ```
//!
//! Credentials come from explicit parameters or from the `CRIBL_CLIENT_ID`,
//! `CRIBL_CLIENT_SECRET`, `CRIBL_ORG_ID`, and `CRIBL_WORKSPACE` environment
//! variables. Scripts that do not run their own async runtime can use
//! [`BlockingClient`] for the same operations behind blocking calls.

pub mod client;
pub mod domain;
mod id;

pub use client::{BlockingClient, ClientError, CriblSearch, QueryOptions, Result, SearchConfig};
pub use domain::{Cell, JobStatus, ResultTable};
pub use id::JobId;
