//! Error types shared by every layer of the tool.
//!
//! Library code returns [`Result`]; the command layer wraps these errors with
//! `anyhow` context so the final message shows which hop failed.

use thiserror::Error;

/// Which hop of the role chain an [`Error::AssumeRole`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hop {
    Jump,
    Support,
    Customer,
}

impl std::fmt::Display for Hop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jump => write!(f, "jump role"),
            Self::Support => write!(f, "support role"),
            Self::Customer => write!(f, "customer support role"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid flag value or combination
    #[error("invalid usage: {0}")]
    Argument(String),

    #[error("invalid ignore-users pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A client could not be constructed or the caller has no usable credentials
    #[error("could not initialize aws client: {0}")]
    Credential(String),

    /// A paginated event-history request failed
    #[error("cloudtrail lookup failed: {0}")]
    Lookup(String),

    /// The raw event payload was empty or not valid JSON
    #[error("could not parse cloudtrail event: {0}")]
    Parse(String),

    #[error(
        "{}cloudtrail event version '{version}' is not yet supported by cloudtrailctl",
        event_prefix(.event_id)
    )]
    UnsupportedSchema {
        version: String,
        /// Set once the failing event is known
        event_id: Option<String>,
    },

    /// The cluster-management API call itself failed
    #[error("cluster lookup failed: {0}")]
    ClusterLookup(String),

    #[error("the provided cluster identifier is ambiguous: {identifier} matches {matches} clusters")]
    AmbiguousCluster { identifier: String, matches: usize },

    #[error("no cluster found for {0}")]
    ClusterNotFound(String),

    #[error("cluster {0} reports no region and none was given")]
    MissingRegion(String),

    #[error("AccountClaim for cluster {0} is invalid: supportRoleARN is not present")]
    MissingRole(String),

    #[error("failed to assume {hop} {role_arn}: {message}")]
    AssumeRole {
        hop: Hop,
        role_arn: String,
        message: String,
    },

    #[error("could not get tagged resources: {0}")]
    TagSearch(String),

    #[error("unable to extract resource type/name from ARN '{0}'")]
    MalformedArn(String),
}

fn event_prefix(event_id: &Option<String>) -> String {
    event_id
        .as_deref()
        .map(|id| format!("event {}: ", id))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;
