//! Cluster-management API client.
//!
//! Only two calls are needed: a cluster search, and the live resources of a
//! cluster, whose `aws_account_claim` names the customer's support role.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;

use crate::error::{Error, Result};

pub const DEFAULT_OCM_URL: &str = "https://api.openshift.com";

const CLUSTERS_PATH: &str = "/api/clusters_mgmt/v1/clusters";

/// A managed cluster, as returned by the cluster search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Cluster {
    pub id: String,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub region: Option<ClusterRegion>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClusterRegion {
    pub id: String,
}

impl Cluster {
    pub fn region_id(&self) -> Option<&str> {
        self.region
            .as_ref()
            .map(|r| r.id.as_str())
            .filter(|id| !id.is_empty())
    }
}

/// Cluster metadata lookups.
#[async_trait]
pub trait ClusterDirectory: Send + Sync {
    /// Clusters whose internal ID, external ID or display name match `identifier`.
    async fn search_clusters(&self, identifier: &str) -> Result<Vec<Cluster>>;

    /// Support role ARN from the cluster's AWS account claim, `None` when the
    /// claim does not set one.
    async fn support_role_arn(&self, cluster_id: &str) -> Result<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct ClusterList {
    #[serde(default)]
    items: Vec<Cluster>,
}

#[derive(Debug, Deserialize)]
struct LiveResources {
    #[serde(default)]
    resources: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct AccountClaim {
    #[serde(default)]
    spec: AccountClaimSpec,
}

#[derive(Debug, Default, Deserialize)]
struct AccountClaimSpec {
    #[serde(rename = "supportRoleARN", default)]
    support_role_arn: Option<String>,
}

/// Search expression matching a cluster by any of its identifiers.
pub fn cluster_search_query(identifier: &str) -> String {
    let escaped = identifier.replace('\'', "''");
    format!(
        "(id like '{0}' or external_id like '{0}' or display_name like '{0}')",
        escaped
    )
}

/// Support role ARN from a cluster's live resources, `None` when there is no
/// account claim or the claim does not set one.
pub fn support_role_from_resources(resources: &HashMap<String, String>) -> Result<Option<String>> {
    match resources.get("aws_account_claim") {
        Some(claim) => parse_support_role_arn(claim),
        None => Ok(None),
    }
}

/// Extract the support role ARN from the JSON text of an account claim.
pub fn parse_support_role_arn(account_claim: &str) -> Result<Option<String>> {
    let claim: AccountClaim = serde_json::from_str(account_claim)
        .map_err(|e| Error::ClusterLookup(format!("failed to parse AccountClaim: {}", e)))?;
    Ok(claim.spec.support_role_arn.filter(|arn| !arn.is_empty()))
}

/// Cluster-management API client
#[derive(Debug, Clone)]
pub struct OcmClient {
    url: String,
    token: String,
    client: Client,
}

impl OcmClient {
    pub fn new(url: String, token: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("cloudtrailctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Credential(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    /// Create a client from flags, falling back to `OCM_URL` and `OCM_TOKEN`.
    pub fn from_options(url: Option<&str>, token: Option<&str>) -> Result<Self> {
        let url = url
            .map(str::to_string)
            .or_else(|| env::var("OCM_URL").ok())
            .unwrap_or_else(|| DEFAULT_OCM_URL.to_string());

        let token = match token {
            Some(t) => t.to_string(),
            None => env::var("OCM_TOKEN").map_err(|_| {
                Error::Argument(
                    "OCM_TOKEN must be set to look up clusters when --direct is not used"
                        .to_string(),
                )
            })?,
        };

        Self::new(url, token)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.url, path);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::ClusterLookup(format!("request to {} failed: {}", path, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::ClusterLookup(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(Error::ClusterLookup(format!(
                "{} returned status {}: {}",
                path, status, body
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::ClusterLookup(format!("failed to parse response from {}: {}", path, e)))
    }
}

#[async_trait]
impl ClusterDirectory for OcmClient {
    async fn search_clusters(&self, identifier: &str) -> Result<Vec<Cluster>> {
        let search = cluster_search_query(identifier);
        let list: ClusterList = self.get(CLUSTERS_PATH, &[("search", search.as_str())]).await?;
        Ok(list.items)
    }

    async fn support_role_arn(&self, cluster_id: &str) -> Result<Option<String>> {
        let path = format!("{}/{}/resources/live", CLUSTERS_PATH, cluster_id);
        let live: LiveResources = self.get(&path, &[]).await?;
        support_role_from_resources(&live.resources)
    }
}
