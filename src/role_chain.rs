//! Role chain from the operator's own account into a customer account.
//!
//! Reaching a customer account takes three role assumptions:
//!
//! 1. the organisation-wide jump role, from the caller's own credentials
//! 2. the support role, from the jump role session
//! 3. the customer account's support role, named in the cluster's account
//!    claim, from the support role session
//!
//! Each step is its own method so every failure point can be exercised on its
//! own; [`RoleChain::traverse`] runs them in order. Nothing is retried: any
//! failure aborts the chain and the caller starts over.
//!
//! Session credentials are moved into the next hop's [`CredentialSource`], so
//! a hop's credentials cannot be used again once the next hop has them.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{Error, Hop, Result};
use crate::ocm::{Cluster, ClusterDirectory};

/// Temporary credentials returned by an AssumeRole call.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: Option<DateTime<Utc>>,
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Credentials an AssumeRole call is made with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Whatever the default AWS credential chain provides
    Caller,
    Session(SessionCredentials),
}

/// Role assumption API.
#[async_trait]
pub trait RoleAssumer: Send + Sync {
    /// Assume `role_arn` in `region` using `source`.
    ///
    /// Errors are returned as a plain message; the chain attaches the hop.
    async fn assume_role(
        &self,
        source: CredentialSource,
        role_arn: &str,
        region: &str,
    ) -> std::result::Result<SessionCredentials, String>;
}

/// The fixed roles every chain passes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRoles {
    pub jump_role_arn: String,
    pub support_role_arn: String,
}

/// What a traversal resolved along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChainContext {
    /// Internal cluster ID, as the cluster-management API knows it
    pub cluster_id: String,
    pub region: String,
    pub jump_role_arn: String,
    pub support_role_arn: String,
    pub customer_role_arn: String,
}

/// Terminal state: credentials scoped to the customer account.
#[derive(Debug, Clone)]
pub struct CustomerAccess {
    pub context: RoleChainContext,
    pub credentials: SessionCredentials,
}

pub struct RoleChain<'a, C: ?Sized, R: ?Sized> {
    clusters: &'a C,
    assumer: &'a R,
    roles: &'a ChainRoles,
}

impl<'a, C, R> RoleChain<'a, C, R>
where
    C: ClusterDirectory + ?Sized,
    R: RoleAssumer + ?Sized,
{
    pub fn new(clusters: &'a C, assumer: &'a R, roles: &'a ChainRoles) -> Self {
        Self {
            clusters,
            assumer,
            roles,
        }
    }

    /// Find the single cluster matching `identifier` by internal ID,
    /// external ID or display name.
    pub async fn resolve_cluster(&self, identifier: &str) -> Result<Cluster> {
        let mut matches = self.clusters.search_clusters(identifier).await?;
        match matches.len() {
            0 => Err(Error::ClusterNotFound(identifier.to_string())),
            1 => Ok(matches.remove(0)),
            n => Err(Error::AmbiguousCluster {
                identifier: identifier.to_string(),
                matches: n,
            }),
        }
    }

    /// The explicit region when given, otherwise the cluster's home region.
    pub fn resolve_region(cluster: &Cluster, explicit: Option<&str>) -> Result<String> {
        match explicit.filter(|r| !r.is_empty()) {
            Some(region) => Ok(region.to_string()),
            None => cluster
                .region_id()
                .map(str::to_string)
                .ok_or_else(|| Error::MissingRegion(cluster.id.clone())),
        }
    }

    pub async fn assume_jump_role(&self, region: &str) -> Result<SessionCredentials> {
        self.hop(
            Hop::Jump,
            CredentialSource::Caller,
            &self.roles.jump_role_arn,
            region,
        )
        .await
    }

    pub async fn assume_support_role(
        &self,
        jump: SessionCredentials,
        region: &str,
    ) -> Result<SessionCredentials> {
        self.hop(
            Hop::Support,
            CredentialSource::Session(jump),
            &self.roles.support_role_arn,
            region,
        )
        .await
    }

    /// The customer-side support role named in the cluster's account claim.
    pub async fn resolve_customer_role(&self, cluster: &Cluster) -> Result<String> {
        match self.clusters.support_role_arn(&cluster.id).await? {
            Some(arn) if !arn.is_empty() => Ok(arn),
            _ => Err(Error::MissingRole(cluster.id.clone())),
        }
    }

    pub async fn assume_customer_role(
        &self,
        support: SessionCredentials,
        customer_role_arn: &str,
        region: &str,
    ) -> Result<SessionCredentials> {
        self.hop(
            Hop::Customer,
            CredentialSource::Session(support),
            customer_role_arn,
            region,
        )
        .await
    }

    /// Run every step in order and return customer-scoped credentials.
    pub async fn traverse(&self, identifier: &str, region: Option<&str>) -> Result<CustomerAccess> {
        let cluster = self.resolve_cluster(identifier).await?;
        let region = Self::resolve_region(&cluster, region)?;
        info!(cluster = %cluster.id, %region, "resolved cluster");

        let jump = self.assume_jump_role(&region).await?;
        let support = self.assume_support_role(jump, &region).await?;
        let customer_role_arn = self.resolve_customer_role(&cluster).await?;
        let credentials = self
            .assume_customer_role(support, &customer_role_arn, &region)
            .await?;

        Ok(CustomerAccess {
            context: RoleChainContext {
                cluster_id: cluster.id,
                region,
                jump_role_arn: self.roles.jump_role_arn.clone(),
                support_role_arn: self.roles.support_role_arn.clone(),
                customer_role_arn,
            },
            credentials,
        })
    }

    async fn hop(
        &self,
        hop: Hop,
        source: CredentialSource,
        role_arn: &str,
        region: &str,
    ) -> Result<SessionCredentials> {
        let credentials = self
            .assumer
            .assume_role(source, role_arn, region)
            .await
            .map_err(|message| Error::AssumeRole {
                hop,
                role_arn: role_arn.to_string(),
                message,
            })?;
        info!(%hop, role = role_arn, "assumed role");
        Ok(credentials)
    }
}
