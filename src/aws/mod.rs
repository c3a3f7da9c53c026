//! AWS SDK adapters.
//!
//! [`AwsClient`] bundles the regional CloudTrail, STS and tagging clients and
//! implements the lookup ports on top of them. [`StsRoleAssumer`] performs
//! the role assumptions of the role chain.
//!
//! - [`resources`] - Tag-scoped resource discovery and ARN parsing

pub mod resources;

use std::time::{Duration as StdDuration, UNIX_EPOCH};

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_cloudtrail::primitives::DateTime as SdkDateTime;
use aws_sdk_cloudtrail::types::{LookupAttribute as SdkLookupAttribute, LookupAttributeKey};
use aws_sdk_resourcegroupstagging::types::TagFilter;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::cloudtrail::{Event, EventLookup, EventPage, LookupAttribute, LookupQuery};
use crate::error::{Error, Result};
use crate::role_chain::{CredentialSource, RoleAssumer, SessionCredentials};
use resources::{ResourceTag, TaggedResourceSearch};

/// Region used when none is given or configured; also where IAM records
/// its global events.
pub const DEFAULT_REGION: &str = "us-east-1";

const SESSION_NAME: &str = "cloudtrailctl";
const CREDENTIALS_PROVIDER_NAME: &str = "cloudtrailctl-assumed-role";

/// Account and principal the tool is running as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: String,
    pub arn: String,
}

/// Load SDK configuration for `region`, using `source` for credentials.
pub async fn load_sdk_config(region: &str, source: &CredentialSource) -> SdkConfig {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));

    if let CredentialSource::Session(session) = source {
        loader = loader.credentials_provider(sdk_credentials(session));
    }

    loader.load().await
}

fn sdk_credentials(session: &SessionCredentials) -> Credentials {
    let expiry = session.expiration.and_then(|exp| {
        u64::try_from(exp.timestamp())
            .ok()
            .map(|secs| UNIX_EPOCH + StdDuration::from_secs(secs))
    });

    Credentials::new(
        &session.access_key_id,
        &session.secret_access_key,
        Some(session.session_token.clone()),
        expiry,
        CREDENTIALS_PROVIDER_NAME,
    )
}

fn to_sdk_time(dt: &DateTime<Utc>) -> SdkDateTime {
    SdkDateTime::from_secs(dt.timestamp())
}

fn from_sdk_time(dt: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

/// Regional AWS clients for one account.
#[derive(Debug, Clone)]
pub struct AwsClient {
    region: String,
    cloudtrail: aws_sdk_cloudtrail::Client,
    sts: aws_sdk_sts::Client,
    tagging: aws_sdk_resourcegroupstagging::Client,
}

impl AwsClient {
    pub fn from_config(region: &str, config: &SdkConfig) -> Self {
        Self {
            region: region.to_string(),
            cloudtrail: aws_sdk_cloudtrail::Client::new(config),
            sts: aws_sdk_sts::Client::new(config),
            tagging: aws_sdk_resourcegroupstagging::Client::new(config),
        }
    }

    pub async fn connect(region: &str, source: &CredentialSource) -> Self {
        let config = load_sdk_config(region, source).await;
        Self::from_config(region, &config)
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Who the configured credentials belong to.
    ///
    /// This is the first call made with a new client, so missing or expired
    /// credentials surface here as [`Error::Credential`].
    pub async fn caller_identity(&self) -> Result<CallerIdentity> {
        let out = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| {
                Error::Credential(format!(
                    "could not get caller identity: {}",
                    aws_sdk_sts::error::DisplayErrorContext(&e)
                ))
            })?;

        Ok(CallerIdentity {
            account: out.account().unwrap_or_default().to_string(),
            arn: out.arn().unwrap_or_default().to_string(),
        })
    }
}

fn to_sdk_attribute(attribute: &LookupAttribute) -> Result<SdkLookupAttribute> {
    let (key, value) = match attribute {
        LookupAttribute::ReadOnly(read_only) => {
            (LookupAttributeKey::ReadOnly, read_only.to_string())
        }
        LookupAttribute::ResourceName(name) => (LookupAttributeKey::ResourceName, name.clone()),
    };

    SdkLookupAttribute::builder()
        .attribute_key(key)
        .attribute_value(value)
        .build()
        .map_err(|e| Error::Lookup(format!("failed to build lookup attribute: {}", e)))
}

fn from_sdk_event(event: &aws_sdk_cloudtrail::types::Event) -> Event {
    Event {
        event_id: event.event_id().unwrap_or_default().to_string(),
        event_name: event.event_name().unwrap_or_default().to_string(),
        event_time: event.event_time().and_then(from_sdk_time),
        username: event.username().map(str::to_string),
        cloud_trail_event: event.cloud_trail_event().map(str::to_string),
        read_only: event.read_only().and_then(|ro| ro.parse().ok()),
    }
}

#[async_trait]
impl EventLookup for AwsClient {
    async fn lookup_page(
        &self,
        query: &LookupQuery,
        next_token: Option<String>,
    ) -> Result<EventPage> {
        let attributes = query
            .server_attribute()
            .map(|attr| to_sdk_attribute(&attr))
            .transpose()?
            .map(|attr| vec![attr]);

        debug!(region = %self.region, ?attributes, has_token = next_token.is_some(), "LookupEvents");

        let response = self
            .cloudtrail
            .lookup_events()
            .start_time(to_sdk_time(&query.start_time))
            .end_time(to_sdk_time(&query.end_time))
            .set_lookup_attributes(attributes)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| {
                Error::Lookup(format!(
                    "{} ({})",
                    aws_sdk_cloudtrail::error::DisplayErrorContext(&e),
                    self.region
                ))
            })?;

        Ok(EventPage {
            events: response.events().iter().map(from_sdk_event).collect(),
            next_token: response.next_token().map(str::to_string),
        })
    }
}

#[async_trait]
impl TaggedResourceSearch for AwsClient {
    async fn resources_with_tag(&self, tag: &ResourceTag, page_size: i32) -> Result<Vec<String>> {
        let filter = TagFilter::builder()
            .key(&tag.key)
            .values(&tag.value)
            .build();

        let response = self
            .tagging
            .get_resources()
            .tag_filters(filter)
            .resources_per_page(page_size)
            .send()
            .await
            .map_err(|e| {
                Error::TagSearch(
                    aws_sdk_resourcegroupstagging::error::DisplayErrorContext(&e).to_string(),
                )
            })?;

        Ok(response
            .resource_tag_mapping_list()
            .iter()
            .filter_map(|mapping| mapping.resource_arn().map(str::to_string))
            .collect())
    }
}

/// Assumes roles through STS.
#[derive(Debug, Clone, Default)]
pub struct StsRoleAssumer;

#[async_trait]
impl RoleAssumer for StsRoleAssumer {
    async fn assume_role(
        &self,
        source: CredentialSource,
        role_arn: &str,
        region: &str,
    ) -> std::result::Result<SessionCredentials, String> {
        let config = load_sdk_config(region, &source).await;
        // The source credentials are not needed once the config holds them.
        drop(source);

        let response = aws_sdk_sts::Client::new(&config)
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(SESSION_NAME)
            .send()
            .await
            .map_err(|e| aws_sdk_sts::error::DisplayErrorContext(&e).to_string())?;

        let credentials = response
            .credentials()
            .ok_or_else(|| "AssumeRole response did not include credentials".to_string())?;

        Ok(SessionCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiration: from_sdk_time(credentials.expiration()),
        })
    }
}
