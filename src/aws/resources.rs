//! Tag-scoped resource discovery.
//!
//! Resolves the resources carrying a tag and turns their ARNs into the
//! resource names CloudTrail's `ResourceName` lookup attribute expects.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Page size of the single tag search call.
///
/// Results beyond the first page are not fetched.
pub const TAG_SEARCH_PAGE_SIZE: i32 = 100;

/// A `key:value` resource tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTag {
    pub key: String,
    pub value: String,
}

impl FromStr for ResourceTag {
    type Err = Error;

    /// Parses `KEY:VALUE`. The value may itself contain colons.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((key, value)) if !key.is_empty() => Ok(Self {
                key: key.to_string(),
                value: value.to_string(),
            }),
            _ => Err(Error::Argument(format!(
                "invalid tag '{}', expected KEY:VALUE",
                s
            ))),
        }
    }
}

impl fmt::Display for ResourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.value)
    }
}

/// A tagged resource and the name CloudTrail knows it by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub arn: String,
    pub name: String,
    pub resource_type: String,
}

/// Derive resource name and type from an ARN.
///
/// The last `:` segment is split on `/`:
///
/// - `instance/i-0123` gives type `instance`, name `i-0123`
/// - `bucketname` (as in `arn:aws:s3:::bucketname`) gives type `unknown`
/// - `loadbalancer/net/lb/94029041ad37ac70` has more than two parts; CloudTrail
///   names such resources by their whole ARN, so the name is the ARN
pub fn extract_resource_from_arn(arn: &str) -> Result<Resource> {
    let malformed = || Error::MalformedArn(arn.to_string());

    let parts: Vec<&str> = arn.split(':').collect();
    if parts.len() < 6 || parts[0] != "arn" {
        return Err(malformed());
    }
    let type_and_name = parts[parts.len() - 1];
    if type_and_name.is_empty() {
        return Err(malformed());
    }

    let segments: Vec<&str> = type_and_name.split('/').collect();
    let resource = match segments.as_slice() {
        [name] => Resource {
            arn: arn.to_string(),
            name: (*name).to_string(),
            resource_type: "unknown".to_string(),
        },
        [resource_type, name] => Resource {
            arn: arn.to_string(),
            name: (*name).to_string(),
            resource_type: (*resource_type).to_string(),
        },
        [resource_type, ..] => Resource {
            arn: arn.to_string(),
            name: arn.to_string(),
            resource_type: (*resource_type).to_string(),
        },
        [] => return Err(malformed()),
    };

    Ok(resource)
}

/// Tag search API.
#[async_trait]
pub trait TaggedResourceSearch: Send + Sync {
    /// ARNs of resources carrying `tag`, at most `page_size` of them.
    async fn resources_with_tag(&self, tag: &ResourceTag, page_size: i32) -> Result<Vec<String>>;
}

/// Resources carrying `tag`.
///
/// ARNs that cannot be parsed are logged and skipped so one odd resource does
/// not hide the others.
pub async fn tagged_resources<S>(search: &S, tag: &ResourceTag) -> Result<Vec<Resource>>
where
    S: TaggedResourceSearch + ?Sized,
{
    let arns = search.resources_with_tag(tag, TAG_SEARCH_PAGE_SIZE).await?;
    debug!(tag = %tag, count = arns.len(), "tag search returned resources");

    let mut resources = Vec::with_capacity(arns.len());
    for arn in arns {
        match extract_resource_from_arn(&arn) {
            Ok(resource) => resources.push(resource),
            Err(e) => warn!("skipping tagged resource: {}", e),
        }
    }

    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_standard_arn() {
        let arn = "arn:aws:ec2:eu-west-1:123456:instance/i-040032f9e766f801f";
        let resource = extract_resource_from_arn(arn).unwrap();
        assert_eq!(resource.arn, arn);
        assert_eq!(resource.name, "i-040032f9e766f801f");
        assert_eq!(resource.resource_type, "instance");
    }

    #[test]
    fn test_extract_oldschool_load_balancer() {
        let arn = "arn:aws:elasticloadbalancing:eu-west-1:1234567:loadbalancer/net/typeid-test-int/94029041ad37ac70";
        let resource = extract_resource_from_arn(arn).unwrap();
        assert_eq!(resource.name, arn);
        assert_eq!(resource.resource_type, "loadbalancer");
    }

    #[test]
    fn test_extract_s3_bucket() {
        let arn = "arn:aws:s3:::typeid-test-nsqcm-image-registry-eu-west-1-glyaqltfmqmmjlukbxia";
        let resource = extract_resource_from_arn(arn).unwrap();
        assert_eq!(
            resource.name,
            "typeid-test-nsqcm-image-registry-eu-west-1-glyaqltfmqmmjlukbxia"
        );
        assert_eq!(resource.resource_type, "unknown");
    }

    #[test]
    fn test_extract_rejects_malformed() {
        for arn in ["", "not-an-arn", "arn:aws:s3", "arn:aws:ec2:eu-west-1:123:", "urn:aws:s3:::b"] {
            assert!(
                matches!(extract_resource_from_arn(arn), Err(Error::MalformedArn(ref a)) if a == arn),
                "{arn:?} should fail"
            );
        }
    }

    #[test]
    fn test_parse_tag() {
        let tag: ResourceTag = "red-hat-managed:true".parse().unwrap();
        assert_eq!(tag.key, "red-hat-managed");
        assert_eq!(tag.value, "true");

        let tag: ResourceTag = "kubernetes.io/cluster/abc:owned".parse().unwrap();
        assert_eq!(tag.key, "kubernetes.io/cluster/abc");
        assert_eq!(tag.to_string(), "kubernetes.io/cluster/abc:owned");

        assert!("novalue".parse::<ResourceTag>().is_err());
        assert!(":value".parse::<ResourceTag>().is_err());
    }
}
