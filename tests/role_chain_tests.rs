//! Role chain traversal against in-memory cluster and STS doubles.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use cloudtrailctl::error::{Error, Hop, Result};
use cloudtrailctl::ocm::{Cluster, ClusterDirectory, ClusterRegion};
use cloudtrailctl::role_chain::{
    ChainRoles, CredentialSource, RoleAssumer, RoleChain, SessionCredentials,
};

const JUMP_ROLE: &str = "arn:aws:iam::111111111111:role/jump";
const SUPPORT_ROLE: &str = "arn:aws:iam::222222222222:role/support";
const CUSTOMER_ROLE: &str = "arn:aws:iam::333333333333:role/ManagedSupport";

fn roles() -> ChainRoles {
    ChainRoles {
        jump_role_arn: JUMP_ROLE.to_string(),
        support_role_arn: SUPPORT_ROLE.to_string(),
    }
}

fn cluster(id: &str, name: &str, region: Option<&str>) -> Cluster {
    Cluster {
        id: id.to_string(),
        external_id: Some(format!("ext-{}", id)),
        display_name: Some(name.to_string()),
        region: region.map(|r| ClusterRegion { id: r.to_string() }),
    }
}

#[derive(Default)]
struct FakeDirectory {
    clusters: Vec<Cluster>,
    support_roles: HashMap<String, String>,
}

impl FakeDirectory {
    fn with_cluster(cluster: Cluster, support_role: Option<&str>) -> Self {
        let mut support_roles = HashMap::new();
        if let Some(role) = support_role {
            support_roles.insert(cluster.id.clone(), role.to_string());
        }
        Self {
            clusters: vec![cluster],
            support_roles,
        }
    }
}

#[async_trait]
impl ClusterDirectory for FakeDirectory {
    async fn search_clusters(&self, identifier: &str) -> Result<Vec<Cluster>> {
        Ok(self
            .clusters
            .iter()
            .filter(|c| {
                c.id == identifier
                    || c.external_id.as_deref() == Some(identifier)
                    || c.display_name.as_deref() == Some(identifier)
            })
            .cloned()
            .collect())
    }

    async fn support_role_arn(&self, cluster_id: &str) -> Result<Option<String>> {
        Ok(self.support_roles.get(cluster_id).cloned())
    }
}

/// Hands out credentials named after the assumed role and records every call.
#[derive(Default)]
struct FakeAssumer {
    fail_on: Option<&'static str>,
    calls: Mutex<Vec<(CredentialSource, String, String)>>,
}

impl FakeAssumer {
    fn failing_on(role_arn: &'static str) -> Self {
        Self {
            fail_on: Some(role_arn),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<(CredentialSource, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

fn credentials_for(role_arn: &str) -> SessionCredentials {
    SessionCredentials {
        access_key_id: format!("AKID-{}", role_arn),
        secret_access_key: "secret".to_string(),
        session_token: "token".to_string(),
        expiration: None,
    }
}

#[async_trait]
impl RoleAssumer for FakeAssumer {
    async fn assume_role(
        &self,
        source: CredentialSource,
        role_arn: &str,
        region: &str,
    ) -> std::result::Result<SessionCredentials, String> {
        self.calls
            .lock()
            .unwrap()
            .push((source, role_arn.to_string(), region.to_string()));

        if self.fail_on == Some(role_arn) {
            return Err("AccessDenied: not authorized to perform sts:AssumeRole".to_string());
        }
        Ok(credentials_for(role_arn))
    }
}

#[tokio::test]
async fn test_traverse_reaches_customer_account() {
    let directory = FakeDirectory::with_cluster(
        cluster("abc123", "prod-eu", Some("eu-west-1")),
        Some(CUSTOMER_ROLE),
    );
    let assumer = FakeAssumer::default();
    let roles = roles();

    let access = RoleChain::new(&directory, &assumer, &roles)
        .traverse("prod-eu", None)
        .await
        .unwrap();

    assert_eq!(access.context.cluster_id, "abc123");
    assert_eq!(access.context.region, "eu-west-1");
    assert_eq!(access.context.customer_role_arn, CUSTOMER_ROLE);
    assert_eq!(access.credentials, credentials_for(CUSTOMER_ROLE));

    let calls = assumer.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].1, JUMP_ROLE);
    assert_eq!(calls[1].1, SUPPORT_ROLE);
    assert_eq!(calls[2].1, CUSTOMER_ROLE);
    assert!(calls.iter().all(|(_, _, region)| region == "eu-west-1"));
}

#[tokio::test]
async fn test_each_hop_uses_previous_hop_credentials() {
    let directory =
        FakeDirectory::with_cluster(cluster("abc123", "prod", Some("us-west-2")), Some(CUSTOMER_ROLE));
    let assumer = FakeAssumer::default();
    let roles = roles();

    RoleChain::new(&directory, &assumer, &roles)
        .traverse("abc123", None)
        .await
        .unwrap();

    let calls = assumer.calls();
    assert_eq!(calls[0].0, CredentialSource::Caller);
    assert_eq!(calls[1].0, CredentialSource::Session(credentials_for(JUMP_ROLE)));
    assert_eq!(calls[2].0, CredentialSource::Session(credentials_for(SUPPORT_ROLE)));
}

#[tokio::test]
async fn test_explicit_region_overrides_cluster_region() {
    let directory =
        FakeDirectory::with_cluster(cluster("abc123", "prod", Some("eu-west-1")), Some(CUSTOMER_ROLE));
    let assumer = FakeAssumer::default();
    let roles = roles();

    let access = RoleChain::new(&directory, &assumer, &roles)
        .traverse("ext-abc123", Some("ap-southeast-2"))
        .await
        .unwrap();

    assert_eq!(access.context.region, "ap-southeast-2");
    assert!(assumer
        .calls()
        .iter()
        .all(|(_, _, region)| region == "ap-southeast-2"));
}

#[tokio::test]
async fn test_ambiguous_cluster_fails_before_any_assumption() {
    let directory = FakeDirectory {
        clusters: vec![
            cluster("one", "shared-name", Some("eu-west-1")),
            cluster("two", "shared-name", Some("eu-west-1")),
        ],
        support_roles: HashMap::new(),
    };
    let assumer = FakeAssumer::default();
    let roles = roles();

    let err = RoleChain::new(&directory, &assumer, &roles)
        .traverse("shared-name", None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::AmbiguousCluster { matches: 2, .. }));
    assert!(assumer.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_cluster() {
    let directory = FakeDirectory::default();
    let assumer = FakeAssumer::default();
    let roles = roles();

    let err = RoleChain::new(&directory, &assumer, &roles)
        .traverse("missing", None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ClusterNotFound(ref id) if id == "missing"));
    assert!(assumer.calls().is_empty());
}

#[tokio::test]
async fn test_cluster_without_region_needs_explicit_one() {
    let directory = FakeDirectory::with_cluster(cluster("abc123", "prod", None), Some(CUSTOMER_ROLE));
    let assumer = FakeAssumer::default();
    let roles = roles();
    let chain = RoleChain::new(&directory, &assumer, &roles);

    let err = chain.traverse("abc123", None).await.unwrap_err();
    assert!(matches!(err, Error::MissingRegion(_)));
    assert!(assumer.calls().is_empty());

    assert!(chain.traverse("abc123", Some("us-east-2")).await.is_ok());
}

#[tokio::test]
async fn test_missing_support_role_in_account_claim() {
    let directory = FakeDirectory::with_cluster(cluster("abc123", "prod", Some("eu-west-1")), None);
    let assumer = FakeAssumer::default();
    let roles = roles();

    let err = RoleChain::new(&directory, &assumer, &roles)
        .traverse("abc123", None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MissingRole(ref id) if id == "abc123"));
    // Jump and support hops ran; the customer hop never started.
    assert_eq!(assumer.calls().len(), 2);
}

#[tokio::test]
async fn test_failure_at_each_hop_stops_the_chain() {
    let cases = [
        (JUMP_ROLE, Hop::Jump, 1),
        (SUPPORT_ROLE, Hop::Support, 2),
        (CUSTOMER_ROLE, Hop::Customer, 3),
    ];

    for (failing_role, expected_hop, expected_calls) in cases {
        let directory = FakeDirectory::with_cluster(
            cluster("abc123", "prod", Some("eu-west-1")),
            Some(CUSTOMER_ROLE),
        );
        let assumer = FakeAssumer::failing_on(failing_role);
        let roles = roles();

        let err = RoleChain::new(&directory, &assumer, &roles)
            .traverse("abc123", None)
            .await
            .unwrap_err();

        match err {
            Error::AssumeRole { hop, role_arn, message } => {
                assert_eq!(hop, expected_hop);
                assert_eq!(role_arn, failing_role);
                assert!(message.contains("AccessDenied"));
            }
            other => panic!("expected AssumeRole error, got {:?}", other),
        }
        assert_eq!(assumer.calls().len(), expected_calls);
    }
}

#[tokio::test]
async fn test_steps_can_run_individually() {
    let directory =
        FakeDirectory::with_cluster(cluster("abc123", "prod", Some("eu-west-1")), Some(CUSTOMER_ROLE));
    let assumer = FakeAssumer::default();
    let roles = roles();
    let chain = RoleChain::new(&directory, &assumer, &roles);

    let found = chain.resolve_cluster("prod").await.unwrap();
    assert_eq!(found.id, "abc123");
    assert_eq!(
        RoleChain::<FakeDirectory, FakeAssumer>::resolve_region(&found, None).unwrap(),
        "eu-west-1"
    );
    assert_eq!(chain.resolve_customer_role(&found).await.unwrap(), CUSTOMER_ROLE);

    let jump = chain.assume_jump_role("eu-west-1").await.unwrap();
    assert_eq!(jump, credentials_for(JUMP_ROLE));
    let support = chain.assume_support_role(jump, "eu-west-1").await.unwrap();
    assert_eq!(support, credentials_for(SUPPORT_ROLE));
}
