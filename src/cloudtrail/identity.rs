//! Recovers the identity behind a CloudTrail event.
//!
//! Events issued with temporary credentials report the session name as the
//! username. The raw event payload carries the role (session issuer) that
//! created the session, which is what support engineers actually want to see.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Event payload versions this parser understands.
///
/// Extend this list only after checking the new version's `userIdentity`
/// layout; an unknown version is rejected rather than read as "no issuer".
pub const SUPPORTED_EVENT_VERSIONS: &[&str] = &["1.08", "1.09"];

/// `userIdentity.type` of actions AWS services perform on their own.
pub const SERVICE_IDENTITY_TYPE: &str = "AWSService";

/// The subset of the raw event record needed to resolve the actor.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    #[serde(default)]
    event_version: String,
    #[serde(default)]
    user_identity: RawUserIdentity,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUserIdentity {
    #[serde(rename = "type", default)]
    identity_type: String,
    #[serde(default)]
    session_context: Option<RawSessionContext>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSessionContext {
    #[serde(default)]
    session_issuer: Option<RawSessionIssuer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSessionIssuer {
    #[serde(default)]
    user_name: String,
}

/// Who actually performed an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// `userIdentity.type`, e.g. "IAMUser", "AssumedRole" or "AWSService"
    pub identity_type: String,
    /// User name of the role that issued the session, empty when the event
    /// was not made with role session credentials
    pub session_issuer: String,
    pub event_version: String,
}

impl ResolvedIdentity {
    pub fn is_service(&self) -> bool {
        self.identity_type == SERVICE_IDENTITY_TYPE
    }
}

/// Resolve the identity recorded in a raw event payload.
///
/// Fails with [`Error::Parse`] when the payload is absent, empty or not JSON,
/// and with [`Error::UnsupportedSchema`] when its `eventVersion` is not in
/// [`SUPPORTED_EVENT_VERSIONS`].
pub fn resolve_identity(payload: Option<&str>) -> Result<ResolvedIdentity> {
    let payload = match payload {
        Some(p) if !p.trim().is_empty() => p,
        _ => return Err(Error::Parse("cannot parse an empty event payload".to_string())),
    };

    let raw: RawEvent = serde_json::from_str(payload)
        .map_err(|e| Error::Parse(format!("invalid event payload: {}", e)))?;

    if !SUPPORTED_EVENT_VERSIONS.contains(&raw.event_version.as_str()) {
        return Err(Error::UnsupportedSchema {
            version: raw.event_version,
            event_id: None,
        });
    }

    let session_issuer = raw
        .user_identity
        .session_context
        .and_then(|ctx| ctx.session_issuer)
        .map(|issuer| issuer.user_name)
        .unwrap_or_default();

    Ok(ResolvedIdentity {
        identity_type: raw.user_identity.identity_type,
        session_issuer,
        event_version: raw.event_version,
    })
}
