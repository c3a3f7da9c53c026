//! CloudTrail event model and the lookup port.
//!
//! The types here mirror what the `LookupEvents` API returns, reduced to the
//! fields the reports need. Everything is owned by a single invocation and
//! dropped when it ends.
//!
//! - [`identity`] - Recovers the acting identity from the raw event payload
//! - [`filter`] - Ignore-list and event-class filtering, line rendering
//! - [`lookup`] - Paginated retrieval in chronological order

pub mod filter;
pub mod identity;
pub mod lookup;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// A single CloudTrail event as returned by the event-history lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub event_id: String,
    pub event_name: String,
    pub event_time: Option<DateTime<Utc>>,
    /// Username CloudTrail reports for the call (absent for some service events)
    pub username: Option<String>,
    /// The full event record as JSON text
    pub cloud_trail_event: Option<String>,
    /// `Some(true)` for read-only calls, when CloudTrail reports it
    pub read_only: Option<bool>,
}

impl Event {
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }

    pub fn raw(&self) -> &str {
        self.cloud_trail_event.as_deref().unwrap_or_default()
    }
}

/// The lookup attribute CloudTrail should filter on server side.
///
/// `LookupEvents` accepts a single attribute per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupAttribute {
    ReadOnly(bool),
    ResourceName(String),
}

/// One bounded lookup: a time window plus optional server-side filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupQuery {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Restrict to events touching this resource name
    pub resource_name: Option<String>,
    /// `Some(false)` restricts to write events
    pub read_only: Option<bool>,
}

impl LookupQuery {
    /// Query everything between `start_time` and `end_time`.
    pub fn between(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time,
            resource_name: None,
            read_only: None,
        }
    }

    pub fn writes_only(mut self) -> Self {
        self.read_only = Some(false);
        self
    }

    pub fn for_resource(mut self, name: impl Into<String>) -> Self {
        self.resource_name = Some(name.into());
        self
    }

    /// The attribute sent to CloudTrail.
    ///
    /// A resource name wins over the read-only flag; the driver applies the
    /// read-only flag client side in that case.
    pub fn server_attribute(&self) -> Option<LookupAttribute> {
        match (&self.resource_name, self.read_only) {
            (Some(name), _) => Some(LookupAttribute::ResourceName(name.clone())),
            (None, Some(read_only)) => Some(LookupAttribute::ReadOnly(read_only)),
            (None, None) => None,
        }
    }

    /// Whether `event` passes the filters that were not sent to CloudTrail.
    pub fn accepts_client_side(&self, event: &Event) -> bool {
        match (&self.resource_name, self.read_only) {
            (Some(_), Some(wanted)) => event.read_only.map_or(true, |ro| ro == wanted),
            _ => true,
        }
    }
}

/// One page of lookup results, newest event first.
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub next_token: Option<String>,
}

/// Event-history API.
#[async_trait]
pub trait EventLookup: Send + Sync {
    /// Fetch one page of `query`, continuing from `next_token` when given.
    async fn lookup_page(&self, query: &LookupQuery, next_token: Option<String>)
        -> Result<EventPage>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window() -> LookupQuery {
        LookupQuery::between(
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_server_attribute_prefers_resource_name() {
        let query = window().writes_only().for_resource("i-0abc");
        assert_eq!(
            query.server_attribute(),
            Some(LookupAttribute::ResourceName("i-0abc".to_string()))
        );

        assert_eq!(
            window().writes_only().server_attribute(),
            Some(LookupAttribute::ReadOnly(false))
        );
        assert_eq!(window().server_attribute(), None);
    }

    #[test]
    fn test_client_side_read_only_check() {
        let query = window().writes_only().for_resource("i-0abc");
        let mut event = Event {
            event_id: "1".to_string(),
            event_name: "DescribeInstances".to_string(),
            event_time: None,
            username: None,
            cloud_trail_event: None,
            read_only: Some(true),
        };
        assert!(!query.accepts_client_side(&event));

        event.read_only = Some(false);
        assert!(query.accepts_client_side(&event));

        event.read_only = None;
        assert!(query.accepts_client_side(&event));
    }
}
