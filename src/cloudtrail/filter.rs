//! Event filtering and report line rendering.
//!
//! Filtering happens in three steps per event: resolve the acting identity,
//! drop ignored users, then keep only events of the requested class.

use regex::Regex;

use super::identity::{resolve_identity, ResolvedIdentity};
use super::Event;
use crate::error::{Error, Result};
use crate::utils::time::format_timestamp;

/// Marker CloudTrail writes into events rejected for missing permissions.
pub const UNAUTHORIZED_MARKER: &str = "\"errorCode\":\"Client.UnauthorizedOperation\"";

/// Users whose events are left out of a report.
///
/// Patterns are unanchored regular expressions matched against both the
/// reported username and the session issuer. A list holding only the empty
/// string is an empty list, so `--ignore-users ""` filters nothing.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    patterns: Vec<Regex>,
}

impl IgnoreList {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        if patterns.is_empty() || (patterns.len() == 1 && patterns[0].as_ref().is_empty()) {
            return Ok(Self::default());
        }

        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(p).map_err(|source| Error::InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Build from the comma separated form accepted on the command line.
    pub fn from_flag(value: &str) -> Result<Self> {
        let parts: Vec<&str> = value.split(',').collect();
        Self::new(&parts)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, value: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(value))
    }
}

/// Which events a report keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// Everything not performed by an AWS service on its own behalf
    Write,
    /// Calls rejected with `Client.UnauthorizedOperation`
    Forbidden,
}

impl EventClass {
    pub fn matches(self, event: &Event, identity: &ResolvedIdentity) -> bool {
        match self {
            Self::Write => !identity.is_service(),
            Self::Forbidden => has_unauthorized_response(event.raw()),
        }
    }

    /// Short name used in status messages.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::Forbidden => "permission denied",
        }
    }
}

pub fn has_unauthorized_response(payload: &str) -> bool {
    payload.contains(UNAUTHORIZED_MARKER)
}

/// An event that survived filtering, with its resolved identity.
#[derive(Debug, Clone)]
pub struct FilteredEvent {
    pub event: Event,
    pub identity: ResolvedIdentity,
}

impl FilteredEvent {
    pub fn session_issuer(&self) -> &str {
        &self.identity.session_issuer
    }
}

/// Apply the ignore list and event class to `events`, keeping their order.
///
/// An event whose payload cannot be resolved aborts the whole pass.
pub fn filter_events(
    events: Vec<Event>,
    ignore: &IgnoreList,
    class: EventClass,
) -> Result<Vec<FilteredEvent>> {
    let mut kept = Vec::new();

    for event in events {
        let identity = resolve_identity(event.cloud_trail_event.as_deref())
            .map_err(|e| with_event_id(e, &event.event_id))?;

        if ignore.matches(event.username()) || ignore.matches(&identity.session_issuer) {
            continue;
        }

        if class.matches(&event, &identity) {
            kept.push(FilteredEvent { event, identity });
        }
    }

    Ok(kept)
}

fn with_event_id(err: Error, event_id: &str) -> Error {
    match err {
        Error::Parse(msg) => Error::Parse(format!("event {}: {}", event_id, msg)),
        Error::UnsupportedSchema { version, .. } => Error::UnsupportedSchema {
            version,
            event_id: Some(event_id.to_string()),
        },
        other => other,
    }
}

/// How report lines are written.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Print the raw event payload instead of a summary line
    pub raw: bool,
    pub show_event_ids: bool,
}

/// Render one event for the report, or `None` when it should not be shown.
///
/// Summary lines are skipped for events with neither a username nor a session
/// issuer; those are system events with nobody to attribute them to.
pub fn render_event(filtered: &FilteredEvent, options: RenderOptions) -> Option<String> {
    let event = &filtered.event;

    if options.raw {
        return Some(format!("\n{}", event.raw()));
    }

    let issuer = filtered.session_issuer();
    if issuer.is_empty() && event.username().is_empty() {
        return None;
    }

    let mut line = event.event_name.clone();
    match &event.event_time {
        Some(time) => line.push_str(&format!(" | {}", format_timestamp(time))),
        None => line.push_str(" | -"),
    }
    if let Some(username) = &event.username {
        line.push_str(&format!(" | User: {}", username));
    }
    if !issuer.is_empty() {
        line.push_str(&format!(" | ARN: {}", issuer));
    }
    if options.show_event_ids {
        line.push_str(&format!(" | EventID: {}", event.event_id));
    }

    Some(line)
}
