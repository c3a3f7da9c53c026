//! Paginated event retrieval.
//!
//! CloudTrail returns events newest first. All pages are collected before the
//! list is reversed, so reports read oldest to newest.

use tracing::debug;

use super::{Event, EventLookup, LookupQuery};
use crate::error::Result;

/// Fetch every event matching `query`, oldest first.
pub async fn fetch_all_events<L>(lookup: &L, query: &LookupQuery) -> Result<Vec<Event>>
where
    L: EventLookup + ?Sized,
{
    fetch_all_events_with(lookup, query, |_, _| {}).await
}

/// Like [`fetch_all_events`], calling `on_page(pages, events)` after each page.
///
/// The first failing page aborts the lookup; events gathered so far are
/// discarded with it.
pub async fn fetch_all_events_with<L, F>(
    lookup: &L,
    query: &LookupQuery,
    mut on_page: F,
) -> Result<Vec<Event>>
where
    L: EventLookup + ?Sized,
    F: FnMut(usize, usize),
{
    let mut all_events = Vec::new();
    let mut next_token = None;
    let mut pages = 0;

    loop {
        let page = lookup.lookup_page(query, next_token.take()).await?;
        pages += 1;

        all_events.extend(
            page.events
                .into_iter()
                .filter(|event| query.accepts_client_side(event)),
        );
        debug!(pages, events = all_events.len(), "fetched cloudtrail page");
        on_page(pages, all_events.len());

        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => break,
        }
    }

    all_events.reverse();
    Ok(all_events)
}
