//! Shared driver for the history commands.
//!
//! One invocation:
//!
//! 1. obtains credentials, either the caller's own (`--direct`) or through
//!    the role chain into the customer account
//! 2. prints who it is running as
//! 3. reports matching events in the primary region
//! 4. repeats the report in us-east-1, where IAM records its global events,
//!    when the primary region is a different one
//!
//! Regions and queries are processed one after another. Lines already printed
//! stay on screen when a later step fails.

use std::future::Future;
use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::aws::resources::{tagged_resources, TaggedResourceSearch};
use crate::aws::{AwsClient, StsRoleAssumer, DEFAULT_REGION};
use crate::cloudtrail::filter::{filter_events, render_event, EventClass};
use crate::cloudtrail::lookup::fetch_all_events_with;
use crate::cloudtrail::{EventLookup, LookupQuery};
use crate::config::{Access, Config, RoleChainSettings};
use crate::ocm::OcmClient;
use crate::role_chain::{CredentialSource, CustomerAccess, RoleChain};
use crate::utils::format::count_of;
use crate::utils::progress::PageSpinner;
use crate::utils::time::{format_timestamp, start_time};

pub async fn run(config: &Config) -> Result<()> {
    let (source, primary_region) = match &config.access {
        Access::Direct => (CredentialSource::Caller, config.direct_region()),
        Access::RoleChain(settings) => {
            let access = enter_customer_account(settings, config.region.as_deref()).await?;
            eprintln!(
                "Successfully logged into customer account with role: {}",
                access.context.customer_role_arn
            );
            let region = access.context.region.clone();
            (CredentialSource::Session(access.credentials), region)
        }
    };

    let client = AwsClient::connect(&primary_region, &source).await;
    let caller = client
        .caller_identity()
        .await
        .context("could not verify AWS credentials")?;

    let end = Utc::now();
    let start = start_time(end, config.since);
    eprintln!(
        "Checking {} event history since {} for AWS account {} as {}",
        config.class.describe(),
        format_timestamp(&start),
        caller.account,
        caller.arn
    );

    let mut out = io::stdout();
    report_regions(
        &client,
        &primary_region,
        |region| {
            let source = source.clone();
            async move { AwsClient::connect(&region, &source).await }
        },
        config,
        start,
        end,
        &mut out,
    )
    .await?;

    Ok(())
}

/// Regions one invocation reports on, in order: the primary region, then
/// [`DEFAULT_REGION`] for IAM's global events when it is a different one.
pub fn regions_to_report(primary: &str) -> Vec<&str> {
    if primary == DEFAULT_REGION {
        vec![primary]
    } else {
        vec![primary, DEFAULT_REGION]
    }
}

/// Report every region of [`regions_to_report`].
///
/// `primary` is the already connected client for `primary_region`; clients
/// for the other regions come from `connect`, which is handed the region
/// name. Returns the number of lines written across all regions.
pub async fn report_regions<C, F, Fut, W>(
    primary: &C,
    primary_region: &str,
    mut connect: F,
    config: &Config,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    out: &mut W,
) -> Result<usize>
where
    C: EventLookup + TaggedResourceSearch,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = C>,
    W: Write,
{
    let mut printed = 0;

    for region in regions_to_report(primary_region) {
        eprintln!();
        let lines = if region == primary_region {
            eprintln!("Fetching {} events...", region);
            report_events(primary, config, start, end, out).await
        } else {
            eprintln!("Fetching IAM events from {}", region);
            let client = connect(region.to_string()).await;
            report_events(&client, config, start, end, out).await
        };
        printed += lines.with_context(|| format!("failed to report events in {}", region))?;
    }

    Ok(printed)
}

async fn enter_customer_account(
    settings: &RoleChainSettings,
    region: Option<&str>,
) -> Result<CustomerAccess> {
    let ocm = OcmClient::from_options(settings.ocm_url.as_deref(), None)
        .context("could not initialize ocm client")?;
    let assumer = StsRoleAssumer;

    RoleChain::new(&ocm, &assumer, &settings.roles)
        .traverse(&settings.cluster_id, region)
        .await
        .with_context(|| {
            format!(
                "could not reach the AWS account of cluster {}",
                settings.cluster_id
            )
        })
}

/// The lookups one report needs for the window `start..end`.
///
/// Tag-scoped write reports get one query per tagged resource; every other
/// report is a single query.
pub async fn build_queries<S>(
    search: &S,
    config: &Config,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<LookupQuery>>
where
    S: TaggedResourceSearch + ?Sized,
{
    let window = LookupQuery::between(start, end);

    match (config.class, &config.tag) {
        (EventClass::Write, None) => Ok(vec![window.writes_only()]),
        (EventClass::Write, Some(tag)) => {
            let resources = tagged_resources(search, tag).await?;
            eprintln!(
                "Found {} tagged {}",
                count_of(resources.len(), "resource"),
                tag
            );
            Ok(resources
                .into_iter()
                .map(|resource| window.clone().writes_only().for_resource(resource.name))
                .collect())
        }
        (EventClass::Forbidden, _) => Ok(vec![window]),
    }
}

/// Look up, filter and print the events of one region. Returns the number
/// of lines written.
pub async fn report_events<C, W>(
    client: &C,
    config: &Config,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    out: &mut W,
) -> Result<usize>
where
    C: EventLookup + TaggedResourceSearch + ?Sized,
    W: Write,
{
    let queries = build_queries(client, config, start, end).await?;
    let mut printed = 0;

    for query in &queries {
        let spinner = PageSpinner::new("Fetching events");
        let events = fetch_all_events_with(client, query, |pages, events| {
            spinner.page(pages, events);
        })
        .await?;
        spinner.finish();

        let fetched = events.len();
        let kept = filter_events(events, &config.ignore, config.class)?;
        debug!(fetched, kept = kept.len(), resource = ?query.resource_name, "filtered events");

        for filtered in &kept {
            if let Some(line) = render_event(filtered, config.render) {
                writeln!(out, "{}", line)?;
                printed += 1;
            }
        }
    }

    out.flush()?;
    Ok(printed)
}
