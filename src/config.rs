//! Invocation configuration.
//!
//! The entry point parses flags into the argument structs below and builds a
//! [`Config`] once. Everything downstream only borrows it.

use std::env;

use chrono::Duration;
use clap::Args;

use crate::aws::resources::ResourceTag;
use crate::aws::DEFAULT_REGION;
use crate::cloudtrail::filter::{EventClass, IgnoreList, RenderOptions};
use crate::error::{Error, Result};
use crate::role_chain::ChainRoles;
use crate::utils::time::parse_duration;

pub const DEFAULT_WRITE_SINCE: &str = "24h";
pub const DEFAULT_PERMISSION_DENIED_SINCE: &str = "5m";

/// How to reach the account whose events are reported.
#[derive(Args, Debug, Clone, Default)]
pub struct AccessArgs {
    /// Use your own credentials against the account directly (no jump roles)
    #[arg(short, long, global = true)]
    pub direct: bool,

    /// Cluster ID, external ID or name (required unless --direct)
    #[arg(short, long, global = true)]
    pub cluster_id: Option<String>,

    /// Organisation-wide jump role assumed first
    #[arg(long, global = true, env = "CAD_AWS_CSS_JUMPROLE", hide_env_values = true)]
    pub jump_role_arn: Option<String>,

    /// Support role assumed from the jump role
    #[arg(long, global = true, env = "CAD_AWS_SUPPORT_JUMPROLE", hide_env_values = true)]
    pub support_role_arn: Option<String>,

    /// Cluster-management API URL (default: $OCM_URL or https://api.openshift.com)
    #[arg(long, global = true)]
    pub ocm_url: Option<String>,
}

/// Flags shared by every history command.
#[derive(Args, Debug, Clone, Default)]
pub struct HistoryArgs {
    /// How far back to look. Valid units are 'ns', 'us' (or 'µs'), 'ms', 's', 'm', 'h'
    #[arg(short, long)]
    pub since: Option<String>,

    /// Region to check (default: cluster region, $AWS_DEFAULT_REGION or us-east-1)
    #[arg(long)]
    pub region: Option<String>,

    /// Show events in raw format
    #[arg(short, long)]
    pub raw: bool,

    /// Regular expressions for users whose events are excluded, comma separated
    #[arg(short, long, default_value = "")]
    pub ignore_users: String,

    /// Show event IDs
    #[arg(short = 't', long)]
    pub toggle_event_ids: bool,
}

/// Role-chain settings, present unless running with `--direct`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChainSettings {
    pub cluster_id: String,
    pub roles: ChainRoles,
    pub ocm_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Direct,
    RoleChain(RoleChainSettings),
}

impl Access {
    pub fn from_args(args: &AccessArgs) -> Result<Self> {
        if args.direct {
            return Ok(Self::Direct);
        }

        let cluster_id = non_empty(args.cluster_id.as_deref()).ok_or_else(|| {
            Error::Argument(
                "cluster-id flag is required when the direct flag is not set".to_string(),
            )
        })?;
        let jump_role_arn = non_empty(args.jump_role_arn.as_deref()).ok_or_else(|| {
            Error::Argument(
                "--jump-role-arn or CAD_AWS_CSS_JUMPROLE is required when the direct flag is not set"
                    .to_string(),
            )
        })?;
        let support_role_arn = non_empty(args.support_role_arn.as_deref()).ok_or_else(|| {
            Error::Argument(
                "--support-role-arn or CAD_AWS_SUPPORT_JUMPROLE is required when the direct flag is not set"
                    .to_string(),
            )
        })?;

        Ok(Self::RoleChain(RoleChainSettings {
            cluster_id: cluster_id.to_string(),
            roles: ChainRoles {
                jump_role_arn: jump_role_arn.to_string(),
                support_role_arn: support_role_arn.to_string(),
            },
            ocm_url: args.ocm_url.clone(),
        }))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Everything one history invocation needs.
#[derive(Debug, Clone)]
pub struct Config {
    pub access: Access,
    /// Region given on the command line
    pub region: Option<String>,
    pub since: Duration,
    pub class: EventClass,
    pub ignore: IgnoreList,
    /// Only report events on resources carrying this tag
    pub tag: Option<ResourceTag>,
    pub render: RenderOptions,
}

impl Config {
    pub fn write_history(
        access: &AccessArgs,
        history: &HistoryArgs,
        tagged: Option<&str>,
    ) -> Result<Self> {
        let tag = tagged.map(str::parse::<ResourceTag>).transpose()?;
        Self::build(access, history, EventClass::Write, DEFAULT_WRITE_SINCE, tag)
    }

    pub fn permission_denied_history(access: &AccessArgs, history: &HistoryArgs) -> Result<Self> {
        Self::build(
            access,
            history,
            EventClass::Forbidden,
            DEFAULT_PERMISSION_DENIED_SINCE,
            None,
        )
    }

    fn build(
        access: &AccessArgs,
        history: &HistoryArgs,
        class: EventClass,
        default_since: &str,
        tag: Option<ResourceTag>,
    ) -> Result<Self> {
        let access = Access::from_args(access)?;
        let since = parse_duration(history.since.as_deref().unwrap_or(default_since))?;
        let ignore = IgnoreList::from_flag(&history.ignore_users)?;

        Ok(Self {
            access,
            region: non_empty(history.region.as_deref()).map(str::to_string),
            since,
            class,
            ignore,
            tag,
            render: RenderOptions {
                raw: history.raw,
                show_event_ids: history.toggle_event_ids,
            },
        })
    }

    /// Region for direct access: the flag, then `AWS_DEFAULT_REGION`, then
    /// [`DEFAULT_REGION`].
    pub fn direct_region(&self) -> String {
        resolve_region(
            self.region.as_deref(),
            env::var("AWS_DEFAULT_REGION").ok().as_deref(),
        )
    }
}

pub fn resolve_region(explicit: Option<&str>, configured: Option<&str>) -> String {
    non_empty(explicit)
        .or_else(|| non_empty(configured))
        .unwrap_or(DEFAULT_REGION)
        .to_string()
}
