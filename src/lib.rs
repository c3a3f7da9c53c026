//! # cloudtrailctl
//!
//! Command-line tool for reviewing recent CloudTrail activity in an AWS
//! account, either the caller's own or the account behind a managed cluster.
//!
//! ## Commands
//!
//! - `write-history` - every call that changed something, minus actions AWS
//!   services performed themselves
//! - `permission-denied-history` - every call rejected as unauthorized
//!
//! Both commands look back over a configurable window, hide users matching
//! `--ignore-users` patterns and print one line per event (or the raw event
//! JSON with `--raw`). When the account's region is not us-east-1, a second
//! pass reports the IAM events CloudTrail records there.
//!
//! ## Access
//!
//! With `--direct` the default AWS credential chain is used against the
//! account it belongs to. Otherwise `--cluster-id` names a cluster, and the
//! tool walks the role chain: jump role, support role, then the customer's
//! support role from the cluster's account claim.
//!
//! ## Architecture
//!
//! - [`cloudtrail`] - Event model, identity parsing, filtering and paginated lookup
//! - [`role_chain`] - Ordered role assumptions into a customer account
//! - [`aws`] - SDK-backed lookups, role assumption and tag-scoped resource discovery
//! - [`ocm`] - Cluster-management API client
//! - [`config`] - Flag structs and the resolved invocation [`config::Config`]
//! - [`commands`] - Command implementations
//! - [`error`] - Error type shared by the library modules
//! - [`utils`] - Time, formatting and progress helpers
//!
//! ## Example Usage
//!
//! ```bash
//! cloudtrailctl --direct write-history --since 2h
//! cloudtrailctl -c my-cluster write-history -i 'installer,-operator$'
//! cloudtrailctl -c my-cluster permission-denied-history --raw
//! cloudtrailctl generate-completion zsh > _cloudtrailctl
//! ```
//!
//! The lookup, role-assumption and cluster-search seams are traits
//! ([`cloudtrail::EventLookup`], [`role_chain::RoleAssumer`],
//! [`ocm::ClusterDirectory`], [`aws::resources::TaggedResourceSearch`]), so
//! everything above the SDK calls can be driven by test doubles.

pub mod aws;
pub mod cloudtrail;
pub mod commands;
pub mod config;
pub mod error;
pub mod ocm;
pub mod role_chain;
pub mod utils;

pub use error::{Error, Result};
