//! Command implementations.
//!
//! - [`write_history`] - Non-read-only events, optionally scoped to tagged resources
//! - [`permission_denied_history`] - Events rejected with `Client.UnauthorizedOperation`
//! - [`history`] - Access, region passes and reporting shared by both
//!
//! Every command receives its parsed flags from `main` and returns
//! `anyhow::Result<()>`. Status lines go to stderr and event lines to stdout,
//! so the output can be piped.

pub mod history;
pub mod permission_denied_history;
pub mod write_history;
