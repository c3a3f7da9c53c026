//! Write event history.
//!
//! Lists every non-read-only call made against the account, leaving out
//! actions AWS services performed on their own behalf.
//!
//! # Usage
//!
//! ```bash
//! # Last 24 hours on a cluster's account, through the role chain
//! cloudtrailctl write-history --cluster-id my-cluster
//!
//! # Own account, last 2 hours, hiding the installer and operator roles
//! cloudtrailctl --direct write-history --since 2h --ignore-users 'installer,-operator$'
//!
//! # Only events on resources tagged for one cluster
//! cloudtrailctl -c my-cluster write-history --tagged kubernetes.io/cluster/my-cluster-x7k2p:owned
//! ```

use anyhow::Result;

use crate::commands::history;
use crate::config::{AccessArgs, Config, HistoryArgs};

/// Run write-history
pub async fn run(access: &AccessArgs, args: &HistoryArgs, tagged: Option<&str>) -> Result<()> {
    let config = Config::write_history(access, args, tagged)?;
    history::run(&config).await
}
