//! Permission denied event history.
//!
//! Lists calls that were rejected with `Client.UnauthorizedOperation`, read
//! and write alike. Defaults to the last five minutes, since the usual
//! question is "what just failed".
//!
//! # Usage
//!
//! ```bash
//! cloudtrailctl -c my-cluster permission-denied-history
//! cloudtrailctl --direct permission-denied-history --since 1h --raw
//! ```

use anyhow::Result;

use crate::commands::history;
use crate::config::{AccessArgs, Config, HistoryArgs};

/// Run permission-denied-history
pub async fn run(access: &AccessArgs, args: &HistoryArgs) -> Result<()> {
    let config = Config::permission_denied_history(access, args)?;
    history::run(&config).await
}
