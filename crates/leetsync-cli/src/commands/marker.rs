//! Marker command implementation

use leetsync_core::{Config, recover_marker};
use leetsync_git::RepositoryStore;

use super::open_store;
use crate::error::Result;

/// Print the marker the next sync would start from.
///
/// Only reads the repository; the judge is never queried.
pub fn run_marker(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let store = store.as_ref();
    let retry = &config.retry;

    let branch = match &config.branch {
        Some(branch) => branch.clone(),
        None => retry.retry("read default branch", || store.default_branch())?,
    };
    let tip = retry.retry("read branch tip", || store.branch_tip(&branch))?;
    let marker = recover_marker(&store, tip.as_ref(), retry)?;

    tracing::debug!(%branch, %marker, "recovered marker");
    println!("{marker}");
    Ok(())
}
