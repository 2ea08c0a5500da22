//! Command implementations for leetsync-cli

pub mod marker;
pub mod sync;

pub use marker::run_marker;
pub use sync::run_sync;

use leetsync_core::{Config, Target};
use leetsync_git::{GithubStore, LocalStore, RepositoryStore};
use leetsync_judge::LeetCodeClient;

use crate::error::Result;

/// Open the repository the configuration points at.
pub(crate) fn open_store(config: &Config) -> Result<Box<dyn RepositoryStore>> {
    match &config.target {
        Target::Github { repository, token } => Ok(Box::new(GithubStore::new(token, repository)?)),
        Target::Local { path } => Ok(Box::new(
            LocalStore::open(path)?.with_author(&config.author.name, &config.author.email),
        )),
    }
}

pub(crate) fn judge_client(config: &Config) -> Result<LeetCodeClient> {
    let (session, csrf_token) = config.judge.require()?;
    Ok(LeetCodeClient::new(session, csrf_token)?)
}
