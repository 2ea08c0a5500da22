//! Repository mutation API for leetsync
//!
//! The sync engine never touches a working tree. It layers trees on top of
//! a base tree, creates commits from them and moves a branch reference,
//! all through the [`RepositoryStore`] trait. Two stores are provided:
//!
//! - [`LocalStore`]: object-level access to a local repository via `git2`
//! - [`GithubStore`]: the GitHub git-data REST API

pub mod error;
pub mod github;
pub mod local;
pub mod store;

pub use error::{Error, Result};
pub use github::GithubStore;
pub use local::LocalStore;
pub use store::{BranchTip, CommitRecord, EntryMode, ObjectId, RepositoryStore, TreeEntry};
