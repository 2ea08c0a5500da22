//! Coding-judge query API for leetsync
//!
//! Exposes the three read-only queries the sync engine needs (paginated
//! submission list, per-submission detail, per-problem content) behind the
//! [`JudgeApi`] trait, with a LeetCode GraphQL implementation.

pub mod api;
pub mod error;
pub mod leetcode;
pub mod models;

pub use api::JudgeApi;
pub use error::{Error, Result};
pub use leetcode::LeetCodeClient;
pub use models::{ProblemContent, Submission, SubmissionDetail, SubmissionPage};
