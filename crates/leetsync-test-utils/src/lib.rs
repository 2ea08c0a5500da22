//! Shared test utilities for the leetsync workspace.
//!
//! This crate is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`git`]: on-disk git repository fixtures and history inspection
//! - [`judge`]: [`judge::FakeJudge`], an in-memory judge with failure injection

pub mod git;
pub mod judge;
