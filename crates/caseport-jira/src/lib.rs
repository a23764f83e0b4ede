//! Caseport Jira integration
//!
//! Resolves usernames to Jira account keys for the test case owner.

pub mod auth;
pub mod client;
pub mod error;
pub mod types;

pub use client::JiraClient;
pub use error::{Error, Result};
pub use types::*;
