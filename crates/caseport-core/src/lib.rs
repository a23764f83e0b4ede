//! Caseport core
//!
//! Converts Jira issue exports carrying Zephyr or XRay test steps into the
//! test case import XML format.

pub mod convert;
pub mod document;
pub mod error;
pub mod export;
pub mod extract;
pub mod markup;
pub mod models;
pub mod repair;
pub mod steps;
pub mod storage;
pub mod textile;

pub use convert::{Converter, NoDirectory, UserDirectory};
pub use error::{Error, Result};
pub use export::export_test_cases;
pub use markup::MarkupConverter;
