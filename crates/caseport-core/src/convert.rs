//! Issue to test case conversion

use crate::document::{Document, Issue};
use crate::models::{Settings, TestCase};
use crate::{extract, repair, steps, Result};

/// Resolves a source username to the account key of the target system
#[allow(async_fn_in_trait)]
pub trait UserDirectory {
    /// `Ok(None)` when the user does not exist
    async fn resolve_owner(&self, username: &str) -> Result<Option<String>>;
}

/// Directory for runs without an owner mapping; resolves nobody
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDirectory;

impl UserDirectory for NoDirectory {
    async fn resolve_owner(&self, _username: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

pub struct Converter<D> {
    settings: Settings,
    directory: D,
}

impl<D: UserDirectory> Converter<D> {
    pub fn new(settings: Settings, directory: D) -> Self {
        Self {
            settings,
            directory,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Repair, parse and convert every issue of a raw export, in document order
    pub async fn convert_document(&self, raw: &str) -> Result<Vec<TestCase>> {
        let repaired = repair::repair(raw);
        let document = match Document::parse(&repaired) {
            Ok(document) => document,
            Err(e) => {
                tracing::error!("Failed to parse repaired export: {}", e);
                tracing::debug!(document = %repaired, "Repaired export content");
                return Err(e);
            }
        };

        let issues = document.issues()?;
        if issues.is_empty() {
            tracing::warn!("Export contains no issues");
        }

        let mut test_cases = Vec::with_capacity(issues.len());
        for issue in &issues {
            match self.convert_issue(issue).await {
                Ok(test_case) => test_cases.push(test_case),
                Err(e) => {
                    tracing::error!(
                        "Error converting test case: {}",
                        issue.summary().unwrap_or_default()
                    );
                    return Err(e);
                }
            }
        }

        Ok(test_cases)
    }

    pub async fn convert_issue(&self, issue: &Issue<'_>) -> Result<TestCase> {
        let mappings = &self.settings.mappings;

        let mut test_case = TestCase::new(
            extract::name(issue),
            extract::custom_fields(issue, mappings)?,
        );
        test_case.objective = extract::objective(issue, self.settings.decode_issue_description);
        test_case.precondition = extract::precondition(issue, mappings)?;
        test_case.status = extract::status(issue);
        test_case.priority = extract::priority(issue, mappings);
        test_case.labels = extract::labels(issue);
        test_case.owner = self.resolve_owner(issue).await?;
        test_case.component = extract::component(issue);
        test_case.issues = extract::issue_links(issue);

        if mappings.plain_text_script_field_id().is_some() {
            if let Some(script) = extract::plain_text_script(issue, mappings)? {
                test_case.set_plain_script(script);
            }
            return Ok(test_case);
        }

        if let Some((dialect, steps)) = steps::extract_steps(issue, &mappings.ignored_custom_fields()) {
            tracing::debug!(
                "{} {:?} steps on {}",
                steps.len(),
                dialect,
                test_case.name.as_deref().unwrap_or_default()
            );
            for step in steps {
                test_case.add_step(step.description, step.test_data, step.expected_result);
            }
        }

        Ok(test_case)
    }

    async fn resolve_owner(&self, issue: &Issue<'_>) -> Result<Option<String>> {
        match extract::owner_username(issue, &self.settings.mappings)? {
            Some(username) => self.directory.resolve_owner(&username).await,
            None => Ok(None),
        }
    }
}
