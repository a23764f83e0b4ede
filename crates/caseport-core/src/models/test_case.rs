//! Test case data model

use crate::models::CustomField;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    /// Issue summary; absent when the summary is blank
    pub name: Option<String>,
    pub objective: Option<String>,
    pub precondition: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub labels: Vec<String>,
    pub owner: Option<String>,
    pub component: Option<String>,
    pub issues: IndexSet<String>,
    pub custom_fields: Vec<CustomField>,
    pub script: TestScript,
}

/// How the test procedure is recorded: structured steps or one free-text script.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TestScript {
    Steps { steps: Vec<Step> },
    Plain { details: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    pub index: usize,
    pub description: Option<String>,
    pub test_data: Option<String>,
    pub expected_result: Option<String>,
}

impl TestCase {
    /// Create a test case with an empty step list.
    ///
    /// Custom fields without a value are dropped here so the rest of the
    /// pipeline never sees them.
    pub fn new(name: Option<String>, custom_fields: Vec<CustomField>) -> Self {
        Self {
            name,
            objective: None,
            precondition: None,
            status: None,
            priority: None,
            labels: Vec::new(),
            owner: None,
            component: None,
            issues: IndexSet::new(),
            custom_fields: custom_fields
                .into_iter()
                .filter(|field| !field.value.trim().is_empty())
                .collect(),
            script: TestScript::Steps { steps: Vec::new() },
        }
    }

    /// Append a step, numbering it after the steps already present.
    ///
    /// Does nothing when the test case carries a plain-text script.
    pub fn add_step(
        &mut self,
        description: Option<String>,
        test_data: Option<String>,
        expected_result: Option<String>,
    ) {
        if let TestScript::Steps { steps } = &mut self.script {
            steps.push(Step {
                index: steps.len(),
                description,
                test_data,
                expected_result,
            });
        }
    }

    /// Replace the script with a plain-text one, discarding any steps.
    pub fn set_plain_script(&mut self, details: String) {
        self.script = TestScript::Plain { details };
    }

    pub fn steps(&self) -> &[Step] {
        match &self.script {
            TestScript::Steps { steps } => steps,
            TestScript::Plain { .. } => &[],
        }
    }

    pub fn plain_script(&self) -> Option<&str> {
        match &self.script {
            TestScript::Plain { details } => Some(details),
            TestScript::Steps { .. } => None,
        }
    }

    pub fn custom_field(&self, name: &str) -> Option<&CustomField> {
        self.custom_fields.iter().find(|field| field.name == name)
    }
}
