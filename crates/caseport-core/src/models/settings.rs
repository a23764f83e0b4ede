//! Conversion settings

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub mappings: Mappings,
    pub convert_wiki_markup: bool,
    pub decode_issue_description: bool,
    pub jira_server_settings: JiraServerSettings,
}

/// Which source fields feed which test case attributes.
///
/// Field IDs are the numeric part of `customfield_<id>`. Blank strings mean
/// "not configured".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Mappings {
    pub precondition: Option<String>,
    pub plain_text_test_script_field_id: Option<String>,
    /// Element name of the user field whose `username` attribute becomes the owner
    pub owner: Option<String>,
    pub priority: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct JiraServerSettings {
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Settings {
    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        self.mappings.validate()?;
        self.jira_server_settings.validate()?;
        Ok(())
    }
}

impl Mappings {
    /// Validate field mappings
    pub fn validate(&self) -> Result<()> {
        for (label, id) in [
            ("precondition", self.precondition_field_id()),
            ("plainTextTestScriptFieldId", self.plain_text_script_field_id()),
        ] {
            if let Some(id) = id {
                if id.contains(char::is_whitespace) {
                    return Err(Error::Config(format!(
                        "Invalid custom field ID '{}' for {}",
                        id, label
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn precondition_field_id(&self) -> Option<&str> {
        configured(&self.precondition)
    }

    pub fn plain_text_script_field_id(&self) -> Option<&str> {
        configured(&self.plain_text_test_script_field_id)
    }

    pub fn owner_field(&self) -> Option<&str> {
        configured(&self.owner)
    }

    /// Custom field element IDs consumed outside the generic custom field pass
    pub fn ignored_custom_fields(&self) -> Vec<String> {
        [self.precondition_field_id(), self.plain_text_script_field_id()]
            .into_iter()
            .flatten()
            .map(custom_field_element_id)
            .collect()
    }

    /// Map a source priority through the configured table; unmapped values pass through
    pub fn map_priority(&self, priority: String) -> String {
        match self.priority.get(&priority) {
            Some(mapped) => mapped.clone(),
            None => priority,
        }
    }
}

impl JiraServerSettings {
    /// Validate Jira server settings
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = self.base_url() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::Config(
                    "Jira URL must start with http:// or https://".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn base_url(&self) -> Option<&str> {
        configured(&self.url).map(|url| url.trim_end_matches('/'))
    }

    pub fn user(&self) -> Option<&str> {
        configured(&self.user)
    }

    pub fn password(&self) -> Option<&str> {
        configured(&self.password)
    }
}

/// `10100` becomes `customfield_10100`
pub fn custom_field_element_id(id: &str) -> String {
    format!("customfield_{}", id)
}

fn configured(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(!settings.convert_wiki_markup);
        assert!(settings.mappings.owner_field().is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "mappings": {
                "precondition": "10100",
                "plainTextTestScriptFieldId": "",
                "owner": "assignee",
                "priority": { "Blocker": "Highest" }
            },
            "convertWikiMarkup": true,
            "jiraServerSettings": { "url": "https://jira.example.com/", "user": "bot" }
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();

        assert!(settings.convert_wiki_markup);
        assert!(!settings.decode_issue_description);
        assert_eq!(settings.mappings.precondition_field_id(), Some("10100"));
        assert!(settings.mappings.plain_text_script_field_id().is_none());
        assert_eq!(settings.mappings.owner_field(), Some("assignee"));
        assert_eq!(
            settings.jira_server_settings.base_url(),
            Some("https://jira.example.com")
        );
        assert!(settings.jira_server_settings.password().is_none());
    }

    #[test]
    fn test_priority_mapping() {
        let mut mappings = Mappings::default();
        mappings
            .priority
            .insert("Blocker".to_string(), "Highest".to_string());

        assert_eq!(mappings.map_priority("Blocker".to_string()), "Highest");
        assert_eq!(mappings.map_priority("Trivial".to_string()), "Trivial");
    }

    #[test]
    fn test_ignored_custom_fields() {
        let mappings = Mappings {
            precondition: Some("10100".to_string()),
            plain_text_test_script_field_id: Some(" 10200 ".to_string()),
            ..Mappings::default()
        };
        assert_eq!(
            mappings.ignored_custom_fields(),
            vec!["customfield_10100", "customfield_10200"]
        );
    }

    #[test]
    fn test_jira_url_validation() {
        let mut settings = JiraServerSettings::default();
        assert!(settings.validate().is_ok());

        settings.url = Some("jira.example.com".to_string());
        assert!(settings.validate().is_err());

        settings.url = Some("https://jira.example.com".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_field_id() {
        let mappings = Mappings {
            precondition: Some("101 00".to_string()),
            ..Mappings::default()
        };
        assert!(mappings.validate().is_err());
    }
}
