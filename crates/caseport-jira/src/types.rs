//! Jira API types

use serde::{Deserialize, Serialize};

/// One entry of `/rest/api/2/user/search`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct JiraUser {
    /// Account key, e.g. `JIRAUSER10100`
    pub key: Option<String>,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub email_address: Option<String>,
    pub active: Option<bool>,
}
