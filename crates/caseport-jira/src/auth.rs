//! Jira authentication

use crate::Result;
use caseport_core::models::JiraServerSettings;

/// Keyring service holding Jira passwords, one entry per user
pub const KEYRING_SERVICE: &str = "caseport";

#[derive(Debug, Clone)]
pub struct JiraAuth {
    username: String,
    password: String,
}

impl JiraAuth {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }

    /// Credentials from the settings file, falling back to the OS keyring
    /// when the password is blank. `None` without a configured user.
    pub fn from_settings(settings: &JiraServerSettings) -> Result<Option<Self>> {
        Self::from_settings_with(settings, keyring_password)
    }

    /// Same as [`JiraAuth::from_settings`] with `stored_password` in place of
    /// the OS keyring. It is only called for a configured user without a password.
    pub fn from_settings_with<F>(settings: &JiraServerSettings, stored_password: F) -> Result<Option<Self>>
    where
        F: FnOnce(&str) -> Result<Option<String>>,
    {
        let Some(user) = settings.user() else {
            return Ok(None);
        };

        let password = match settings.password() {
            Some(password) => password.to_string(),
            None => match stored_password(user)? {
                Some(password) => password,
                None => {
                    tracing::warn!("No Jira password configured for {}", user);
                    String::new()
                }
            },
        };

        Ok(Some(Self::new(user.to_string(), password)))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn to_basic_auth(&self) -> String {
        use base64::Engine;
        let credentials = format!("{}:{}", self.username, self.password);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(credentials)
        )
    }
}

fn keyring_password(user: &str) -> Result<Option<String>> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, user)?;
    match entry.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
