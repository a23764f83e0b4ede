//! Jira REST client for user lookups

use crate::auth::JiraAuth;
use crate::types::JiraUser;
use crate::{Error, Result};
use caseport_core::models::JiraServerSettings;
use caseport_core::UserDirectory;
use reqwest::{StatusCode, Url};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

const USER_SEARCH_PATH: &str = "/rest/api/2/user/search";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct JiraClient {
    base_url: Option<String>,
    auth: Option<JiraAuth>,
    http: reqwest::Client,
    /// Search results by request URL. Lives for one conversion run: unbounded
    /// and never evicted, so a long-lived client would need capacity or TTL limits.
    cache: Mutex<HashMap<String, Vec<JiraUser>>>,
}

impl JiraClient {
    pub fn new(base_url: Option<String>, auth: Option<JiraAuth>) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
            auth,
            http,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn from_settings(settings: &JiraServerSettings) -> Result<Self> {
        Self::new(
            settings.base_url().map(str::to_string),
            JiraAuth::from_settings(settings)?,
        )
    }

    pub fn has_credentials(&self) -> bool {
        self.auth.is_some()
    }

    /// First user matching `username`, active or not.
    ///
    /// Blank usernames and unknown users yield `None`; a blank username never
    /// reaches the server.
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<JiraUser>> {
        let username = username.trim();
        if username.is_empty() {
            return Ok(None);
        }

        match self.search_users(username).await {
            Ok(users) => Ok(users.into_iter().next()),
            Err(Error::NotFound(_)) => {
                tracing::warn!("Username {} was not found", username);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn search_users(&self, username: &str) -> Result<Vec<JiraUser>> {
        let url = self.search_url(username)?;

        if let Some(users) = self.cache.lock().await.get(url.as_str()) {
            tracing::debug!("User search cache hit for {}", username);
            return Ok(users.clone());
        }

        let mut request = self.http.get(url.clone());
        if let Some(auth) = &self.auth {
            request = request.header("Authorization", auth.to_basic_auth());
        }

        let response = request.send().await.map_err(|source| Error::Request {
            username: username.to_string(),
            source,
        })?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(Error::NotFound(username.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(Error::Auth(
                    "API authentication error. Please, review your credentials.".to_string(),
                ))
            }
            status => {
                return Err(Error::Api(format!(
                    "Error status {} retrieving user {}",
                    status.as_u16(),
                    username
                )))
            }
        }

        let body = response.text().await.map_err(|source| Error::Request {
            username: username.to_string(),
            source,
        })?;
        let users: Vec<JiraUser> = serde_json::from_str(&body)?;

        self.cache
            .lock()
            .await
            .insert(url.to_string(), users.clone());
        Ok(users)
    }

    fn search_url(&self, username: &str) -> Result<Url> {
        let base_url = self.base_url.as_deref().ok_or_else(|| {
            Error::Config("A URL to connect with the Jira API has not been provided.".to_string())
        })?;

        Url::parse_with_params(
            &format!("{}{}", base_url, USER_SEARCH_PATH),
            &[("includeInactive", "true"), ("username", username)],
        )
        .map_err(|e| Error::Config(format!("Invalid Jira URL {}: {}", base_url, e)))
    }
}

impl UserDirectory for JiraClient {
    async fn resolve_owner(&self, username: &str) -> caseport_core::Result<Option<String>> {
        let user = self.get_user_by_username(username).await?;
        Ok(user.and_then(|user| user.key))
    }
}
