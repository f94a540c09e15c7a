//! Crowd REST usermanagement v1 adapter.
//!
//! Pure transport: each method performs one logical remote operation and
//! translates transport/status outcomes into the connector error taxonomy.
//! The client authenticates itself with the application name/password on
//! every request.

use std::collections::HashSet;

use anyhow::{Context, Result};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DirectoryClient, SearchCriteria, UserRecord};
use crate::config::DirectoryConfig;
use crate::error::{DirectoryError, DirectoryResult};

const API_ROOT: &str = "rest/usermanagement/1/";

pub struct RestDirectoryClient {
    base: Url,
    http: reqwest::Client,
    application_name: String,
    application_password: String,
}

// --- wire shapes -----------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NamedEntity {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct GroupList {
    #[serde(default)]
    groups: Vec<NamedEntity>,
}

#[derive(Debug, Default, Deserialize)]
struct UserList {
    #[serde(default)]
    users: Vec<WireUser>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    name: String,
    #[serde(rename = "first-name", default)]
    first_name: Option<String>,
    #[serde(rename = "last-name", default)]
    last_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    active: bool,
}

impl From<WireUser> for UserRecord {
    fn from(w: WireUser) -> Self {
        UserRecord {
            username: w.name,
            first_name: w.first_name,
            last_name: w.last_name,
            email: w.email,
            active: w.active,
        }
    }
}

#[derive(Debug, Serialize)]
struct PasswordValue<'a> {
    value: &'a str,
}

// --- client ----------------------------------------------------------------

impl RestDirectoryClient {
    pub fn new(cfg: &DirectoryConfig) -> Result<Self> {
        let raw = cfg.base_url.as_deref().context("directory base URL not configured")?;
        // Url::join treats a missing trailing slash as a file component.
        let normalized = if raw.ends_with('/') { raw.to_string() } else { format!("{raw}/") };
        let base = Url::parse(&normalized).context("invalid directory base URL")?;
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            base,
            http,
            application_name: cfg.application_name.clone(),
            application_password: cfg.application_password.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> DirectoryResult<Url> {
        self.base
            .join(&format!("{API_ROOT}{path}"))
            .map_err(|e| DirectoryError::unavailable(format!("bad endpoint '{path}': {e}")))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(&self.application_name, Some(&self.application_password))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: Url) -> DirectoryResult<T> {
        let resp = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(transport_error)?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            // Caller maps this onto the entity it was looking up.
            return Err(DirectoryError::user_not_found(""));
        }
        if !status.is_success() {
            return Err(DirectoryError::unavailable(format!("directory returned HTTP {status}")));
        }
        resp.json::<T>()
            .await
            .map_err(|e| DirectoryError::unavailable(format!("malformed directory response: {e}")))
    }

    async fn group_members(&self, group: &str) -> DirectoryResult<HashSet<String>> {
        let mut url = self.endpoint("group/user/nested")?;
        url.query_pairs_mut()
            .append_pair("groupname", group)
            .append_pair("start-index", "0")
            .append_pair("max-results", "-1");
        match self.get_json::<UserList>(url).await {
            Ok(list) => Ok(list.users.into_iter().map(|u| u.name).collect()),
            // A group that does not exist upstream simply has no members.
            Err(DirectoryError::UserNotFound { .. }) => Ok(HashSet::new()),
            Err(other) => Err(other),
        }
    }

    fn matches(criteria: &SearchCriteria, user: &UserRecord) -> bool {
        let id_ok = criteria
            .user_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .map_or(true, |p| user.username.to_lowercase().contains(&p.to_lowercase()));
        let email_ok = criteria
            .email
            .as_deref()
            .filter(|p| !p.is_empty())
            .map_or(true, |p| {
                user.email.as_deref().unwrap_or("").to_lowercase().contains(&p.to_lowercase())
            });
        id_ok && email_ok
    }
}

#[async_trait::async_trait]
impl DirectoryClient for RestDirectoryClient {
    async fn authenticate(&self, username: &str, password: &str) -> DirectoryResult<()> {
        let mut url = self.endpoint("authentication")?;
        url.query_pairs_mut().append_pair("username", username);
        let resp = self
            .request(reqwest::Method::POST, url)
            .json(&PasswordValue { value: password })
            .send()
            .await
            .map_err(transport_error)?;
        let status = resp.status();
        if status.is_success() {
            debug!(username, "remote authentication accepted");
            return Ok(());
        }
        // Crowd answers 400 INVALID_USER_AUTHENTICATION for a bad password and
        // 404 for an unknown user; both are a definitive rejection. Anything
        // else means the directory itself misbehaved.
        if status.is_client_error() {
            debug!(username, %status, "remote authentication rejected");
            Err(DirectoryError::invalid_credentials(username))
        } else {
            Err(DirectoryError::unavailable(format!("authentication returned HTTP {status}")))
        }
    }

    async fn nested_groups(&self, username: &str) -> DirectoryResult<HashSet<String>> {
        let mut url = self.endpoint("user/group/nested")?;
        url.query_pairs_mut()
            .append_pair("username", username)
            .append_pair("start-index", "0")
            .append_pair("max-results", "-1");
        let list: GroupList = self.get_json(url).await.map_err(|e| match e {
            // 404 here means the user itself is gone upstream.
            DirectoryError::UserNotFound { .. } => DirectoryError::user_not_found(username),
            other => other,
        })?;
        Ok(list.groups.into_iter().map(|g| g.name).collect())
    }

    async fn get_user(&self, username: &str) -> DirectoryResult<UserRecord> {
        let mut url = self.endpoint("user")?;
        url.query_pairs_mut().append_pair("username", username);
        let user: WireUser = self.get_json(url).await.map_err(|e| match e {
            DirectoryError::UserNotFound { .. } => DirectoryError::user_not_found(username),
            other => other,
        })?;
        Ok(user.into())
    }

    async fn search_users(
        &self,
        criteria: &SearchCriteria,
        max_results: usize,
    ) -> DirectoryResult<Vec<UserRecord>> {
        if criteria.roles.is_empty() {
            // No role filter: one expanded search call, pattern-filter locally,
            // bound the result.
            let mut url = self.endpoint("search")?;
            url.query_pairs_mut()
                .append_pair("entity-type", "user")
                .append_pair("expand", "user")
                .append_pair("start-index", "0")
                .append_pair("max-results", "-1");
            let list: UserList = self.get_json(url).await?;
            let mut out: Vec<UserRecord> = list
                .users
                .into_iter()
                .map(UserRecord::from)
                .filter(|u| Self::matches(criteria, u))
                .collect();
            out.truncate(max_results);
            return Ok(out);
        }

        // Role filter: the search endpoint cannot restrict by group, so expand
        // nested membership of each filtered group and look the members up.
        let mut members: HashSet<String> = HashSet::new();
        for role in &criteria.roles {
            members.extend(self.group_members(role).await?);
        }
        let mut names: Vec<String> = members.into_iter().collect();
        names.sort();
        let mut out = Vec::new();
        for name in names {
            if out.len() >= max_results {
                break;
            }
            match self.get_user(&name).await {
                Ok(user) => {
                    if Self::matches(criteria, &user) {
                        out.push(user);
                    }
                }
                // Membership lists can lag user deletion.
                Err(DirectoryError::UserNotFound { .. }) => continue,
                Err(other) => return Err(other),
            }
        }
        Ok(out)
    }

    async fn list_usernames(&self) -> DirectoryResult<HashSet<String>> {
        let mut url = self.endpoint("search")?;
        url.query_pairs_mut()
            .append_pair("entity-type", "user")
            .append_pair("start-index", "0")
            .append_pair("max-results", "-1");
        let list: UserList = self.get_json(url).await?;
        Ok(list.users.into_iter().map(|u| u.name).collect())
    }
}

fn transport_error(e: reqwest::Error) -> DirectoryError {
    let reason = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    };
    DirectoryError::unavailable(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(url: &str) -> DirectoryConfig {
        DirectoryConfig {
            base_url: Some(url.to_string()),
            application_name: "app".into(),
            application_password: "secret".into(),
            ..Default::default()
        }
    }

    #[test]
    fn base_url_normalized_with_trailing_slash() {
        let client = RestDirectoryClient::new(&configured("http://crowd.local/crowd")).unwrap();
        let url = client.endpoint("authentication").unwrap();
        assert_eq!(url.as_str(), "http://crowd.local/crowd/rest/usermanagement/1/authentication");
    }

    #[test]
    fn unconfigured_base_url_is_a_wiring_error() {
        assert!(RestDirectoryClient::new(&DirectoryConfig::default()).is_err());
        assert!(RestDirectoryClient::new(&configured("not a url")).is_err());
    }

    #[test]
    fn pattern_matching_is_case_insensitive_and_empty_matches_all() {
        let user = UserRecord {
            username: "Alice".into(),
            email: Some("alice@example.com".into()),
            ..Default::default()
        };
        let all = SearchCriteria::default();
        assert!(RestDirectoryClient::matches(&all, &user));
        let by_id = SearchCriteria { user_id: Some("ali".into()), ..Default::default() };
        assert!(RestDirectoryClient::matches(&by_id, &user));
        let by_email = SearchCriteria { email: Some("EXAMPLE".into()), ..Default::default() };
        assert!(RestDirectoryClient::matches(&by_email, &user));
        let miss = SearchCriteria { user_id: Some("bob".into()), ..Default::default() };
        assert!(!RestDirectoryClient::matches(&miss, &user));
    }
}
