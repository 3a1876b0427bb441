//! Back-office session: login against the external auth API, token
//! persistence and role-based access scope.
//!
//! The token is the only state persisted between runs. It lives in the
//! credential store under [`KEY_AUTH_TOKEN`] and in memory only as
//! `Zeroizing<String>`, so it is wiped when dropped.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::storage::{CredentialStore, KEY_API_URL, KEY_AUTH_TOKEN};

const LOGIN_PATH: &str = "/auth/login";
const LOGOUT_PATH: &str = "/auth/logout";
const ME_PATH: &str = "/auth/me";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Owner,
    Manager,
    KitchenStaff,
    Waiter,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Admins and owners see every restaurant.
    pub fn is_unrestricted(self) -> bool {
        matches!(self, Role::Admin | Role::Owner)
    }
}

/// The signed-in user as returned by `/auth/me`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub restaurant_id: String,
    pub branch_id: String,
    pub permissions: BTreeSet<String>,
}

/// How far the selector chain may roam for this user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    Unrestricted,
    Restaurant { restaurant_id: String },
    Branch { restaurant_id: String, branch_id: String },
}

impl UserProfile {
    pub fn access_scope(&self) -> AccessScope {
        if self.role.is_unrestricted() || self.restaurant_id.is_empty() {
            return AccessScope::Unrestricted;
        }
        if self.branch_id.is_empty() {
            AccessScope::Restaurant {
                restaurant_id: self.restaurant_id.clone(),
            }
        } else {
            AccessScope::Branch {
                restaurant_id: self.restaurant_id.clone(),
                branch_id: self.branch_id.clone(),
            }
        }
    }

    pub fn can(&self, permission: &str) -> bool {
        self.role.is_unrestricted() || self.permissions.contains(permission)
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    #[serde(default)]
    user: Option<UserProfile>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingCredentials,
    #[error("The server did not return a session token")]
    NoToken,
    #[error("Could not save the session: {0}")]
    Storage(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Token helpers
// ---------------------------------------------------------------------------

/// Expiry (`exp` claim) of a JWT. Opaque tokens have none.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    DateTime::from_timestamp(exp, 0)
}

pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    token_expiry(token).is_some_and(|exp| exp <= now)
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session {
    client: ApiClient,
    store: Arc<dyn CredentialStore>,
    profile: Option<UserProfile>,
}

impl Session {
    pub fn new(client: ApiClient, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            client,
            store,
            profile: None,
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<&UserProfile, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let response: Option<LoginResponse> = self
            .client
            .post(LOGIN_PATH, &LoginRequest { email, password })
            .await?;
        let response = response.ok_or(AuthError::NoToken)?;
        let token = Zeroizing::new(response.token);
        if token.trim().is_empty() {
            return Err(AuthError::NoToken);
        }

        self.store
            .set(KEY_AUTH_TOKEN, &token)
            .map_err(AuthError::Storage)?;
        if let Err(e) = self.store.set(KEY_API_URL, self.client.base_url()) {
            warn!(error = %e, "could not remember API URL");
        }
        self.client.set_token(token);

        let profile = match response.user {
            Some(user) => user,
            None => self.fetch_profile().await?,
        };
        info!(user = %profile.id, role = ?profile.role, "signed in");
        Ok(self.profile.insert(profile))
    }

    /// Resume a saved session. Expired or rejected tokens are discarded and
    /// yield `Ok(None)`; connectivity errors keep the token for a retry.
    pub async fn restore(&mut self) -> Result<Option<&UserProfile>, AuthError> {
        let Some(token) = self.store.get(KEY_AUTH_TOKEN) else {
            debug!("no saved session");
            return Ok(None);
        };
        if is_expired(&token, Utc::now()) {
            info!("saved session expired");
            self.discard_token();
            return Ok(None);
        }

        self.client.set_token(token);
        match self.fetch_profile().await {
            Ok(profile) => {
                info!(user = %profile.id, "session restored");
                Ok(Some(self.profile.insert(profile)))
            }
            Err(err) if err.is_unauthorized() => {
                info!("saved session rejected by server");
                self.discard_token();
                Ok(None)
            }
            Err(err) => {
                self.client.clear_token();
                Err(AuthError::Api(err))
            }
        }
    }

    async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.client
            .get_one::<UserProfile>(ME_PATH, &[])
            .await?
            .ok_or_else(|| ApiError::Unauthorized { message: None })
    }

    /// Best-effort server logout; the local token is always removed.
    pub async fn logout(&mut self) {
        if self.client.has_token() {
            let result: Result<Option<serde_json::Value>, ApiError> =
                self.client.post(LOGOUT_PATH, &serde_json::json!({})).await;
            if let Err(err) = result {
                warn!(error = %err, "server logout failed, clearing local session anyway");
            }
        }
        self.discard_token();
        self.profile = None;
        info!("signed out");
    }

    fn discard_token(&self) {
        self.client.clear_token();
        if let Err(e) = self.store.delete(KEY_AUTH_TOKEN) {
            warn!(error = %e, "could not delete saved token");
        }
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile.is_some() && self.client.has_token()
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::from_wire;
    use crate::storage::MemoryStore;
    use chrono::Duration;
    use std::time::Duration as StdDuration;

    fn jwt(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u1","exp":{exp}}}"#));
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn jwt_expiry_is_read_from_payload() {
        let now = Utc::now();
        let past = jwt((now - Duration::hours(1)).timestamp());
        let future = jwt((now + Duration::hours(1)).timestamp());
        assert!(is_expired(&past, now));
        assert!(!is_expired(&future, now));
        assert!(!is_expired("opaque-token", now));
        assert_eq!(token_expiry("a.!!!.c"), None);
    }

    #[test]
    fn access_scope_follows_role_and_assignment() {
        let admin = UserProfile {
            role: Role::Admin,
            restaurant_id: "r1".into(),
            branch_id: "b1".into(),
            ..UserProfile::default()
        };
        assert_eq!(admin.access_scope(), AccessScope::Unrestricted);
        assert!(admin.can("manage_staff"));

        let manager = UserProfile {
            role: Role::Manager,
            restaurant_id: "r1".into(),
            branch_id: "b1".into(),
            permissions: ["view_orders".to_string()].into_iter().collect(),
            ..UserProfile::default()
        };
        assert_eq!(
            manager.access_scope(),
            AccessScope::Branch {
                restaurant_id: "r1".into(),
                branch_id: "b1".into()
            }
        );
        assert!(manager.can("view_orders"));
        assert!(!manager.can("manage_staff"));
    }

    #[test]
    fn unknown_roles_decode() {
        let user: UserProfile = from_wire(serde_json::json!({
            "_id": "u1",
            "role": "SUPERVISOR",
            "branch": "b9"
        }))
        .expect("decode");
        assert_eq!(user.id, "u1");
        assert_eq!(user.role, Role::Unknown);
        assert_eq!(user.branch_id, "b9");
    }

    #[test]
    fn profile_with_both_id_spellings_and_populated_scope_decodes() {
        let user: UserProfile = from_wire(serde_json::json!({
            "_id": "u1",
            "id": "u1",
            "role": "MANAGER",
            "restaurantId": "r1",
            "restaurant": {"_id": "r1", "name": "Luigi's"},
            "branch": {"_id": "b2", "name": "Harbor"}
        }))
        .expect("decode");
        assert_eq!(user.id, "u1");
        assert_eq!(user.restaurant_id, "r1");
        assert_eq!(user.branch_id, "b2");
    }

    #[tokio::test]
    async fn expired_saved_token_is_discarded_without_a_request() {
        let store = Arc::new(MemoryStore::default());
        store
            .set(KEY_AUTH_TOKEN, &jwt((Utc::now() - Duration::minutes(5)).timestamp()))
            .expect("seed");
        // Nothing listens here; a request would fail the test.
        let client = ApiClient::new("http://127.0.0.1:9", StdDuration::from_millis(200)).expect("client");
        let mut session = Session::new(client, store.clone());

        assert!(session.restore().await.expect("restore").is_none());
        assert!(store.get(KEY_AUTH_TOKEN).is_none());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn empty_credentials_are_rejected_locally() {
        let client = ApiClient::new("http://127.0.0.1:9", StdDuration::from_millis(200)).expect("client");
        let mut session = Session::new(client, Arc::new(MemoryStore::default()));
        assert!(matches!(
            session.login("  ", "secret").await,
            Err(AuthError::MissingCredentials)
        ));
    }
}
