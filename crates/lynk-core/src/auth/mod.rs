//! Supabase auth client: the identity gateway for Lynk.
//!
//! Wraps sign-up, sign-in, sign-out, and session restore against the GoTrue
//! REST API, persisting sessions through a [`SessionPersistence`] seam and
//! publishing the current user on a watch channel.

use std::fmt;
use std::sync::Arc;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::profile::ProfileStore;
use crate::util::{normalize_text_option, unix_timestamp_now};

const EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Result of a sign-up attempt.
///
/// Projects with email confirmation enabled issue no session until the user
/// confirms; callers must handle both arms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    ConfirmationRequired,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Auth is not configured for this profile.")]
    NotConfigured,
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Password is too weak: {0}")]
    WeakPassword(String),
    #[error("An account with this email already exists: {0}")]
    DuplicateAccount(String),
    #[error("Email or password is incorrect: {0}")]
    InvalidCredentials(String),
    #[error("No account exists for this email: {0}")]
    AccountNotFound(String),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Persistence seam for sessions (keychain, in-memory, ...).
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

#[derive(Clone)]
pub struct SupabaseAuthClient<S: SessionPersistence> {
    auth_url: String,
    anon_key: String,
    client: Client,
    store: S,
    current_user: Arc<watch::Sender<Option<AuthUser>>>,
}

impl<S: SessionPersistence> SupabaseAuthClient<S> {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>, store: S) -> AuthResult<Self> {
        let auth_url = normalize_auth_url(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Supabase anon key must not be empty",
            ));
        }

        let (current_user, _) = watch::channel(None);
        Ok(Self {
            auth_url,
            anon_key,
            client: Client::builder().build()?,
            store,
            current_user: Arc::new(current_user),
        })
    }

    /// Subscribe to the live current-user stream.
    ///
    /// Yields `Some(user)` after sign-in/sign-up/restore and `None` after
    /// sign-out. The receiver observes every session-state change made
    /// through this client (or any clone of it).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.current_user.subscribe()
    }

    /// The most recently confirmed user, or `None` when signed out.
    #[must_use]
    pub fn current_user(&self) -> Option<AuthUser> {
        self.current_user.borrow().clone()
    }

    /// Restore the persisted session, refreshing it when expired.
    ///
    /// A refresh failure clears the stored session and yields `None` rather
    /// than an error; the user simply has to sign in again.
    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(stored_session) = self.store.load_session()? else {
            self.current_user.send_replace(None);
            return Ok(None);
        };

        if !stored_session.is_expired() {
            self.current_user
                .send_replace(Some(stored_session.user.clone()));
            return Ok(Some(stored_session));
        }

        match self.refresh_session(&stored_session.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(error) => {
                tracing::warn!("Failed to refresh persisted session: {}", error);
                self.store.clear_session()?;
                self.current_user.send_replace(None);
                Ok(None)
            }
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        let request = self.public_request(
            self.client
                .post(format!("{}/signup", self.auth_url))
                .json(&payload),
        );
        let response = self.send_auth_request(request).await?;
        match response.into_session()? {
            Some(session) => {
                self.store.save_session(&session)?;
                self.current_user.send_replace(Some(session.user.clone()));
                Ok(SignUpOutcome::SignedIn(session))
            }
            None => Ok(SignUpOutcome::ConfirmationRequired),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        let request = self.public_request(
            self.client
                .post(format!("{}/token", self.auth_url))
                .query(&[("grant_type", "password")])
                .json(&payload),
        );

        let response = self.send_auth_request(request).await?;
        let session = response.into_session()?.ok_or_else(|| {
            AuthError::Api("Sign-in response did not include an active session".to_string())
        })?;

        self.store.save_session(&session)?;
        self.current_user.send_replace(Some(session.user.clone()));
        Ok(session)
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Refresh token must not be empty",
            ));
        }

        let payload = serde_json::json!({
            "refresh_token": refresh_token,
        });
        let request = self.public_request(
            self.client
                .post(format!("{}/token", self.auth_url))
                .query(&[("grant_type", "refresh_token")])
                .json(&payload),
        );
        let response = self.send_auth_request(request).await?;
        let session = response.into_session()?.ok_or_else(|| {
            AuthError::Api("Refresh response did not include an active session".to_string())
        })?;

        self.store.save_session(&session)?;
        self.current_user.send_replace(Some(session.user.clone()));
        Ok(session)
    }

    /// Revoke the session remotely and clear it locally.
    ///
    /// A token the server already considers invalid (401) still counts as a
    /// successful sign-out; the local session is cleared either way.
    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let request = self
            .client
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token);

        let response = request.send().await?;
        if !(response.status().is_success() || response.status() == StatusCode::UNAUTHORIZED) {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_api_error(status, &body));
        }

        self.store.clear_session()?;
        self.current_user.send_replace(None);
        Ok(())
    }

    fn public_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
    }

    async fn send_auth_request(&self, request: RequestBuilder) -> AuthResult<GoTrueAuthResponse> {
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_api_error(status, &body));
        }
        Ok(response.json::<GoTrueAuthResponse>().await?)
    }
}

/// Sign up and seed the initial profile row for the new account.
///
/// The profile write is not transactional with account creation: when it
/// fails, the account still exists without a profile row. That is a
/// recoverable inconsistency (profile reads tolerate the missing row), so
/// the failure is logged and the sign-up outcome returned regardless.
pub async fn register_account<S: SessionPersistence>(
    auth: &SupabaseAuthClient<S>,
    profiles: &ProfileStore,
    email: &str,
    password: &str,
) -> AuthResult<SignUpOutcome> {
    let outcome = auth.sign_up(email, password).await?;

    if let SignUpOutcome::SignedIn(session) = &outcome {
        if let Err(error) = profiles
            .create_initial(&session.access_token, &session.user.id, email)
            .await
        {
            tracing::warn!("Failed to seed profile for new account: {}", error);
        }
    }

    Ok(outcome)
}

pub fn normalize_auth_url(url: &str) -> AuthResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AuthError::InvalidConfiguration(
            "Supabase URL must not be empty",
        ));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(AuthError::InvalidConfiguration(
            "Supabase URL must include http:// or https://",
        ));
    }
    if trimmed.ends_with("/auth/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/auth/v1"))
    }
}

/// Resolve an optional (url, anon key) pair, requiring both or neither.
pub fn resolve_optional_supabase_config(
    url: Option<String>,
    anon_key: Option<String>,
) -> AuthResult<Option<(String, String)>> {
    let url = normalize_text_option(url);
    let anon_key = normalize_text_option(anon_key);

    match (url, anon_key) {
        (None, None) => Ok(None),
        (Some(url), Some(anon_key)) => Ok(Some((url, anon_key))),
        _ => Err(AuthError::NotConfigured),
    }
}

fn validate_credentials(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() {
        return Err(AuthError::Api("Email is required".to_string()));
    }
    if password.trim().is_empty() {
        return Err(AuthError::Api("Password is required".to_string()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct GoTrueAuthResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<GoTrueUser>,
}

impl GoTrueAuthResponse {
    fn into_session(self) -> AuthResult<Option<AuthSession>> {
        let expires_at = self.expires_at.or_else(|| {
            self.expires_in
                .map(|expires_in| unix_timestamp_now().saturating_add(expires_in))
        });

        match (self.access_token, self.refresh_token, expires_at, self.user) {
            (Some(access_token), Some(refresh_token), Some(expires_at), Some(user)) => {
                Ok(Some(AuthSession {
                    access_token,
                    refresh_token,
                    expires_at,
                    user: user.into(),
                }))
            }
            // A user without session fields means confirmation is pending.
            (None, None, None, Some(_)) => Ok(None),
            _ => Err(AuthError::Api(
                "Auth response did not include enough session fields".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    email: Option<String>,
}

impl From<GoTrueUser> for AuthUser {
    fn from(value: GoTrueUser) -> Self {
        Self {
            id: value.id,
            email: value.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueErrorResponse {
    error_code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    msg: Option<String>,
}

impl GoTrueErrorResponse {
    fn code(&self) -> Option<&str> {
        self.error_code.as_deref().or(self.error.as_deref())
    }

    fn message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
    }
}

/// Map a GoTrue error payload to a classified [`AuthError`].
///
/// Newer GoTrue versions carry a stable `error_code`; older ones only an
/// OAuth-style `error`/`error_description` pair, so the message text is the
/// fallback signal.
pub fn classify_api_error(status: StatusCode, body: &str) -> AuthError {
    let Ok(payload) = serde_json::from_str::<GoTrueErrorResponse>(body) else {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return AuthError::Api(format!("HTTP {}", status.as_u16()));
        }
        return AuthError::Api(format!("{} ({})", trimmed, status.as_u16()));
    };

    let code = payload.code().unwrap_or_default().to_string();
    let message = payload
        .message()
        .map_or_else(|| format!("HTTP {}", status.as_u16()), |m| m.trim().to_string());

    match code.as_str() {
        "weak_password" => AuthError::WeakPassword(message),
        "user_already_exists" | "email_exists" => AuthError::DuplicateAccount(message),
        "invalid_credentials" => AuthError::InvalidCredentials(message),
        "user_not_found" => AuthError::AccountNotFound(message),
        _ => {
            let lowered = message.to_lowercase();
            if lowered.contains("invalid login credentials") {
                AuthError::InvalidCredentials(message)
            } else if lowered.contains("already registered") || lowered.contains("already exists") {
                AuthError::DuplicateAccount(message)
            } else if lowered.contains("password should be") {
                AuthError::WeakPassword(message)
            } else {
                AuthError::Api(format!("{} ({})", message, status.as_u16()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn normalize_auth_url_appends_auth_path() {
        let normalized = normalize_auth_url("https://demo.supabase.co").unwrap();
        assert_eq!(normalized, "https://demo.supabase.co/auth/v1");
    }

    #[test]
    fn normalize_auth_url_keeps_existing_auth_path() {
        let normalized = normalize_auth_url("https://demo.supabase.co/auth/v1").unwrap();
        assert_eq!(normalized, "https://demo.supabase.co/auth/v1");
    }

    #[test]
    fn normalize_auth_url_rejects_plain_host() {
        assert!(matches!(
            normalize_auth_url("demo.supabase.co"),
            Err(AuthError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn resolve_config_requires_both_values() {
        assert!(resolve_optional_supabase_config(None, None)
            .unwrap()
            .is_none());
        assert!(matches!(
            resolve_optional_supabase_config(Some("https://x".to_string()), None),
            Err(AuthError::NotConfigured)
        ));
    }

    #[test]
    fn response_without_session_fields_means_confirmation_required() {
        let response = GoTrueAuthResponse {
            access_token: None,
            refresh_token: None,
            expires_at: None,
            expires_in: None,
            user: Some(GoTrueUser {
                id: "user".to_string(),
                email: Some("user@example.com".to_string()),
            }),
        };
        assert!(response.into_session().unwrap().is_none());
    }

    #[test]
    fn response_derives_expiry_from_expires_in() {
        let response = GoTrueAuthResponse {
            access_token: Some("access".to_string()),
            refresh_token: Some("refresh".to_string()),
            expires_at: None,
            expires_in: Some(3600),
            user: Some(GoTrueUser {
                id: "user".to_string(),
                email: None,
            }),
        };
        let session = response.into_session().unwrap().unwrap();
        assert!(session.expires_at > unix_timestamp_now());
        assert!(!session.is_expired());
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let session = AuthSession {
            access_token: "secret-access-token".to_string(),
            refresh_token: "secret-refresh-token".to_string(),
            expires_at: 1_700_000_000,
            user: AuthUser {
                id: "user".to_string(),
                email: None,
            },
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-access-token"));
        assert!(!rendered.contains("secret-refresh-token"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn classify_maps_error_codes() {
        let weak = classify_api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"error_code":"weak_password","msg":"Password should be at least 6 characters."}"#,
        );
        assert!(matches!(weak, AuthError::WeakPassword(_)));

        let duplicate = classify_api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"error_code":"user_already_exists","msg":"User already registered"}"#,
        );
        assert!(matches!(duplicate, AuthError::DuplicateAccount(_)));

        let wrong = classify_api_error(
            StatusCode::BAD_REQUEST,
            r#"{"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#,
        );
        assert!(matches!(wrong, AuthError::InvalidCredentials(_)));

        let missing = classify_api_error(
            StatusCode::BAD_REQUEST,
            r#"{"error_code":"user_not_found","msg":"User not found"}"#,
        );
        assert!(matches!(missing, AuthError::AccountNotFound(_)));
    }

    #[test]
    fn classify_falls_back_to_message_text() {
        let wrong = classify_api_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert!(matches!(wrong, AuthError::InvalidCredentials(_)));
    }

    #[test]
    fn classify_keeps_generic_errors_generic() {
        let generic = classify_api_error(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        match generic {
            AuthError::Api(message) => assert_eq!(message, "boom (500)"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[derive(Clone, Default)]
    struct NullStore;

    impl SessionPersistence for NullStore {
        fn load_session(&self) -> AuthResult<Option<AuthSession>> {
            Ok(None)
        }
        fn save_session(&self, _session: &AuthSession) -> AuthResult<()> {
            Ok(())
        }
        fn clear_session(&self) -> AuthResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn restore_without_stored_session_publishes_signed_out() {
        let client =
            SupabaseAuthClient::new("https://demo.supabase.co", "anon", NullStore).unwrap();
        let receiver = client.subscribe();

        let restored = client.restore_session().await.unwrap();
        assert!(restored.is_none());
        assert!(receiver.borrow().is_none());
        assert!(client.current_user().is_none());
    }
}
