//! CLI Supabase auth/session helpers with secure keychain persistence.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use crate::config::CliProfile;

use lynk_core::auth::{
    register_account, resolve_optional_supabase_config, AuthResult, SessionPersistence,
    SignUpOutcome, SupabaseAuthClient,
};
use lynk_core::profile::ProfileStore;
pub use lynk_core::auth::{AuthError, AuthSession};

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "lynk-cli";

#[derive(Clone)]
struct SessionStore {
    username: String,
}

impl SessionStore {
    fn new(profile_name: &str) -> Self {
        Self {
            username: format!("supabase_session:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }
}

impl SessionPersistence for SessionStore {
    #[cfg(not(test))]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let store = Self::test_store();
        let guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        if let Some(raw) = guard.get(&self.username) {
            Ok(Some(serde_json::from_str(raw)?))
        } else {
            Ok(None)
        }
    }

    #[cfg(not(test))]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&raw)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        Ok(())
    }

    #[cfg(test)]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        let store = Self::test_store();
        let mut guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.insert(self.username.clone(), raw);
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_session(&self) -> AuthResult<()> {
        let entry = self.entry()?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear_session(&self) -> AuthResult<()> {
        let store = Self::test_store();
        let mut guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

/// Identity gateway bound to one CLI profile's keychain slot.
#[derive(Clone)]
pub struct AuthService {
    inner: SupabaseAuthClient<SessionStore>,
}

impl AuthService {
    /// Build the service for a profile, `None` when the profile carries no
    /// Supabase configuration.
    pub fn new_for_profile(profile_name: &str, profile: &CliProfile) -> AuthResult<Option<Self>> {
        let Some((url, anon_key)) =
            resolve_optional_supabase_config(profile.supabase_url(), profile.supabase_anon_key())?
        else {
            return Ok(None);
        };

        let inner = SupabaseAuthClient::new(url, anon_key, SessionStore::new(profile_name))?;
        Ok(Some(Self { inner }))
    }

    /// Sign up and seed the new account's profile row.
    pub async fn register(
        &self,
        profiles: &ProfileStore,
        email: &str,
        password: &str,
    ) -> AuthResult<SignUpOutcome> {
        register_account(&self.inner, profiles, email, password).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.inner.sign_in(email, password).await
    }

    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        self.inner.restore_session().await
    }

    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        self.inner.sign_out(access_token).await
    }
}

pub fn load_stored_session(profile_name: &str) -> AuthResult<Option<AuthSession>> {
    SessionStore::new(profile_name).load_session()
}

pub fn clear_stored_session(profile_name: &str) -> AuthResult<()> {
    SessionStore::new(profile_name).clear_session()
}

#[cfg(test)]
mod tests {
    use lynk_core::auth::AuthUser;
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample_session() -> AuthSession {
        AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: 4_102_444_800,
            user: AuthUser {
                id: "user-1".to_string(),
                email: Some("user@example.com".to_string()),
            },
        }
    }

    #[test]
    fn session_store_roundtrip_and_clear() {
        let store = SessionStore::new("roundtrip-profile");

        assert_eq!(store.load_session().unwrap(), None);

        let session = sample_session();
        store.save_session(&session).unwrap();
        assert_eq!(store.load_session().unwrap(), Some(session));

        store.clear_session().unwrap();
        assert_eq!(store.load_session().unwrap(), None);
    }

    #[test]
    fn session_slots_are_per_profile() {
        let store_a = SessionStore::new("profile-a");
        let store_b = SessionStore::new("profile-b");

        store_a.save_session(&sample_session()).unwrap();
        assert!(store_b.load_session().unwrap().is_none());

        store_a.clear_session().unwrap();
    }

    #[test]
    fn service_requires_full_supabase_config() {
        let empty = CliProfile::default();
        assert!(AuthService::new_for_profile("default", &empty)
            .unwrap()
            .is_none());

        let partial = CliProfile {
            supabase_url: Some("https://demo.supabase.co".to_string()),
            supabase_anon_key: None,
        };
        assert!(matches!(
            AuthService::new_for_profile("default", &partial),
            Err(AuthError::NotConfigured)
        ));
    }
}
