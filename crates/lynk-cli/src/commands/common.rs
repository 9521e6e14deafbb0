//! Shared helpers: resolving profile configuration and the signed-in session.

use lynk_core::profile::ProfileStore;
use lynk_core::store::SupabaseRestClient;

use crate::auth::{AuthService, AuthSession};
use crate::config::{avatars_dir, CliProfile, CliProfilesConfig};
use crate::error::CliError;

/// Everything a signed-in command needs.
pub struct SessionContext {
    pub session: AuthSession,
    pub store: SupabaseRestClient,
}

impl SessionContext {
    pub fn profile_store(&self) -> ProfileStore {
        ProfileStore::new(self.store.clone(), avatars_dir())
    }
}

/// Resolve the effective profile, erroring when it is not configured.
pub fn load_profile(global_profile: Option<&str>) -> Result<(String, CliProfile), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let profile = config.profile(&profile_name).cloned().ok_or_else(|| {
        CliError::Config(format!(
            "Profile '{profile_name}' is not configured. Run `lynk config init --profile {profile_name}` first."
        ))
    })?;
    Ok((profile_name, profile))
}

pub fn auth_service_for(
    profile_name: &str,
    profile: &CliProfile,
) -> Result<AuthService, CliError> {
    AuthService::new_for_profile(profile_name, profile)
        .map_err(|error| CliError::Auth(error.to_string()))?
        .ok_or_else(|| {
            CliError::Config(format!(
                "Profile '{profile_name}' is missing Supabase configuration. Set a URL and anon key via `lynk config init`."
            ))
        })
}

pub fn rest_client_for(profile: &CliProfile) -> Result<SupabaseRestClient, CliError> {
    let url = profile
        .supabase_url()
        .ok_or_else(|| CliError::Config("Profile is missing a Supabase URL".to_string()))?;
    let anon_key = profile
        .supabase_anon_key()
        .ok_or_else(|| CliError::Config("Profile is missing a Supabase anon key".to_string()))?;
    Ok(SupabaseRestClient::new(url, anon_key)?)
}

/// Restore the persisted session for the effective profile.
///
/// Fails with `NotSignedIn` when there is no (restorable) session; the user
/// retries after `lynk auth login`.
pub async fn signed_in_context(global_profile: Option<&str>) -> Result<SessionContext, CliError> {
    let (profile_name, profile) = load_profile(global_profile)?;
    let auth = auth_service_for(&profile_name, &profile)?;
    let store = rest_client_for(&profile)?;

    let session = auth
        .restore_session()
        .await
        .map_err(|error| CliError::Auth(error.to_string()))?
        .ok_or(CliError::NotSignedIn)?;
    tracing::debug!("Restored session for profile '{profile_name}'");

    Ok(SessionContext { session, store })
}
