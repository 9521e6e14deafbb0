//! Account session commands: register, login, logout, status.

use lynk_core::auth::SignUpOutcome;
use lynk_core::profile::ProfileStore;

use crate::auth::{clear_stored_session, load_stored_session};
use crate::cli::AuthCommands;
use crate::commands::common::{auth_service_for, load_profile, rest_client_for};
use crate::config::avatars_dir;
use crate::error::CliError;

pub async fn run_auth(
    command: AuthCommands,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    match command {
        AuthCommands::Register { email, password } => {
            let (profile_name, profile) = load_profile(global_profile)?;
            let auth = auth_service_for(&profile_name, &profile)?;
            let profiles = ProfileStore::new(rest_client_for(&profile)?, avatars_dir());

            let outcome = auth
                .register(&profiles, &email, &password)
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;

            match outcome {
                SignUpOutcome::SignedIn(session) => {
                    let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                    println!("Registered and signed in profile '{profile_name}' as {email_label}");
                }
                SignUpOutcome::ConfirmationRequired => {
                    println!(
                        "Registered. Check {email} for a confirmation link, then run `lynk auth login`."
                    );
                }
            }
            Ok(())
        }
        AuthCommands::Login { email, password } => {
            let (profile_name, profile) = load_profile(global_profile)?;
            let auth = auth_service_for(&profile_name, &profile)?;

            let session = auth
                .sign_in(&email, &password)
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;

            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("Signed in profile '{profile_name}' as {email_label}");
            Ok(())
        }
        AuthCommands::Logout => {
            let (profile_name, profile) = load_profile(global_profile)?;
            let stored_session = load_stored_session(&profile_name)
                .map_err(|error| CliError::Auth(error.to_string()))?;

            if let Some(session) = stored_session {
                let auth = auth_service_for(&profile_name, &profile)?;
                auth.sign_out(&session.access_token)
                    .await
                    .map_err(|error| CliError::Auth(error.to_string()))?;
            } else {
                clear_stored_session(&profile_name)
                    .map_err(|error| CliError::Auth(error.to_string()))?;
            }

            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
        AuthCommands::Status => {
            let (profile_name, profile) = load_profile(global_profile)?;
            let auth = auth_service_for(&profile_name, &profile)?;

            let session = auth
                .restore_session()
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;

            if let Some(session) = session {
                let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                println!(
                    "Profile '{}' is signed in as {} (user id {}, expires_at={})",
                    profile_name, email_label, session.user.id, session.expires_at
                );
            } else {
                println!("Profile '{profile_name}' is not signed in.");
            }
            Ok(())
        }
    }
}
