//! Profile configuration commands.

use lynk_core::util::{is_http_url, normalize_text_option};

use crate::cli::ConfigCommands;
use crate::config::CliProfilesConfig;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            supabase_url,
            supabase_anon_key,
            activate,
        } => {
            let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = config.resolve_profile_name(global_profile);

            let supabase_url = normalize_text_option(supabase_url)
                .or_else(|| normalize_text_option(std::env::var("SUPABASE_URL").ok()));
            let supabase_anon_key = normalize_text_option(supabase_anon_key)
                .or_else(|| normalize_text_option(std::env::var("SUPABASE_ANON_KEY").ok()));

            if let Some(url) = &supabase_url {
                if !is_http_url(url) {
                    return Err(CliError::Config(
                        "Supabase URL must include http:// or https://".to_string(),
                    ));
                }
            }

            let profile = config.profile_mut_or_default(&profile_name);
            if supabase_url.is_some() {
                profile.supabase_url = supabase_url;
            }
            if supabase_anon_key.is_some() {
                profile.supabase_anon_key = supabase_anon_key;
            }
            if activate {
                config.active_profile = Some(profile_name.clone());
            }

            let path = config.save().map_err(CliError::Config)?;
            println!("Updated profile '{}' in {}", profile_name, path.display());
            Ok(())
        }
        ConfigCommands::Show => {
            let config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = config.resolve_profile_name(global_profile);

            let Some(profile) = config.profile(&profile_name) else {
                println!("Profile '{profile_name}' is not configured.");
                return Ok(());
            };

            println!("profile: {profile_name}");
            println!(
                "supabase_url: {}",
                profile.supabase_url().as_deref().unwrap_or("(unset)")
            );
            println!(
                "supabase_anon_key: {}",
                if profile.supabase_anon_key().is_some() {
                    "(set)"
                } else {
                    "(unset)"
                }
            );
            Ok(())
        }
    }
}
