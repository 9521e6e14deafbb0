//! Avatar commands: show the stored path, store a new image.

use std::path::PathBuf;

use lynk_core::profile::{CapturedImage, ImageCapture};
use lynk_core::Result as CoreResult;

use crate::cli::AvatarCommands;
use crate::commands::common::signed_in_context;
use crate::error::CliError;

/// File-based capture collaborator: reads the image from disk, keeping its
/// original file name. An absent source path models the user cancelling the
/// picker.
struct FileImageCapture {
    source: Option<PathBuf>,
}

impl ImageCapture for FileImageCapture {
    fn capture(&self) -> CoreResult<Option<CapturedImage>> {
        let Some(source) = &self.source else {
            return Ok(None);
        };

        let bytes = std::fs::read(source)?;
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Some(CapturedImage { bytes, file_name }))
    }
}

pub async fn run_avatar(
    command: AvatarCommands,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    match command {
        AvatarCommands::Show => {
            let context = signed_in_context(global_profile).await?;
            let profiles = context.profile_store();

            let avatar = profiles
                .load_avatar(&context.session.access_token, &context.session.user.id)
                .await?;

            match avatar {
                Some(path) => println!("{}", path.display()),
                None => println!("No avatar set."),
            }
            Ok(())
        }
        AvatarCommands::Set { path } => {
            let context = signed_in_context(global_profile).await?;
            let profiles = context.profile_store();
            let capture = FileImageCapture { source: path };

            let stored = profiles
                .capture_and_store_avatar(
                    &context.session.access_token,
                    &context.session.user.id,
                    &capture,
                )
                .await?;

            match stored {
                Some(path) => println!("Avatar stored at {}", path.display()),
                None => println!("Avatar capture cancelled; nothing changed."),
            }
            Ok(())
        }
    }
}
