//! Per-user profile document and avatar handling.
//!
//! The profile row carries the sign-up email and the local path of the
//! stored avatar image. Captured images are staged into a process-local
//! avatars directory and the resulting path written back to the row.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::UserProfile;
use crate::store::SupabaseRestClient;
use crate::util::safe_file_name;

const PROFILES_TABLE: &str = "profiles";
const PROFILES_CONFLICT_KEY: &str = "id";

/// An image produced by a capture collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    /// Original file name; the stored avatar keeps it.
    pub file_name: String,
}

/// External image-capture collaborator (camera, file picker, ...).
pub trait ImageCapture {
    /// Produce an image, or `None` when the user cancelled.
    fn capture(&self) -> Result<Option<CapturedImage>>;
}

#[derive(Debug, Serialize)]
struct ProfileSeedRow<'a> {
    id: &'a str,
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct AvatarRow<'a> {
    id: &'a str,
    avatar_path: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    avatar_path: Option<String>,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            email: row.email,
            avatar_path: row.avatar_path,
        }
    }
}

/// Profile document access plus avatar staging.
#[derive(Clone)]
pub struct ProfileStore {
    store: SupabaseRestClient,
    avatar_dir: PathBuf,
}

impl ProfileStore {
    #[must_use]
    pub fn new(store: SupabaseRestClient, avatar_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            avatar_dir: avatar_dir.into(),
        }
    }

    /// Seed the initial profile row at sign-up time (email only).
    ///
    /// Merge-upsert, so re-registering an address that already has a row
    /// does not wipe an existing avatar.
    pub async fn create_initial(
        &self,
        access_token: &str,
        user_id: &str,
        email: &str,
    ) -> Result<()> {
        let row = ProfileSeedRow { id: user_id, email };
        self.store
            .upsert_merge(access_token, PROFILES_TABLE, PROFILES_CONFLICT_KEY, &row)
            .await
    }

    /// Load the profile row; `None` when the sign-up seed never landed.
    pub async fn load(&self, access_token: &str, user_id: &str) -> Result<Option<UserProfile>> {
        let mut rows = self
            .store
            .select::<ProfileRow>(access_token, PROFILES_TABLE, &[("id", user_id)])
            .await?;

        Ok(rows.pop().map(Into::into))
    }

    /// The stored avatar path, absent when there is no profile row or no
    /// avatar field.
    pub async fn load_avatar(&self, access_token: &str, user_id: &str) -> Result<Option<PathBuf>> {
        let profile = self.load(access_token, user_id).await?;
        Ok(profile
            .and_then(|profile| profile.avatar_path)
            .map(PathBuf::from))
    }

    /// Capture an avatar image, stage it locally, and record its path.
    ///
    /// Cancellation is a no-op returning `None`; an existing avatar stays
    /// untouched. The profile write is a merge-upsert so it also works when
    /// the sign-up seed never created the row.
    pub async fn capture_and_store_avatar(
        &self,
        access_token: &str,
        user_id: &str,
        capture: &impl ImageCapture,
    ) -> Result<Option<PathBuf>> {
        let Some(image) = capture.capture()? else {
            return Ok(None);
        };

        let staged_path = stage_avatar_file(&self.avatar_dir, &image)?;
        let staged_path_text = staged_path.to_string_lossy();

        let row = AvatarRow {
            id: user_id,
            avatar_path: staged_path_text.as_ref(),
        };
        self.store
            .upsert_merge(access_token, PROFILES_TABLE, PROFILES_CONFLICT_KEY, &row)
            .await?;

        Ok(Some(staged_path))
    }
}

/// Write image bytes into the avatars directory under the image's original
/// file name, creating the directory when absent.
///
/// Two captures sharing a file name overwrite each other; the original
/// product behaves the same way and no de-duplication is attempted.
pub fn stage_avatar_file(avatar_dir: &Path, image: &CapturedImage) -> Result<PathBuf> {
    let file_name = safe_file_name(&image.file_name).ok_or_else(|| {
        Error::InvalidInput(format!(
            "Captured image has an unusable file name: {:?}",
            image.file_name
        ))
    })?;

    std::fs::create_dir_all(avatar_dir)?;

    let target = avatar_dir.join(file_name);
    std::fs::write(&target, &image.bytes)?;
    Ok(target)
}
