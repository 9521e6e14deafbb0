//! Link item model

use serde::{Deserialize, Serialize};

/// A saved link in a user's collection
///
/// The title doubles as the storage key within one user's collection, so a
/// second add with the same title overwrites the existing record instead of
/// creating a duplicate. That overwrite is the product contract, not an
/// accident of storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkItem {
    /// Display title; unique key within the owning user's collection
    pub title: String,
    /// Target URL, stored as entered (not validated)
    pub url: String,
    /// Favorite flag
    #[serde(default)]
    pub is_favorite: bool,
}

impl LinkItem {
    /// Create a new, not-yet-favorited link
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            is_favorite: false,
        }
    }
}
