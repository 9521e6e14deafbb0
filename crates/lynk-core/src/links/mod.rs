//! Link collection: remote CRUD over a user's saved links plus the pure
//! local filter that backs search and the favorites view.
//!
//! The collection holds the last server-confirmed snapshot. Mutations go to
//! the store first and touch the snapshot only after the call settles, so a
//! failed operation leaves the previously fetched list unchanged and the
//! caller can re-list if drift is suspected.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::LinkItem;
use crate::store::SupabaseRestClient;

const LINKS_TABLE: &str = "links";

/// Title is the storage key within one user's collection.
const LINKS_CONFLICT_KEY: &str = "user_id,title";

#[derive(Debug, Serialize)]
struct LinkRow<'a> {
    user_id: &'a str,
    title: &'a str,
    url: &'a str,
    is_favorite: bool,
}

#[derive(Debug, Serialize)]
struct FavoritePatch {
    is_favorite: bool,
}

/// A user's saved links: authoritative state in the remote store, last
/// confirmed snapshot in memory.
pub struct LinkCollection {
    store: SupabaseRestClient,
    user_id: String,
    items: Vec<LinkItem>,
}

impl LinkCollection {
    #[must_use]
    pub fn new(store: SupabaseRestClient, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
            items: Vec::new(),
        }
    }

    /// The last server-confirmed snapshot. Empty until the first `refresh`.
    #[must_use]
    pub fn items(&self) -> &[LinkItem] {
        &self.items
    }

    /// Fetch the user's links and replace the snapshot.
    ///
    /// Rows arrive in storage order; no particular order is guaranteed
    /// across reloads. On failure the previous snapshot is kept.
    pub async fn refresh(&mut self, access_token: &str) -> Result<&[LinkItem]> {
        let items = self
            .store
            .select::<LinkItem>(access_token, LINKS_TABLE, &[("user_id", &self.user_id)])
            .await?;
        self.items = items;
        Ok(&self.items)
    }

    /// Count stored links with an independent request.
    ///
    /// Fetched separately from the list, so the two can transiently
    /// disagree when a mutation lands in between.
    pub async fn count(&self, access_token: &str) -> Result<u64> {
        self.store
            .count_exact(access_token, LINKS_TABLE, &[("user_id", &self.user_id)])
            .await
    }

    /// Save a link under its title key, then re-list.
    ///
    /// An existing title is overwritten: the url is replaced and the
    /// favorite flag reset to false. That overwrite is the product
    /// contract for duplicate titles. There is no optimistic insert; the
    /// snapshot is refreshed from the store after a successful write.
    pub async fn add(&mut self, access_token: &str, title: &str, url: &str) -> Result<()> {
        let title = title.trim();
        let url = url.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("Link title is required".to_string()));
        }
        if url.is_empty() {
            return Err(Error::InvalidInput("Link url is required".to_string()));
        }

        let row = LinkRow {
            user_id: &self.user_id,
            title,
            url,
            is_favorite: false,
        };
        self.store
            .upsert_merge(access_token, LINKS_TABLE, LINKS_CONFLICT_KEY, &row)
            .await?;

        self.refresh(access_token).await?;
        Ok(())
    }

    /// Delete a link by its title key.
    ///
    /// Removing an absent title succeeds; the snapshot drops the entry only
    /// after the store confirms.
    pub async fn remove(&mut self, access_token: &str, title: &str) -> Result<()> {
        self.store
            .delete(
                access_token,
                LINKS_TABLE,
                &[("user_id", &self.user_id), ("title", title)],
            )
            .await?;

        self.items.retain(|link| link.title != title);
        Ok(())
    }

    /// Set or clear the favorite flag on a link.
    ///
    /// Favoriting merge-upserts the full record so concurrent partial
    /// updates to other fields survive; unfavoriting patches only the flag
    /// and leaves title and url untouched. The asymmetry is deliberate and
    /// preserved.
    pub async fn set_favorite(
        &mut self,
        access_token: &str,
        item: &LinkItem,
        value: bool,
    ) -> Result<()> {
        if value {
            let row = LinkRow {
                user_id: &self.user_id,
                title: &item.title,
                url: &item.url,
                is_favorite: true,
            };
            self.store
                .upsert_merge(access_token, LINKS_TABLE, LINKS_CONFLICT_KEY, &row)
                .await?;
        } else {
            self.store
                .update(
                    access_token,
                    LINKS_TABLE,
                    &[("user_id", &self.user_id), ("title", &item.title)],
                    &FavoritePatch { is_favorite: false },
                )
                .await?;
        }

        if let Some(entry) = self.items.iter_mut().find(|link| link.title == item.title) {
            entry.is_favorite = value;
        }
        Ok(())
    }
}

/// Filter links by case-insensitive text query and optional favorites-only
/// restriction.
///
/// Pure and synchronous: an empty or blank query matches everything; the
/// query matches against titles only. Designed for small single-user
/// collections held entirely in memory.
#[must_use]
pub fn filter_links(items: &[LinkItem], search_query: &str, favorites_only: bool) -> Vec<LinkItem> {
    let normalized_query = search_query.trim().to_lowercase();

    items
        .iter()
        .filter(|link| link_matches_query(link, &normalized_query))
        .filter(|link| !favorites_only || link.is_favorite)
        .cloned()
        .collect()
}

fn link_matches_query(link: &LinkItem, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    link.title.to_lowercase().contains(query)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample_links() -> Vec<LinkItem> {
        vec![
            LinkItem {
                title: "Rust Book".to_string(),
                url: "https://doc.rust-lang.org/book".to_string(),
                is_favorite: true,
            },
            LinkItem {
                title: "Crate Docs".to_string(),
                url: "https://docs.rs".to_string(),
                is_favorite: false,
            },
            LinkItem {
                title: "rustup".to_string(),
                url: "https://rustup.rs".to_string(),
                is_favorite: true,
            },
        ]
    }

    fn test_collection() -> LinkCollection {
        let store = SupabaseRestClient::new("https://demo.supabase.co", "anon").unwrap();
        LinkCollection::new(store, "user-1")
    }

    #[test]
    fn filter_with_blank_query_returns_everything() {
        let links = sample_links();
        assert_eq!(filter_links(&links, "", false), links);
        assert_eq!(filter_links(&links, "   ", false), links);
    }

    #[test]
    fn filter_matches_title_case_insensitively() {
        let links = sample_links();
        let matched = filter_links(&links, "RUST", false);
        assert_eq!(matched.len(), 2);
        assert!(matched.iter().all(|link| link
            .title
            .to_lowercase()
            .contains("rust")));
    }

    #[test]
    fn filter_intersects_query_with_favorites() {
        let links = sample_links();

        let favorites = filter_links(&links, "", true);
        assert_eq!(favorites.len(), 2);
        assert!(favorites.iter().all(|link| link.is_favorite));

        let favorite_rust = filter_links(&links, "rust", true);
        assert_eq!(favorite_rust.len(), 2);

        let favorite_docs = filter_links(&links, "docs", true);
        assert!(favorite_docs.is_empty());
    }

    #[test]
    fn filter_does_not_match_urls() {
        let links = sample_links();
        // "docs.rs" appears only in a url; titles decide the match.
        assert!(filter_links(&links, "docs.rs", false).is_empty());
    }

    #[tokio::test]
    async fn add_rejects_blank_title_and_url_before_any_request() {
        let mut collection = test_collection();

        let error = collection.add("token", "  ", "https://x").await.unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));

        let error = collection.add("token", "Docs", " ").await.unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));

        assert!(collection.items().is_empty());
    }

    #[test]
    fn snapshot_starts_empty() {
        let collection = test_collection();
        assert!(collection.items().is_empty());
    }

    #[tokio::test]
    #[ignore = "Requires live Supabase env vars (SUPABASE_URL, SUPABASE_ANON_KEY, LYNK_TEST_TOKEN, LYNK_TEST_USER_ID)"]
    async fn live_add_favorite_list_roundtrip() {
        let _ = dotenvy::dotenv();

        let url = std::env::var("SUPABASE_URL").expect("SUPABASE_URL");
        let anon_key = std::env::var("SUPABASE_ANON_KEY").expect("SUPABASE_ANON_KEY");
        let token = std::env::var("LYNK_TEST_TOKEN").expect("LYNK_TEST_TOKEN");
        let user_id = std::env::var("LYNK_TEST_USER_ID").expect("LYNK_TEST_USER_ID");

        let store = SupabaseRestClient::new(&url, anon_key).unwrap();
        let mut collection = LinkCollection::new(store, user_id);

        collection
            .add(&token, "Docs", "https://docs.example.com")
            .await
            .unwrap();
        let item = collection
            .items()
            .iter()
            .find(|link| link.title == "Docs")
            .cloned()
            .expect("added link should be listed");
        assert!(!item.is_favorite);

        collection.set_favorite(&token, &item, true).await.unwrap();
        collection.refresh(&token).await.unwrap();
        let item = collection
            .items()
            .iter()
            .find(|link| link.title == "Docs")
            .cloned()
            .unwrap();
        assert!(item.is_favorite);
        assert_eq!(item.url, "https://docs.example.com");

        // Re-adding the same title overwrites the url and clears the flag.
        collection
            .add(&token, "Docs", "https://docs2.example.com")
            .await
            .unwrap();
        let overwritten = collection
            .items()
            .iter()
            .filter(|link| link.title == "Docs")
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(overwritten.len(), 1);
        assert_eq!(overwritten[0].url, "https://docs2.example.com");
        assert!(!overwritten[0].is_favorite);

        collection.remove(&token, "Docs").await.unwrap();
        collection.refresh(&token).await.unwrap();
        assert!(!collection.items().iter().any(|link| link.title == "Docs"));

        // Removing an absent title is not an error.
        collection.remove(&token, "Docs").await.unwrap();
    }
}
