//! Link commands: add, list, remove, favorite, count.

use lynk_core::links::{filter_links, LinkCollection};
use lynk_core::LinkItem;
use serde::Serialize;

use crate::commands::common::signed_in_context;
use crate::error::CliError;

pub async fn run_add(
    global_profile: Option<&str>,
    title: &str,
    url: &str,
) -> Result<(), CliError> {
    let context = signed_in_context(global_profile).await?;
    let mut collection = LinkCollection::new(context.store, context.session.user.id.as_str());

    collection
        .add(&context.session.access_token, title, url)
        .await?;

    println!("Saved '{}'", title.trim());
    Ok(())
}

pub async fn run_list(
    global_profile: Option<&str>,
    query: Option<&str>,
    favorites_only: bool,
    as_json: bool,
) -> Result<(), CliError> {
    let context = signed_in_context(global_profile).await?;
    let mut collection = LinkCollection::new(context.store, context.session.user.id.as_str());
    collection.refresh(&context.session.access_token).await?;

    let visible = filter_links(
        collection.items(),
        query.unwrap_or_default(),
        favorites_only,
    );

    if as_json {
        let json_items = visible
            .iter()
            .map(link_to_list_item)
            .collect::<Vec<LinkListItem<'_>>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if visible.is_empty() {
        println!("No links.");
    } else {
        for line in format_link_lines(&visible) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_remove(global_profile: Option<&str>, title: &str) -> Result<(), CliError> {
    let context = signed_in_context(global_profile).await?;
    let mut collection = LinkCollection::new(context.store, context.session.user.id.as_str());

    collection
        .remove(&context.session.access_token, title)
        .await?;

    println!("Removed '{title}'");
    Ok(())
}

pub async fn run_favorite(
    global_profile: Option<&str>,
    title: &str,
    value: bool,
) -> Result<(), CliError> {
    let context = signed_in_context(global_profile).await?;
    let mut collection = LinkCollection::new(context.store, context.session.user.id.as_str());
    collection.refresh(&context.session.access_token).await?;

    let item = collection
        .items()
        .iter()
        .find(|link| link.title == title)
        .cloned()
        .ok_or_else(|| CliError::LinkNotFound(title.to_string()))?;

    collection
        .set_favorite(&context.session.access_token, &item, value)
        .await?;

    if value {
        println!("Favorited '{title}'");
    } else {
        println!("Unfavorited '{title}'");
    }
    Ok(())
}

pub async fn run_count(global_profile: Option<&str>) -> Result<(), CliError> {
    let context = signed_in_context(global_profile).await?;
    let collection = LinkCollection::new(context.store, context.session.user.id.as_str());

    let total = collection.count(&context.session.access_token).await?;
    println!("{total}");
    Ok(())
}

#[derive(Debug, Serialize)]
struct LinkListItem<'a> {
    title: &'a str,
    url: &'a str,
    is_favorite: bool,
}

fn link_to_list_item(link: &LinkItem) -> LinkListItem<'_> {
    LinkListItem {
        title: &link.title,
        url: &link.url,
        is_favorite: link.is_favorite,
    }
}

fn format_link_lines(links: &[LinkItem]) -> Vec<String> {
    links
        .iter()
        .map(|link| {
            let marker = if link.is_favorite { "*" } else { " " };
            format!("{marker} {:<32}  {}", link.title, link.url)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample_links() -> Vec<LinkItem> {
        vec![
            LinkItem {
                title: "Docs".to_string(),
                url: "https://docs.example.com".to_string(),
                is_favorite: true,
            },
            LinkItem {
                title: "Blog".to_string(),
                url: "https://blog.example.com".to_string(),
                is_favorite: false,
            },
        ]
    }

    #[test]
    fn format_marks_favorites() {
        let lines = format_link_lines(&sample_links());
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("* Docs"));
        assert!(lines[1].starts_with("  Blog"));
        assert!(lines[0].ends_with("https://docs.example.com"));
    }

    #[test]
    fn list_items_serialize_expected_fields() {
        let links = sample_links();
        let items = links
            .iter()
            .map(link_to_list_item)
            .collect::<Vec<LinkListItem<'_>>>();

        let rendered = serde_json::to_string(&items).unwrap();
        assert!(rendered.contains(r#""title":"Docs""#));
        assert!(rendered.contains(r#""url":"https://blog.example.com""#));
        assert!(rendered.contains(r#""is_favorite":true"#));
    }
}
