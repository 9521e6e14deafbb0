//! Supabase PostgREST client: the remote document store for Lynk.
//!
//! Thin pass-through operations over the `rest/v1` surface: select with
//! equality filters, exact counts, merge-upserts, partial updates, and
//! deletes. Every call is authenticated with the caller's access token; no
//! caching, no retries.

use reqwest::header::CONTENT_RANGE;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Merge resolution: on conflict, columns absent from the payload keep
/// their stored values.
const PREFER_MERGE_UPSERT: &str = "resolution=merge-duplicates,return=minimal";
const PREFER_MINIMAL: &str = "return=minimal";
const PREFER_EXACT_COUNT: &str = "count=exact";

#[derive(Clone)]
pub struct SupabaseRestClient {
    rest_url: String,
    anon_key: String,
    client: Client,
}

impl SupabaseRestClient {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>) -> Result<Self> {
        let rest_url = normalize_rest_url(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(Error::InvalidInput(
                "Supabase anon key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            rest_url,
            anon_key,
            client: Client::builder().build().map_err(Error::Http)?,
        })
    }

    /// Fetch rows matching the equality filters, in storage order.
    ///
    /// No ordering is imposed; callers must not rely on a particular order
    /// across reloads.
    pub async fn select<T: DeserializeOwned>(
        &self,
        access_token: &str,
        table: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let response = self
            .table_request(Method::GET, table, access_token)
            .query(&eq_filters(filters))
            .send()
            .await?;
        let response = check_store_response(response).await?;
        Ok(response.json::<Vec<T>>().await?)
    }

    /// Exact row count for the filters, without fetching rows.
    ///
    /// Issued as its own HEAD request, so it can transiently disagree with a
    /// concurrent `select`; callers tolerate eventual consistency between
    /// the two.
    pub async fn count_exact(
        &self,
        access_token: &str,
        table: &str,
        filters: &[(&str, &str)],
    ) -> Result<u64> {
        let response = self
            .table_request(Method::HEAD, table, access_token)
            .header("Prefer", PREFER_EXACT_COUNT)
            .query(&eq_filters(filters))
            .send()
            .await?;
        let response = check_store_response(response).await?;

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| {
                Error::Store("Count response did not include an exact total".to_string())
            })
    }

    /// Insert the row, or merge it into the existing row sharing the
    /// `on_conflict` key: supplied columns overwrite, absent columns are
    /// preserved.
    pub async fn upsert_merge<T: Serialize + Sync>(
        &self,
        access_token: &str,
        table: &str,
        on_conflict: &str,
        row: &T,
    ) -> Result<()> {
        let response = self
            .table_request(Method::POST, table, access_token)
            .header("Prefer", PREFER_MERGE_UPSERT)
            .query(&[("on_conflict", on_conflict)])
            .json(row)
            .send()
            .await?;
        check_store_response(response).await?;
        Ok(())
    }

    /// Patch only the supplied columns on rows matching the filters.
    ///
    /// Matching zero rows is not an error.
    pub async fn update<T: Serialize + Sync>(
        &self,
        access_token: &str,
        table: &str,
        filters: &[(&str, &str)],
        patch: &T,
    ) -> Result<()> {
        let response = self
            .table_request(Method::PATCH, table, access_token)
            .header("Prefer", PREFER_MINIMAL)
            .query(&eq_filters(filters))
            .json(patch)
            .send()
            .await?;
        check_store_response(response).await?;
        Ok(())
    }

    /// Delete rows matching the filters.
    ///
    /// Deleting a key that does not exist succeeds; the store reports the
    /// same status either way and callers depend on that.
    pub async fn delete(
        &self,
        access_token: &str,
        table: &str,
        filters: &[(&str, &str)],
    ) -> Result<()> {
        let response = self
            .table_request(Method::DELETE, table, access_token)
            .header("Prefer", PREFER_MINIMAL)
            .query(&eq_filters(filters))
            .send()
            .await?;
        check_store_response(response).await?;
        Ok(())
    }

    fn table_request(&self, method: Method, table: &str, access_token: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
    }
}

pub fn normalize_rest_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "Supabase URL must not be empty".to_string(),
        ));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::InvalidInput(
            "Supabase URL must include http:// or https://".to_string(),
        ));
    }
    if trimmed.ends_with("/rest/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/rest/v1"))
    }
}

/// Render `(column, value)` pairs as PostgREST `column=eq.value` params.
fn eq_filters(filters: &[(&str, &str)]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|(column, value)| ((*column).to_string(), format!("eq.{value}")))
        .collect()
}

/// Total from a `Content-Range` header such as `0-24/25` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

async fn check_store_response(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Store(parse_store_error(status, &body)))
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorResponse {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
    code: Option<String>,
}

fn parse_store_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<PostgrestErrorResponse>(body) {
        if let Some(message) = payload
            .message
            .or(payload.details)
            .or(payload.hint)
            .or(payload.code)
        {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn normalize_rest_url_appends_rest_path() {
        let normalized = normalize_rest_url("https://demo.supabase.co/").unwrap();
        assert_eq!(normalized, "https://demo.supabase.co/rest/v1");
    }

    #[test]
    fn normalize_rest_url_keeps_existing_rest_path() {
        let normalized = normalize_rest_url("https://demo.supabase.co/rest/v1").unwrap();
        assert_eq!(normalized, "https://demo.supabase.co/rest/v1");
    }

    #[test]
    fn normalize_rest_url_rejects_plain_host() {
        assert!(matches!(
            normalize_rest_url("demo.supabase.co"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn eq_filters_prefixes_values() {
        let params = eq_filters(&[("user_id", "u-1"), ("title", "Docs")]);
        assert_eq!(
            params,
            vec![
                ("user_id".to_string(), "eq.u-1".to_string()),
                ("title".to_string(), "eq.Docs".to_string()),
            ]
        );
    }

    #[test]
    fn parse_content_range_total_reads_count() {
        assert_eq!(parse_content_range_total("0-24/25"), Some(25));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("*/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn parse_store_error_prefers_postgrest_message() {
        let rendered = parse_store_error(
            StatusCode::CONFLICT,
            r#"{"message":"duplicate key value violates unique constraint","code":"23505"}"#,
        );
        assert_eq!(
            rendered,
            "duplicate key value violates unique constraint (409)"
        );
    }

    #[test]
    fn parse_store_error_falls_back_to_body_then_status() {
        assert_eq!(
            parse_store_error(StatusCode::BAD_GATEWAY, "upstream unavailable"),
            "upstream unavailable (502)"
        );
        assert_eq!(parse_store_error(StatusCode::BAD_GATEWAY, "  "), "HTTP 502");
    }

    #[test]
    fn new_rejects_blank_anon_key() {
        assert!(matches!(
            SupabaseRestClient::new("https://demo.supabase.co", "   "),
            Err(Error::InvalidInput(_))
        ));
    }
}
