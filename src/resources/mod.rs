//! Typed API modules, one per back-office resource.
//!
//! Every resource decodes into a strongly typed record at the API boundary.
//! Missing numbers default to 0 and missing strings to empty so partial
//! payloads never fail a render.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::marker::PhantomData;

use crate::api::{path_segment, ApiClient};
use crate::error::ApiError;

pub mod branches;
pub mod inventory;
pub mod managers;
pub mod menu;
pub mod orders;
pub mod reports;
pub mod restaurants;

/// How a record leaves the list when removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Spliced out; the list re-fetches.
    Hard,
    /// Deactivated in place (`is_active = false`).
    Soft,
}

/// A comparable cell value for client-side sorting.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl SortKey {
    pub fn text(value: &str) -> Self {
        SortKey::Text(value.to_lowercase())
    }

    pub fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Flag(a), SortKey::Flag(b)) => a.cmp(b),
            // Mixed kinds only happen on malformed data; keep them stable.
            _ => Ordering::Equal,
        }
    }
}

/// A row managed by a list controller.
pub trait Record: Clone + Send + Sync + 'static {
    /// Singular noun for messages, e.g. "branch".
    const KIND: &'static str;

    fn id(&self) -> &str;

    /// Values shown in the table; search matches against these.
    fn search_fields(&self) -> Vec<String>;

    fn sort_key(&self, column: &str) -> Option<SortKey>;

    fn removal(&self) -> Removal {
        Removal::Hard
    }

    /// Confirmation text shown before removal.
    fn removal_prompt(&self) -> String {
        format!("Delete this {}? This cannot be undone.", Self::KIND)
    }

    fn is_active(&self) -> bool {
        true
    }

    fn set_active(&mut self, _active: bool) {}
}

/// CRUD contract the list controller drives.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    type Record: Record + DeserializeOwned;
    type Input: Serialize + Send + Sync;

    async fn list(&self) -> Result<Vec<Self::Record>, ApiError>;
    async fn create(&self, input: &Self::Input) -> Result<Option<Self::Record>, ApiError>;
    async fn update(
        &self,
        id: &str,
        input: &Self::Input,
    ) -> Result<Option<Self::Record>, ApiError>;
    async fn remove(&self, id: &str) -> Result<(), ApiError>;
}

/// Generic REST collection at `path`, optionally scoped by query parameters.
pub struct RestResource<R, I> {
    client: ApiClient,
    path: String,
    scope: Vec<(&'static str, String)>,
    _marker: PhantomData<fn() -> (R, I)>,
}

impl<R, I> Clone for RestResource<R, I> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            path: self.path.clone(),
            scope: self.scope.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R, I> RestResource<R, I> {
    pub fn new(client: ApiClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            scope: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Add a query parameter to every list call (e.g. `restaurantId`).
    pub fn scoped(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.scope.push((key, value.into()));
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn record_path(&self, id: &str) -> Result<String, ApiError> {
        Ok(format!("{}/{}", self.path, path_segment(id)?))
    }
}

#[async_trait]
impl<R, I> ResourceApi for RestResource<R, I>
where
    R: Record + DeserializeOwned,
    I: Serialize + Send + Sync,
{
    type Record = R;
    type Input = I;

    async fn list(&self) -> Result<Vec<R>, ApiError> {
        self.client.get_list(&self.path, &self.scope).await
    }

    async fn create(&self, input: &I) -> Result<Option<R>, ApiError> {
        self.client.post(&self.path, input).await
    }

    async fn update(&self, id: &str, input: &I) -> Result<Option<R>, ApiError> {
        let path = self.record_path(id)?;
        self.client.put(&path, input).await
    }

    async fn remove(&self, id: &str) -> Result<(), ApiError> {
        let path = self.record_path(id)?;
        self.client.delete(&path).await
    }
}

/// Fetch one record by id; an empty result is a not-found.
pub async fn fetch_record<R: Record + DeserializeOwned>(
    client: &ApiClient,
    path: &str,
    id: &str,
) -> Result<R, ApiError> {
    let full = format!("{path}/{}", path_segment(id)?);
    client
        .get_one(&full, &[])
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} {id}", R::KIND)))
}

/// Render an empty display string as "N/A".
pub fn display_or_na(value: &str) -> String {
    if value.trim().is_empty() {
        "N/A".to_string()
    } else {
        value.to_string()
    }
}

pub(crate) fn default_true() -> bool {
    true
}

/// Accepts either `["id", ...]` or `[{ "id": ... }, ...]` and keeps the ids.
pub(crate) fn ids_or_objects<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Object(obj) => obj
                .get("id")
                .or_else(|| obj.get("_id"))
                .and_then(serde_json::Value::as_str)
                .map(ToString::to_string),
            _ => None,
        })
        .filter(|id| !id.trim().is_empty())
        .collect())
}

/// Postal address shared by restaurants and branches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    /// Single-line form for tables, skipping blank parts.
    pub fn one_line(&self) -> String {
        [
            &self.street,
            &self.city,
            &self.state,
            &self.postal_code,
            &self.country,
        ]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_keys_compare_within_kind() {
        assert_eq!(
            SortKey::text("apple").compare(&SortKey::text("Banana")),
            Ordering::Less
        );
        assert_eq!(
            SortKey::Number(2.5).compare(&SortKey::Number(-1.0)),
            Ordering::Greater
        );
        assert_eq!(
            SortKey::Flag(true).compare(&SortKey::Number(1.0)),
            Ordering::Equal
        );
    }

    #[derive(Deserialize)]
    struct WithIds {
        #[serde(default, deserialize_with = "ids_or_objects")]
        ids: Vec<String>,
    }

    #[test]
    fn ids_accept_strings_or_objects() {
        let parsed: WithIds =
            serde_json::from_str(r#"{"ids":["m1",{"_id":"m2"},{"id":"m3","name":"x"},42]}"#)
                .expect("decode");
        assert_eq!(parsed.ids, vec!["m1", "m2", "m3"]);

        let parsed: WithIds = serde_json::from_str(r#"{"ids":null}"#).expect("decode");
        assert!(parsed.ids.is_empty());
    }

    #[test]
    fn address_one_line_skips_blanks() {
        let address = Address {
            street: "1 Main St".into(),
            city: "Springfield".into(),
            country: "US".into(),
            ..Address::default()
        };
        assert_eq!(address.one_line(), "1 Main St, Springfield, US");
        assert_eq!(display_or_na(&Address::default().one_line()), "N/A");
    }
}
