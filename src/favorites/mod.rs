//! Saved properties

use log::{debug, warn};
use reqwest::Client;
use std::collections::HashSet;

use crate::auth::SessionStore;
use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::{Fetch, FetchBuilder};
use crate::properties::Property;

/// Client for the `/favorites` endpoints
#[derive(Clone)]
pub struct FavoritesClient {
    url: String,
    client: Client,
    session: SessionStore,
    options: ClientOptions,
}

impl FavoritesClient {
    /// Create a new FavoritesClient
    pub(crate) fn new(url: &str, client: Client, session: SessionStore, options: ClientOptions) -> Self {
        Self {
            url: url.to_string(),
            client,
            session,
            options,
        }
    }

    fn get_url(&self, path: &str) -> String {
        format!("{}/favorites{}", self.url, path)
    }

    fn prepare<'a>(&'a self, fetch: FetchBuilder<'a>) -> FetchBuilder<'a> {
        fetch
            .header("X-Client-Info", &self.options.client_info)
            .timeout(self.options.request_timeout)
            .session(&self.session)
    }

    fn require_session(&self) -> Result<(), Error> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(Error::auth("Not logged in"))
        }
    }

    /// Properties the signed-in user has saved
    pub async fn list(&self) -> Result<Vec<Property>, Error> {
        self.require_session()?;
        let url = self.get_url("");

        self.prepare(Fetch::get(&self.client, &url))
            .execute::<Vec<Property>>()
            .await
    }

    /// Save a property
    pub async fn add(&self, property_id: i64) -> Result<(), Error> {
        self.require_session()?;
        let url = self.get_url(&format!("/{}", property_id));

        self.prepare(Fetch::post(&self.client, &url))
            .execute_empty()
            .await
    }

    /// Unsave a property
    pub async fn remove(&self, property_id: i64) -> Result<(), Error> {
        self.require_session()?;
        let url = self.get_url(&format!("/{}", property_id));

        self.prepare(Fetch::delete(&self.client, &url))
            .execute_empty()
            .await
    }

    /// Save or unsave a property
    pub async fn set_favorite(&self, property_id: i64, favorited: bool) -> Result<(), Error> {
        if favorited {
            self.add(property_id).await
        } else {
            self.remove(property_id).await
        }
    }
}

/// Local view of which properties are saved.
///
/// Toggles apply immediately and are undone when the server rejects them.
#[derive(Debug, Clone, Default)]
pub struct FavoriteSet {
    ids: HashSet<i64>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the set from properties carrying `is_favorited`
    pub fn from_properties<'a>(properties: impl IntoIterator<Item = &'a Property>) -> Self {
        Self {
            ids: properties
                .into_iter()
                .filter(|p| p.favorited())
                .map(|p| p.id)
                .collect(),
        }
    }

    /// Replace the set with the server's list
    pub async fn load(&mut self, client: &FavoritesClient) -> Result<usize, Error> {
        let saved = client.list().await?;
        self.ids = saved.iter().map(|p| p.id).collect();
        debug!("Loaded {} favorites", self.ids.len());
        Ok(self.ids.len())
    }

    pub fn contains(&self, property_id: i64) -> bool {
        self.ids.contains(&property_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Flip a property locally without talking to the server. Returns the
    /// new state.
    pub fn toggle_local(&mut self, property_id: i64) -> bool {
        if self.ids.remove(&property_id) {
            false
        } else {
            self.ids.insert(property_id);
            true
        }
    }

    /// Flip a property and tell the server. On failure the local flip is
    /// undone and the error returned.
    pub async fn toggle(&mut self, client: &FavoritesClient, property_id: i64) -> Result<bool, Error> {
        let target = self.toggle_local(property_id);

        match client.set_favorite(property_id, target).await {
            Ok(()) => Ok(target),
            Err(err) => {
                warn!("Failed to toggle favorite {}: {}", property_id, err);
                self.toggle_local(property_id);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_toggle_twice_restores_state() {
        let mut set = FavoriteSet::new();
        assert!(set.toggle_local(5));
        assert!(set.contains(5));
        assert!(!set.toggle_local(5));
        assert!(set.is_empty());
    }

    #[test]
    fn built_from_flagged_properties() {
        let properties: Vec<Property> = serde_json::from_value(serde_json::json!([
            {"id": 1, "title": "a", "owner_id": 1, "is_favorited": true},
            {"id": 2, "title": "b", "owner_id": 1, "is_favorited": false},
            {"id": 3, "title": "c", "owner_id": 1}
        ]))
        .unwrap();
        let set = FavoriteSet::from_properties(&properties);
        assert_eq!(set.len(), 1);
        assert!(set.contains(1));
    }

    #[test]
    fn toggle_without_session_is_undone() {
        let client = FavoritesClient::new(
            "http://localhost:8000",
            Client::new(),
            SessionStore::in_memory(),
            ClientOptions::default(),
        );
        let mut set = FavoriteSet::new();

        let result = tokio_test::block_on(set.toggle(&client, 8));
        assert!(matches!(result, Err(Error::Auth(_))));
        assert!(!set.contains(8));
    }
}
