//! Property search, listing management and images

mod card;
mod filter;
mod listing;
mod types;

use reqwest::Client;
use serde_json::json;
use std::path::Path;

use crate::auth::SessionStore;
use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::{Fetch, FetchBuilder, FilePart};

pub use card::*;
pub use filter::*;
pub use listing::*;
pub use types::*;

/// Client for the `/properties` endpoints
#[derive(Clone)]
pub struct PropertiesClient {
    /// The base URL of the API
    url: String,

    /// HTTP client
    client: Client,

    /// The shared session
    session: SessionStore,

    /// Client options
    options: ClientOptions,
}

impl PropertiesClient {
    /// Create a new PropertiesClient
    pub(crate) fn new(url: &str, client: Client, session: SessionStore, options: ClientOptions) -> Self {
        Self {
            url: url.to_string(),
            client,
            session,
            options,
        }
    }

    fn get_url(&self, path: &str) -> String {
        format!("{}/properties{}", self.url, path)
    }

    fn prepare<'a>(&'a self, fetch: FetchBuilder<'a>) -> FetchBuilder<'a> {
        fetch
            .header("X-Client-Info", &self.options.client_info)
            .timeout(self.options.request_timeout)
            .session(&self.session)
    }

    /// Page size used for new searches
    pub fn page_size(&self) -> u32 {
        self.options.page_size
    }

    /// Run one search
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, Error> {
        let url = self.get_url("/search");

        self.prepare(Fetch::get(&self.client, &url))
            .query(query.to_params())
            .execute::<SearchResponse>()
            .await
    }

    /// Marketplace-wide statistics
    pub async fn statistics(&self) -> Result<MarketStatistics, Error> {
        let url = self.get_url("/statistics");

        self.prepare(Fetch::get(&self.client, &url))
            .execute::<MarketStatistics>()
            .await
    }

    /// Get a single property
    pub async fn get(&self, id: i64) -> Result<Property, Error> {
        let url = self.get_url(&format!("/{}", id));

        self.prepare(Fetch::get(&self.client, &url))
            .execute::<Property>()
            .await
    }

    /// Listings owned by the signed-in user
    pub async fn mine(&self) -> Result<Vec<Property>, Error> {
        self.require_session()?;
        let url = self.get_url("/me");

        self.prepare(Fetch::get(&self.client, &url))
            .execute::<Vec<Property>>()
            .await
    }

    /// Publish a new listing
    pub async fn create(&self, property: &NewProperty) -> Result<Property, Error> {
        self.require_session()?;
        property.validate()?;
        let url = self.get_url("");

        self.prepare(Fetch::post(&self.client, &url))
            .json(property)?
            .execute::<Property>()
            .await
    }

    /// Change some fields of a listing.
    ///
    /// A patch touching the sale/rent flags or prices is checked against the
    /// current listing first.
    pub async fn update(&self, id: i64, patch: &PropertyPatch) -> Result<Property, Error> {
        self.require_session()?;
        if patch.touches_listing_kind() {
            let current = self.get(id).await?;
            patch.validate_against(&current)?;
        }
        let url = self.get_url(&format!("/{}", id));

        self.prepare(Fetch::patch(&self.client, &url))
            .json(patch)?
            .execute::<Property>()
            .await
    }

    /// Remove a listing
    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        self.require_session()?;
        let url = self.get_url(&format!("/{}", id));

        self.prepare(Fetch::delete(&self.client, &url))
            .execute_empty()
            .await
    }

    /// Images of a listing
    pub async fn list_images(&self, id: i64) -> Result<Vec<PropertyImage>, Error> {
        let url = self.get_url(&format!("/{}/images", id));

        self.prepare(Fetch::get(&self.client, &url))
            .execute::<Vec<PropertyImage>>()
            .await
    }

    /// Upload an image from memory
    pub async fn upload_image(
        &self,
        id: i64,
        file_name: &str,
        mime_type: &str,
        data: Vec<u8>,
    ) -> Result<PropertyImage, Error> {
        self.require_session()?;
        let url = self.get_url(&format!("/{}/images", id));

        self.prepare(Fetch::post(&self.client, &url))
            .multipart(FilePart {
                field: "file".to_string(),
                file_name: file_name.to_string(),
                mime_type: mime_type.to_string(),
                data,
            })
            .execute::<PropertyImage>()
            .await
    }

    /// Upload an image from disk
    pub async fn upload_image_file(&self, id: i64, path: &Path) -> Result<PropertyImage, Error> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        let mime_type = image_mime_type(path);

        self.upload_image(id, &file_name, mime_type, data).await
    }

    /// Remove an image from a listing
    pub async fn delete_image(&self, id: i64, image_id: i64) -> Result<(), Error> {
        self.require_session()?;
        let url = self.get_url(&format!("/{}/images/{}", id, image_id));

        self.prepare(Fetch::delete(&self.client, &url))
            .execute_empty()
            .await
    }

    /// Make an image the cover and return the updated image list
    pub async fn set_cover_image(&self, id: i64, image_id: i64) -> Result<Vec<PropertyImage>, Error> {
        self.require_session()?;
        let url = self.get_url(&format!("/{}/images/{}", id, image_id));

        self.prepare(Fetch::patch(&self.client, &url))
            .json(&json!({ "is_cover": true }))?
            .execute_empty()
            .await?;

        self.list_images(id).await
    }

    fn require_session(&self) -> Result<(), Error> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(Error::auth("Not logged in"))
        }
    }
}

fn image_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
