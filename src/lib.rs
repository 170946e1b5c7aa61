//! Aqarak Rust Client Library
//!
//! A client for the Aqarak real-estate marketplace API: sign-in and session
//! handling, property search and listings, favorites, AI price estimates and
//! the AI assistant chat.
//!
//! Besides the HTTP wrappers, the crate carries the state machines a
//! front-end needs around them: [`properties::SearchView`] for paginated
//! search, [`valuation::ValuationWizard`] for the price estimate form,
//! [`chat::ChatPanel`] for the transcript, and [`auth::guard`] for protected
//! routes.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod favorites;
pub mod fetch;
pub mod properties;
pub mod valuation;

use reqwest::Client;

use crate::auth::{Auth, AuthState, FileStorage, SessionStore};
use crate::chat::ChatClient;
use crate::config::ClientOptions;
use crate::favorites::FavoritesClient;
use crate::properties::{ListingKind, PropertiesClient, SearchView};
use crate::valuation::ValuationClient;

pub use crate::error::Error;

/// The main entry point for the Aqarak client
#[derive(Clone)]
pub struct Aqarak {
    /// The base URL of the API
    pub url: String,
    /// HTTP client used for requests
    pub http_client: Client,
    /// The session shared by every resource client
    pub session: SessionStore,
    /// Client options
    pub options: ClientOptions,
}

impl Aqarak {
    /// Create a new client
    ///
    /// # Example
    ///
    /// ```
    /// use aqarak_client::Aqarak;
    ///
    /// let aqarak = Aqarak::new("https://api.aqarak.jo");
    /// ```
    pub fn new(api_url: &str) -> Self {
        Self::new_with_options(api_url, ClientOptions::default())
    }

    /// Create a new client with custom options
    ///
    /// The session is persisted to `options.session_path` when persistence
    /// is enabled, otherwise it only lives in memory.
    ///
    /// # Example
    ///
    /// ```
    /// use aqarak_client::{Aqarak, config::ClientOptions};
    ///
    /// let options = ClientOptions::default().with_page_size(24);
    /// let aqarak = Aqarak::new_with_options("https://api.aqarak.jo", options);
    /// ```
    pub fn new_with_options(api_url: &str, options: ClientOptions) -> Self {
        let session = match (&options.session_path, options.persist_session) {
            (Some(path), true) => SessionStore::new(Box::new(FileStorage::new(path))),
            _ => SessionStore::in_memory(),
        };
        Self::with_session(api_url, options, session)
    }

    /// Create a client around an existing session store
    pub fn with_session(api_url: &str, options: ClientOptions, session: SessionStore) -> Self {
        Self {
            url: api_url.trim_end_matches('/').to_string(),
            http_client: Client::new(),
            session,
            options,
        }
    }

    /// Create a client from `AQARAK_*` environment variables
    pub fn from_env() -> Result<Self, Error> {
        let url = ClientOptions::api_url_from_env().ok_or_else(|| {
            Error::general(format!("{} must be set", config::ENV_API_URL))
        })?;
        Ok(Self::new_with_options(&url, ClientOptions::from_env()))
    }

    /// Load the stored session. Call once at start-up; until then the auth
    /// state is [`AuthState::Loading`].
    pub fn init(&self) -> Result<AuthState, Error> {
        self.session.init()
    }

    /// Current authentication state
    pub fn auth_state(&self) -> AuthState {
        self.session.state()
    }

    /// Login, registration and profile
    pub fn auth(&self) -> Auth {
        Auth::new(
            &self.url,
            self.http_client.clone(),
            self.session.clone(),
            self.options.clone(),
        )
    }

    /// Property search and listing management
    pub fn properties(&self) -> PropertiesClient {
        PropertiesClient::new(
            &self.url,
            self.http_client.clone(),
            self.session.clone(),
            self.options.clone(),
        )
    }

    /// Saved properties
    pub fn favorites(&self) -> FavoritesClient {
        FavoritesClient::new(
            &self.url,
            self.http_client.clone(),
            self.session.clone(),
            self.options.clone(),
        )
    }

    /// Price estimates
    pub fn valuation(&self) -> ValuationClient {
        ValuationClient::new(
            &self.url,
            self.http_client.clone(),
            self.session.clone(),
            self.options.clone(),
        )
    }

    /// AI assistant
    pub fn chat(&self) -> ChatClient {
        ChatClient::new(
            &self.url,
            self.http_client.clone(),
            self.session.clone(),
            self.options.clone(),
        )
    }

    /// A fresh search view using the configured page size
    pub fn search_view(&self, kind: Option<ListingKind>) -> SearchView {
        SearchView::new(kind, self.options.page_size)
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{AuthState, GateDecision, Session, SessionEvent, SessionStore, UserProfile};
    pub use crate::chat::ChatPanel;
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::favorites::FavoriteSet;
    pub use crate::properties::{ListingKind, SearchFilters, SearchQuery, SearchView, Sort};
    pub use crate::valuation::{PropertyType, ValuationWizard};
    pub use crate::Aqarak;
}
