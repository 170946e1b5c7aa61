//! Authentication and user management for Aqarak

mod gate;
mod session;
mod types;

use log::{debug, warn};
use reqwest::Client;
use std::collections::HashMap;

use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::{Fetch, FetchBuilder};

pub use gate::*;
pub use session::*;
pub use types::*;

/// Client for login, registration and the user profile
pub struct Auth {
    /// The base URL of the API
    url: String,

    /// HTTP client used for requests
    client: Client,

    /// The shared session
    session: SessionStore,

    /// Client options
    options: ClientOptions,
}

impl Auth {
    /// Create a new Auth client
    pub(crate) fn new(url: &str, client: Client, session: SessionStore, options: ClientOptions) -> Self {
        Self {
            url: url.to_string(),
            client,
            session,
            options,
        }
    }

    fn get_url(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }

    fn with_defaults<'a>(&self, fetch: FetchBuilder<'a>) -> FetchBuilder<'a> {
        fetch
            .header("X-Client-Info", &self.options.client_info)
            .timeout(self.options.request_timeout)
    }

    /// The session this client reads and writes
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Sign in with email and password.
    ///
    /// The credentials are exchanged for a bearer token, then the profile is
    /// fetched with that token. A failed profile fetch does not fail the
    /// login; the session gets a placeholder profile instead.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, Error> {
        let url = self.get_url("/auth/token");

        let token = self
            .with_defaults(Fetch::post(&self.client, &url))
            .form(&[("username", email), ("password", password)])
            .execute::<TokenResponse>()
            .await?;

        let user = match self.fetch_profile(&token.access_token).await {
            Ok(user) => user,
            Err(err) => {
                warn!("Failed to fetch user details after login: {}", err);
                UserProfile::placeholder(email)
            }
        };

        let session = Session {
            access_token: token.access_token,
            token_type: token.token_type,
            user,
        };
        self.session.set(session.clone());
        debug!("Signed in as {}", session.user.email);

        Ok(session)
    }

    /// Create an account, then sign in with it
    pub async fn register(&self, request: &RegisterRequest) -> Result<Session, Error> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(Error::validation("Email and password are required"));
        }

        let url = self.get_url("/auth/register");

        self.with_defaults(Fetch::post(&self.client, &url))
            .json(request)?
            .execute_empty()
            .await?;

        self.login(&request.email, &request.password).await
    }

    /// Sign out. The token is simply forgotten; the server keeps no session.
    pub fn logout(&self) {
        self.session.clear();
    }

    /// Fetch the profile of the signed-in user without touching the cache
    pub async fn get_user(&self) -> Result<UserProfile, Error> {
        if !self.session.is_authenticated() {
            return Err(Error::auth("Not logged in"));
        }

        let url = self.get_url("/users/me");
        self.with_defaults(Fetch::get(&self.client, &url))
            .session(&self.session)
            .execute::<UserProfile>()
            .await
    }

    /// Re-fetch the profile into the session.
    ///
    /// Does nothing when signed out. Failures are logged and leave the cached
    /// profile as it was.
    pub async fn refresh_user(&self) -> Option<UserProfile> {
        if !self.session.is_authenticated() {
            return None;
        }

        match self.get_user().await {
            Ok(user) => {
                self.session.update_user(user.clone());
                Some(user)
            }
            Err(err) => {
                warn!("Failed to refresh user: {}", err);
                None
            }
        }
    }

    /// Update the name and/or password, then refresh the cached profile
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), Error> {
        if !self.session.is_authenticated() {
            return Err(Error::auth("Not logged in"));
        }
        if update.is_empty() {
            return Ok(());
        }

        let url = self.get_url("/users/me");
        self.with_defaults(Fetch::patch(&self.client, &url))
            .session(&self.session)
            .json(update)?
            .execute_empty()
            .await?;

        self.refresh_user().await;
        Ok(())
    }

    /// Ask the server to email a password reset link
    pub async fn forgot_password(&self, email: &str) -> Result<(), Error> {
        let url = self.get_url("/auth/forgot-password");

        let mut body = HashMap::new();
        body.insert("email", email);

        self.with_defaults(Fetch::post(&self.client, &url))
            .json(&body)?
            .execute_empty()
            .await
    }

    /// Confirm an email address with the token from the verification link
    pub async fn verify_email(&self, token: &str) -> Result<(), Error> {
        let url = self.get_url("/auth/verify-email");

        self.with_defaults(Fetch::get(&self.client, &url))
            .query([("token", token)])
            .execute_empty()
            .await
    }

    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, Error> {
        let url = self.get_url("/users/me");
        self.with_defaults(Fetch::get(&self.client, &url))
            .bearer_auth(token)
            .execute::<UserProfile>()
            .await
    }
}
