//! HTTP request helper shared by every resource client.
//!
//! `FetchBuilder` plays the part of the front-end's request and response
//! interceptors: when a [`SessionStore`] is attached, the bearer token is added
//! to the outgoing request and an HTTP 401 clears the session.

use log::{debug, warn};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    multipart, Client, Method, RequestBuilder, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use url::Url;

use crate::auth::SessionStore;
use crate::error::Error;

/// A file attached to a multipart request
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Form field name
    pub field: String,
    /// File name reported to the server
    pub file_name: String,
    /// MIME type of the content
    pub mime_type: String,
    /// Raw file content
    pub data: Vec<u8>,
}

enum Body {
    Json(Vec<u8>),
    Form(Vec<(String, String)>),
    Multipart(FilePart),
}

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
    body: Option<Body>,
    timeout: Option<Duration>,
    session: Option<&'a SessionStore>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        Self {
            client,
            url: url.to_string(),
            method,
            headers: HeaderMap::new(),
            query_params: Vec::new(),
            body: None,
            timeout: None,
            session: None,
        }
    }

    /// Add a header to the request
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add bearer token authentication to the request
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Attach the session: its token authorizes the request and a 401 ends it
    pub fn session(mut self, session: &'a SessionStore) -> Self {
        self.session = Some(session);
        self
    }

    /// Limit how long the request may take
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add query parameters to the request, in order
    pub fn query<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query_params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(body)?;
        self.body = Some(Body::Json(json));
        Ok(self)
    }

    /// Add a form-encoded body to the request
    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        let fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.body = Some(Body::Form(fields));
        self
    }

    /// Add a multipart body holding a single file
    pub fn multipart(mut self, file: FilePart) -> Self {
        self.body = Some(Body::Multipart(file));
        self
    }

    /// Build the request, returning it with the session token that signed it
    fn build(self) -> Result<(RequestBuilder, Option<String>), Error> {
        let mut url = Url::parse(&self.url)?;

        if !self.query_params.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                query_pairs.append_pair(key, value);
            }
        }

        let mut headers = self.headers;
        let mut signed_with = None;
        if !headers.contains_key(AUTHORIZATION) {
            if let Some(token) = self.session.and_then(SessionStore::token) {
                if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                    headers.insert(AUTHORIZATION, value);
                    signed_with = Some(token);
                }
            }
        }

        debug!("{} {}", self.method, url.path());

        let mut req = self.client.request(self.method, url.as_str());

        req = match self.body {
            Some(Body::Json(json)) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                req.body(json)
            }
            Some(Body::Form(fields)) => req.form(&fields),
            Some(Body::Multipart(file)) => {
                let part = multipart::Part::bytes(file.data)
                    .file_name(file.file_name)
                    .mime_str(&file.mime_type)?;
                req.multipart(multipart::Form::new().part(file.field, part))
            }
            None => req,
        };

        req = req.headers(headers);

        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        Ok((req, signed_with))
    }

    /// Send the request, mapping non-success statuses to errors.
    ///
    /// A 401 ends the session only if it still holds the token the request
    /// was signed with.
    pub async fn send(self) -> Result<Response, Error> {
        let session = self.session;
        let (request, signed_with) = self.build()?;
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            if let (Some(session), Some(token)) = (session, signed_with.as_deref()) {
                if session.clear_if_token(token) {
                    warn!("Received 401, cleared session");
                } else {
                    debug!("Received 401 for a replaced session, keeping the current one");
                }
            }
        }

        let text = response.text().await.unwrap_or_default();
        Err(Error::from_response(status, &text))
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(self) -> Result<T, Error> {
        let response = self.send().await?;
        let result = response.json::<T>().await?;
        Ok(result)
    }

    /// Execute the request and discard the response body
    pub async fn execute_empty(self) -> Result<(), Error> {
        self.send().await?;
        Ok(())
    }
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a POST request
    pub fn post<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::POST)
    }

    /// Create a PATCH request
    pub fn patch<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::PATCH)
    }

    /// Create a DELETE request
    pub fn delete<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::DELETE)
    }
}
