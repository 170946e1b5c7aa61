//! Configuration options for the Aqarak client

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the API base URL
pub const ENV_API_URL: &str = "AQARAK_API_URL";

/// Environment variable holding the request timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "AQARAK_TIMEOUT_SECS";

/// Environment variable holding the session file path
pub const ENV_SESSION_FILE: &str = "AQARAK_SESSION_FILE";

/// Page size used by listing views
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Configuration options for the Aqarak client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Number of properties per search page
    pub page_size: u32,

    /// Whether the session survives a restart
    pub persist_session: bool,

    /// Where the session is stored when persisted
    pub session_path: Option<PathBuf>,

    /// Value sent in the `X-Client-Info` header
    pub client_info: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            page_size: DEFAULT_PAGE_SIZE,
            persist_session: false,
            session_path: None,
            client_info: format!("aqarak-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientOptions {
    /// Build options from `AQARAK_*` environment variables.
    ///
    /// Unset or unparsable values keep their defaults. A session file turns
    /// on session persistence.
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Ok(secs) = env::var(ENV_TIMEOUT_SECS) {
            match secs.trim().parse::<u64>() {
                Ok(0) => options.request_timeout = None,
                Ok(secs) => options.request_timeout = Some(Duration::from_secs(secs)),
                Err(_) => log::warn!("Ignoring invalid {}: {}", ENV_TIMEOUT_SECS, secs),
            }
        }

        if let Ok(path) = env::var(ENV_SESSION_FILE) {
            if !path.trim().is_empty() {
                options = options.with_session_path(path.trim());
            }
        }

        options
    }

    /// Base URL from the environment, if set
    pub fn api_url_from_env() -> Option<String> {
        env::var(ENV_API_URL)
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the search page size
    pub fn with_page_size(mut self, value: u32) -> Self {
        self.page_size = value.max(1);
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Persist the session to the given file
    pub fn with_session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = Some(path.into());
        self.persist_session = true;
        self
    }

    /// Set the client info header value
    pub fn with_client_info(mut self, value: &str) -> Self {
        self.client_info = value.to_string();
        self
    }
}
