//! Route protection for views that need a signed-in user

use super::session::AuthState;

/// Path of the login view
pub const LOGIN_PATH: &str = "/login";

/// Where to go after login when no destination was captured
pub const HOME_PATH: &str = "/";

/// What a protected view should do for the current auth state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The session is still loading; show a spinner
    Placeholder,
    /// Show the protected content
    Render,
    /// Send the user to the login view, remembering where they wanted to go
    RedirectToLogin { from: String },
}

impl GateDecision {
    /// Target path of a redirect, if any
    pub fn redirect_path(&self) -> Option<&'static str> {
        match self {
            GateDecision::RedirectToLogin { .. } => Some(LOGIN_PATH),
            _ => None,
        }
    }
}

/// Decide how to handle a request for a protected destination
pub fn guard(state: AuthState, destination: &str) -> GateDecision {
    match state {
        AuthState::Loading => GateDecision::Placeholder,
        AuthState::Authenticated => GateDecision::Render,
        AuthState::Unauthenticated => GateDecision::RedirectToLogin {
            from: destination.to_string(),
        },
    }
}

/// Where to send the user after a successful login.
///
/// Only local paths are honored, and bouncing back to the login view itself
/// is replaced with the home page.
pub fn post_login_target(from: Option<&str>) -> String {
    match from {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !is_login(path) => {
            path.to_string()
        }
        _ => HOME_PATH.to_string(),
    }
}

fn is_login(path: &str) -> bool {
    path == LOGIN_PATH
        || path.starts_with(&format!("{}?", LOGIN_PATH))
        || path.starts_with(&format!("{}/", LOGIN_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_shows_placeholder() {
        assert_eq!(guard(AuthState::Loading, "/my-listings"), GateDecision::Placeholder);
    }

    #[test]
    fn authenticated_renders() {
        assert_eq!(guard(AuthState::Authenticated, "/saved"), GateDecision::Render);
    }

    #[test]
    fn unauthenticated_redirects_with_destination() {
        let decision = guard(AuthState::Unauthenticated, "/properties/9/edit");
        assert_eq!(decision.redirect_path(), Some("/login"));
        assert_eq!(
            decision,
            GateDecision::RedirectToLogin {
                from: "/properties/9/edit".to_string()
            }
        );
    }

    #[test]
    fn post_login_target_falls_back_to_home() {
        assert_eq!(post_login_target(Some("/saved")), "/saved");
        assert_eq!(post_login_target(None), "/");
        assert_eq!(post_login_target(Some("/login")), "/");
        assert_eq!(post_login_target(Some("https://evil.example")), "/");
        assert_eq!(post_login_target(Some("//evil.example")), "/");
    }
}
