use axum::{
    extract::{OriginalUri, Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use super::cookie::{expired_cookie, looks_like_token, read_cookie};
use super::extractors::AppState;

pub const ADMIN_HOME_PATH: &str = "/admin";
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";

#[derive(Debug, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    RedirectToLogin,
    RedirectToAdmin,
}

/// Decides what the edge does with a request, looking only at the path
/// and at whether the auth cookie is shaped like a token.
pub fn decide(path: &str, has_token_shaped_cookie: bool) -> GateDecision {
    let is_admin_page = path == ADMIN_HOME_PATH || path.starts_with("/admin/");
    if !is_admin_page || is_static_asset(path) {
        return GateDecision::Pass;
    }

    let is_login = path == ADMIN_LOGIN_PATH || path.starts_with("/admin/login/");
    match (is_login, has_token_shaped_cookie) {
        (false, false) => GateDecision::RedirectToLogin,
        (true, true) => GateDecision::RedirectToAdmin,
        _ => GateDecision::Pass,
    }
}

// Scripts, styles and images of the admin bundle load before login.
fn is_static_asset(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or_default();
    match last.rsplit_once('.') {
        Some((_, extension)) => !extension.eq_ignore_ascii_case("html"),
        None => false,
    }
}

/// Edge gate for the admin UI. Full verification happens in the API guards.
/// A cookie that is present but not shaped like a token is deleted.
pub async fn admin_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let auth = &state.config.auth;
    let cookie = read_cookie(request.headers(), &auth.cookie_name);
    let has_token = cookie.as_deref().map(looks_like_token).unwrap_or(false);
    let malformed_cookie = cookie.is_some() && !has_token;

    // Nested services see a stripped path; decide on the one the client sent.
    let path = match request.extensions().get::<OriginalUri>() {
        Some(original) => original.path().to_string(),
        None => request.uri().path().to_string(),
    };

    let mut response = match decide(&path, has_token) {
        GateDecision::Pass => next.run(request).await,
        GateDecision::RedirectToLogin => {
            debug!("Redirecting unauthenticated request for {} to login", path);
            Redirect::temporary(ADMIN_LOGIN_PATH).into_response()
        }
        GateDecision::RedirectToAdmin => Redirect::temporary(ADMIN_HOME_PATH).into_response(),
    };

    if malformed_cookie {
        if let Ok(clear) = HeaderValue::from_str(&expired_cookie(&auth.cookie_name, auth.cookie_secure)) {
            response.headers_mut().append(header::SET_COOKIE, clear);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_admin_paths_pass() {
        assert_eq!(decide("/", false), GateDecision::Pass);
        assert_eq!(decide("/api/projects", false), GateDecision::Pass);
        assert_eq!(decide("/administrator", false), GateDecision::Pass);
    }

    #[test]
    fn test_admin_pages_require_token_shaped_cookie() {
        assert_eq!(decide("/admin", false), GateDecision::RedirectToLogin);
        assert_eq!(decide("/admin/projects", false), GateDecision::RedirectToLogin);
        assert_eq!(decide("/admin/index.html", false), GateDecision::RedirectToLogin);
        assert_eq!(decide("/admin/projects", true), GateDecision::Pass);
    }

    #[test]
    fn test_login_page_is_open_and_bounces_signed_in_admins() {
        assert_eq!(decide("/admin/login", false), GateDecision::Pass);
        assert_eq!(decide("/admin/login", true), GateDecision::RedirectToAdmin);
    }

    #[test]
    fn test_bundle_assets_pass_without_cookie() {
        assert_eq!(decide("/admin/assets/app.js", false), GateDecision::Pass);
        assert_eq!(decide("/admin/favicon.ico", false), GateDecision::Pass);
    }
}
