//! Cookie plumbing for the two persisted slots.
//!
//! The portal keeps two independent pieces of browser-scoped state:
//! - `mrp_session`: a v4 UUID keying the server-side result slot. HttpOnly;
//!   issued on first upload.
//! - `mrp_theme`: the theme preference, readable by the page itself.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use mrp_types::Theme;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "mrp_session";
pub const THEME_COOKIE: &str = "mrp_theme";

/// Extracts a named cookie value from the request headers.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// The caller's session id, when a valid one is presented.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    cookie_value(headers, SESSION_COOKIE).and_then(|raw| Uuid::parse_str(&raw).ok())
}

/// The caller's theme preference; defaults to light.
pub fn theme(headers: &HeaderMap) -> Theme {
    cookie_value(headers, THEME_COOKIE)
        .map(|raw| Theme::parse(&raw))
        .unwrap_or_default()
}

/// `Set-Cookie` value binding the session id. HttpOnly: the page never
/// needs to read it.
pub fn session_cookie(session: Uuid) -> String {
    format!("{SESSION_COOKIE}={session}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value persisting the theme preference for a year.
pub fn theme_cookie(theme: Theme) -> String {
    format!(
        "{THEME_COOKIE}={}; Path=/; SameSite=Lax; Max-Age=31536000",
        theme.as_str()
    )
}
