/// Session cookie parsing and rendering
///
/// The session token travels in an HttpOnly cookie. This module reads a
/// named cookie out of the request's `Cookie` headers and renders the
/// `Set-Cookie` values used to establish and clear a session.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "user_access_token";

/// Returns the value of cookie `name`, if present
///
/// All `Cookie` headers on the request are searched; the first match wins.
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|s| s.split(';'))
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Attributes applied to the session cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    pub name: String,
    /// Adds the `Secure` attribute (HTTPS deployments)
    pub secure: bool,
    /// Lifetime in seconds
    pub max_age_secs: i64,
}

impl CookiePolicy {
    pub fn new(max_age_secs: i64, secure: bool) -> Self {
        Self {
            name: SESSION_COOKIE.to_string(),
            secure,
            max_age_secs,
        }
    }

    /// `Set-Cookie` value establishing a session with `token`
    pub fn session(&self, token: &str) -> String {
        self.render(token, self.max_age_secs)
    }

    /// `Set-Cookie` value removing the session cookie
    pub fn clear(&self) -> String {
        format!(
            "{}; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            self.render("", 0)
        )
    }

    fn render(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; Max-Age={}; HttpOnly; SameSite=Lax; Path=/",
            self.name, value, max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_parse_cookie_finds_named_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; user_access_token=abc.def.ghi; lang=en"),
        );

        assert_eq!(
            parse_cookie(&headers, SESSION_COOKIE),
            Some("abc.def.ghi".to_string())
        );
        assert_eq!(parse_cookie(&headers, "lang"), Some("en".to_string()));
        assert_eq!(parse_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_parse_cookie_across_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("user_access_token=tok"));

        assert_eq!(parse_cookie(&headers, SESSION_COOKIE), Some("tok".to_string()));
    }

    #[test]
    fn test_parse_cookie_no_header() {
        assert_eq!(parse_cookie(&HeaderMap::new(), SESSION_COOKIE), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let policy = CookiePolicy::new(3600, false);
        let cookie = policy.session("tok");

        assert!(cookie.starts_with("user_access_token=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(!cookie.contains("Secure"));

        assert!(CookiePolicy::new(3600, true).session("tok").ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = CookiePolicy::new(3600, false).clear();

        assert!(cookie.starts_with("user_access_token=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    }
}
