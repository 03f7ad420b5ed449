use axum::http::{header, HeaderMap, HeaderValue};
use chrono::Duration;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Value of a named cookie from the `Cookie` request headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; HttpOnly; Path=/; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn append(headers: &mut HeaderMap, cookie: String) {
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.append(header::SET_COOKIE, value);
    }
}

/// `Set-Cookie` headers carrying a freshly issued token pair
pub fn auth_cookies(
    access_token: &str,
    access_ttl: Duration,
    refresh_token: &str,
    refresh_ttl: Duration,
    secure: bool,
) -> HeaderMap {
    let mut headers = HeaderMap::new();
    append(
        &mut headers,
        cookie(ACCESS_TOKEN_COOKIE, access_token, access_ttl.num_seconds(), secure),
    );
    append(
        &mut headers,
        cookie(REFRESH_TOKEN_COOKIE, refresh_token, refresh_ttl.num_seconds(), secure),
    );
    headers
}

/// Expire both auth cookies
pub fn clear_auth_cookies(secure: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    append(&mut headers, cookie(ACCESS_TOKEN_COOKIE, "", 0, secure));
    append(&mut headers, cookie(REFRESH_TOKEN_COOKIE, "", 0, secure));
    headers
}
