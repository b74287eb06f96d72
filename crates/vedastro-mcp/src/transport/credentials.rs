//! Caller credential extraction.
//!
//! The credential is not checked here; it is forwarded to the VedAstro API,
//! which decides whether it lifts the free-tier limits.

use axum::http::{header, HeaderMap};

/// Header names consulted in priority order before `Authorization`.
const KEY_HEADERS: [&str; 2] = ["x-api-key", "apikey"];

/// First non-empty credential from `x-api-key`, `APIKey`, or
/// `Authorization: Bearer <token>`, trimmed.
pub fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    for name in KEY_HEADERS {
        if let Some(key) = header_value(headers, name) {
            return Some(key);
        }
    }

    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = (auth.get(..7)?, auth.get(7..)?);
    if !scheme.eq_ignore_ascii_case("bearer ") {
        return None;
    }

    Some(token.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_x_api_key_wins() {
        let h = headers(&[
            ("x-api-key", " first "),
            ("apikey", "second"),
            ("authorization", "Bearer third"),
        ]);
        assert_eq!(extract_api_key(&h).as_deref(), Some("first"));
    }

    #[test]
    fn test_blank_header_falls_through() {
        let h = headers(&[("x-api-key", "   "), ("apikey", "second")]);
        assert_eq!(extract_api_key(&h).as_deref(), Some("second"));
    }

    #[test]
    fn test_bearer_case_insensitive() {
        let h = headers(&[("authorization", "bEaReR  tok ")]);
        assert_eq!(extract_api_key(&h).as_deref(), Some("tok"));
    }

    #[test]
    fn test_non_bearer_ignored() {
        let h = headers(&[("authorization", "Basic abc")]);
        assert_eq!(extract_api_key(&h), None);
        assert_eq!(extract_api_key(&headers(&[("authorization", "Bearer ")])), None);
    }
}
