pub mod session;

use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::CookieJar;

use crate::error::ApiError;

pub use session::{decode_session, did_from_access_token, SessionData};

pub const DID_HEADER: &str = "x-atproto-did";
pub const SERVICE_HEADER: &str = "x-atproto-pds";

/// Everything a request supplies to reach the upstream on the caller's behalf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestCredentials {
    pub access_token: String,
    pub did: Option<String>,
    /// Service URL override, not yet normalized
    pub service_url: Option<String>,
}

/// Explicit overrides from the query string
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides<'a> {
    pub did: Option<&'a str>,
    pub service_url: Option<&'a str>,
}

/// Token from an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Resolve the access credential, account DID and service override for a request.
///
/// The bearer header wins over the session cookie for the token. The DID comes
/// from the query, a header, the session, then the token's subject; the service
/// URL from the query, a header, then the session.
pub fn resolve_credentials(
    headers: &HeaderMap,
    jar: &CookieJar,
    session_cookie: &str,
    overrides: Overrides<'_>,
) -> Result<RequestCredentials, ApiError> {
    let session = jar
        .get(session_cookie)
        .map(|cookie| decode_session(cookie.value()))
        .unwrap_or_default();

    let access_token = bearer_token(headers)
        .or_else(|| session.access_token.clone())
        .ok_or(ApiError::MissingCredential)?;

    let did = non_empty(overrides.did)
        .or_else(|| header_value(headers, DID_HEADER))
        .or_else(|| session.did.clone())
        .or_else(|| did_from_access_token(&access_token));

    let service_url = non_empty(overrides.service_url)
        .or_else(|| header_value(headers, SERVICE_HEADER))
        .or(session.service_url);

    Ok(RequestCredentials {
        access_token,
        did,
        service_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn jar_with(value: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new("session", value.to_string()))
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(
            bearer_token(&headers(&[("authorization", "bearer abc")])).as_deref(),
            Some("abc")
        );
        assert_eq!(
            bearer_token(&headers(&[("authorization", "Bearer   xyz ")])).as_deref(),
            Some("xyz")
        );
        assert_eq!(bearer_token(&headers(&[("authorization", "Basic abc")])), None);
        assert_eq!(bearer_token(&headers(&[("authorization", "Bearer ")])), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn missing_everything_is_missing_credential() {
        let result = resolve_credentials(
            &HeaderMap::new(),
            &CookieJar::new(),
            "session",
            Overrides::default(),
        );
        assert!(matches!(result, Err(ApiError::MissingCredential)));
    }

    #[test]
    fn bearer_header_beats_session_token() {
        let jar = jar_with(r#"{"accessJwt": "from-cookie", "did": "did:plc:cookie"}"#);
        let creds = resolve_credentials(
            &headers(&[("authorization", "Bearer from-header")]),
            &jar,
            "session",
            Overrides::default(),
        )
        .unwrap();

        assert_eq!(creds.access_token, "from-header");
        assert_eq!(creds.did.as_deref(), Some("did:plc:cookie"));
    }

    #[test]
    fn session_cookie_supplies_token_and_service() {
        let jar = jar_with(r#"{"token": "tok", "pdsUrl": "https://pds.example.com"}"#);
        let creds =
            resolve_credentials(&HeaderMap::new(), &jar, "session", Overrides::default()).unwrap();

        assert_eq!(creds.access_token, "tok");
        assert_eq!(creds.service_url.as_deref(), Some("https://pds.example.com"));
        assert_eq!(creds.did, None);
    }

    #[test]
    fn overrides_take_precedence() {
        let jar = jar_with(r#"{"token": "tok", "did": "did:plc:cookie", "service": "cookie.example"}"#);
        let creds = resolve_credentials(
            &headers(&[(DID_HEADER, "did:plc:header"), (SERVICE_HEADER, "header.example")]),
            &jar,
            "session",
            Overrides {
                did: Some("did:plc:query"),
                service_url: Some("  "),
            },
        )
        .unwrap();

        assert_eq!(creds.did.as_deref(), Some("did:plc:query"));
        assert_eq!(creds.service_url.as_deref(), Some("header.example"));
    }
}
