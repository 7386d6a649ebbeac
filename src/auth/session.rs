//! Session cookie and access token decoding
//!
//! Session cookies come from several client generations and are stored as
//! plain JSON, base64-wrapped JSON, or a bare token. Field names differ
//! between them, so every lookup walks a list of fallbacks.

use base64::prelude::*;
use serde_json::Value;

const TOKEN_FIELDS: &[&str] = &[
    "accessJwt",
    "access_jwt",
    "accessToken",
    "access_token",
    "token",
];
const DID_FIELDS: &[&str] = &["did", "sub"];
const SERVICE_FIELDS: &[&str] = &["pdsUrl", "pds_url", "service", "serviceEndpoint"];

/// Fields recovered from a session cookie
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub access_token: Option<String>,
    pub did: Option<String>,
    pub service_url: Option<String>,
}

/// Decode a (percent-decoded) session cookie value.
pub fn decode_session(raw: &str) -> SessionData {
    let raw = raw.trim();
    if raw.is_empty() {
        return SessionData::default();
    }

    if let Some(json) = parse_json_object(raw.as_bytes()).or_else(|| decode_base64_json(raw)) {
        return session_from_json(&json);
    }

    // Anything else is taken to be the token itself.
    SessionData {
        access_token: Some(raw.to_string()),
        ..SessionData::default()
    }
}

fn parse_json_object(bytes: &[u8]) -> Option<Value> {
    serde_json::from_slice::<Value>(bytes)
        .ok()
        .filter(Value::is_object)
}

fn decode_base64(raw: &str) -> Option<Vec<u8>> {
    [
        &BASE64_STANDARD,
        &BASE64_STANDARD_NO_PAD,
        &BASE64_URL_SAFE,
        &BASE64_URL_SAFE_NO_PAD,
    ]
    .into_iter()
    .find_map(|engine| engine.decode(raw).ok())
}

fn decode_base64_json(raw: &str) -> Option<Value> {
    decode_base64(raw).and_then(|bytes| parse_json_object(&bytes))
}

fn first_string(object: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|field| object.get(*field))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn session_from_json(json: &Value) -> SessionData {
    // Some clients nest the session one level down.
    let nested = json.get("session").filter(|v| v.is_object());
    let lookup = |fields: &[&str]| {
        first_string(json, fields).or_else(|| nested.and_then(|n| first_string(n, fields)))
    };

    SessionData {
        access_token: lookup(TOKEN_FIELDS),
        did: lookup(DID_FIELDS),
        service_url: lookup(SERVICE_FIELDS),
    }
}

/// Account DID from the `sub` claim of an access JWT.
///
/// The signature is not verified; the value is only a hint for the profile
/// lookup, and the upstream validates the token on every request.
pub fn did_from_access_token(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims = parse_json_object(&bytes)?;

    first_string(&claims, &["sub"]).filter(|sub| sub.starts_with("did:"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_json_session() {
        let session = decode_session(
            r#"{"accessJwt": "tok-1", "did": "did:plc:abc", "pdsUrl": "https://pds.example.com"}"#,
        );

        assert_eq!(session.access_token.as_deref(), Some("tok-1"));
        assert_eq!(session.did.as_deref(), Some("did:plc:abc"));
        assert_eq!(session.service_url.as_deref(), Some("https://pds.example.com"));
    }

    #[test]
    fn decodes_base64_json_with_fallback_field_names() {
        let json = r#"{"access_token": "tok-2", "service": "pds.example.com"}"#;

        for encoded in [
            BASE64_STANDARD.encode(json),
            BASE64_URL_SAFE_NO_PAD.encode(json),
        ] {
            let session = decode_session(&encoded);
            assert_eq!(session.access_token.as_deref(), Some("tok-2"));
            assert_eq!(session.did, None);
            assert_eq!(session.service_url.as_deref(), Some("pds.example.com"));
        }
    }

    #[test]
    fn decodes_nested_session_object() {
        let session = decode_session(r#"{"session": {"accessToken": "tok-3", "did": "did:web:x"}}"#);

        assert_eq!(session.access_token.as_deref(), Some("tok-3"));
        assert_eq!(session.did.as_deref(), Some("did:web:x"));
    }

    #[test]
    fn blank_fields_are_skipped() {
        let session = decode_session(r#"{"accessJwt": "  ", "token": "tok-4"}"#);
        assert_eq!(session.access_token.as_deref(), Some("tok-4"));
    }

    #[test]
    fn bare_value_is_a_token() {
        let session = decode_session("eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJ4In0.sig");
        assert_eq!(
            session.access_token.as_deref(),
            Some("eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJ4In0.sig")
        );

        assert_eq!(decode_session("   "), SessionData::default());
    }

    #[test]
    fn extracts_did_from_jwt_subject() {
        let payload = BASE64_URL_SAFE_NO_PAD.encode(r#"{"sub": "did:plc:abc", "scope": "x"}"#);
        let token = format!("header.{payload}.signature");

        assert_eq!(did_from_access_token(&token).as_deref(), Some("did:plc:abc"));
        assert_eq!(did_from_access_token("not-a-jwt"), None);

        let handle_only = BASE64_URL_SAFE_NO_PAD.encode(r#"{"sub": "alice.test"}"#);
        assert_eq!(did_from_access_token(&format!("h.{handle_only}.s")), None);
    }
}
