use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{EncodingKey, Header, encode};
use portal_guard::{DecodedRole, Role, decode_role};
use serde_json::json;

// --- Helper Functions ---

/// Builds an unsigned-looking token around an arbitrary JSON payload.
fn token_with_payload(payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.not-a-real-signature")
}

fn token_with_role(role: &str) -> String {
    token_with_payload(&json!({ "sub": "42", "role": role }))
}

// --- Tests ---

#[test]
fn test_malformed_tokens_decode_to_no_role() {
    let not_json = format!("x.{}.y", URL_SAFE_NO_PAD.encode("plain text, not json"));
    let array_payload = format!("x.{}.y", URL_SAFE_NO_PAD.encode("[1,2,3]"));

    let cases = [
        None,
        Some(""),
        Some("single-segment"),
        Some("header.%%%not-base64%%%.sig"),
        Some("header.a.sig"),
        Some(not_json.as_str()),
        Some(array_payload.as_str()),
    ];

    for token in cases {
        assert_eq!(decode_role(token), None, "token {token:?} should carry no role");
    }
}

#[test]
fn test_missing_or_non_text_role_is_no_role() {
    assert_eq!(decode_role(Some(&token_with_payload(&json!({ "sub": "1" })))), None);
    assert_eq!(decode_role(Some(&token_with_payload(&json!({ "role": 7 })))), None);
    assert_eq!(decode_role(Some(&token_with_payload(&json!({ "role": null })))), None);
    assert_eq!(decode_role(Some(&token_with_role(""))), None);
}

#[test]
fn test_role_normalization_ignores_case_and_punctuation() {
    assert_eq!(
        decode_role(Some(&token_with_role("Admin!!"))),
        Some(DecodedRole::Canonical(Role::Admin))
    );
    assert_eq!(
        decode_role(Some(&token_with_role(" SHOW-room "))),
        Some(DecodedRole::Canonical(Role::Showroom))
    );
}

#[test]
fn test_role_aliases_map_to_canonical_roles() {
    for raw in ["office", "officeadmin", "officeAdmin", "Office_Admin"] {
        assert_eq!(
            decode_role(Some(&token_with_role(raw))),
            Some(DecodedRole::Canonical(Role::OfficeAdmin)),
            "{raw} should be an office admin"
        );
    }
    assert_eq!(
        decode_role(Some(&token_with_role("customer"))),
        Some(DecodedRole::Canonical(Role::Showroom))
    );
}

#[test]
fn test_unrecognized_role_keeps_raw_text() {
    assert_eq!(
        decode_role(Some(&token_with_role("superuser"))),
        Some(DecodedRole::Unrecognized("superuser".to_string()))
    );
    // Raw text is returned as issued, not normalized.
    assert_eq!(
        decode_role(Some(&token_with_role("Super User!"))),
        Some(DecodedRole::Unrecognized("Super User!".to_string()))
    );
    // Only punctuation still counts as a present, unroutable role.
    assert_eq!(
        decode_role(Some(&token_with_role("!!!"))),
        Some(DecodedRole::Unrecognized("!!!".to_string()))
    );
}

#[test]
fn test_payload_needing_padding_and_url_safe_characters() {
    // "?" and ">" push the encoding into the '-' and '_' characters of base64url.
    for role in ["admin", "admin?", "admin>>", "admin???"] {
        let token = token_with_payload(&json!({ "role": role, "note": ">>>???" }));
        let payload = token.split('.').nth(1).unwrap();
        assert!(!payload.ends_with('='));
        assert_eq!(
            decode_role(Some(&token)),
            Some(DecodedRole::Canonical(Role::Admin)),
            "payload {payload} should decode"
        );
    }
}

#[test]
fn test_token_signed_by_real_issuer_decodes_without_key() {
    #[derive(serde::Serialize)]
    struct IssuedClaims {
        sub: String,
        role: String,
        exp: usize,
    }

    let claims = IssuedClaims {
        sub: "user-1".to_string(),
        role: "officeAdmin".to_string(),
        exp: 4_102_444_800,
    };
    let key = EncodingKey::from_secret(b"issuer-secret-the-guard-never-sees");
    let token = encode(&Header::default(), &claims, &key).unwrap();

    assert_eq!(
        decode_role(Some(&token)),
        Some(DecodedRole::Canonical(Role::OfficeAdmin))
    );
}

#[test]
fn test_two_segments_are_enough() {
    let token = token_with_role("showroom");
    let without_signature = token.rsplit_once('.').unwrap().0;
    assert_eq!(
        decode_role(Some(without_signature)),
        Some(DecodedRole::Canonical(Role::Showroom))
    );
}

#[test]
fn test_role_text_forms() {
    assert_eq!("officeAdmin".parse::<Role>(), Ok(Role::OfficeAdmin));
    assert!("office".parse::<Role>().is_err());
    assert_eq!(Role::Showroom.to_string(), "showroom");
    assert_eq!(
        DecodedRole::Unrecognized("superuser".into()).as_str(),
        "superuser"
    );
    assert_eq!(DecodedRole::Canonical(Role::Admin).canonical(), Some(Role::Admin));
}
