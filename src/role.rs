use std::{fmt, str::FromStr};

use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde_json::Value;
use thiserror::Error;

/// Role
///
/// The closed, ordered set of canonical roles the portal routes on.
/// A role is never stored on its own: it is derived again from the credential
/// at every decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Admin,
    OfficeAdmin,
    Showroom,
}

impl Role {
    /// Every canonical role, in order.
    pub const ALL: [Role; 3] = [Role::Admin, Role::OfficeAdmin, Role::Showroom];

    /// The canonical identifier, as issuers are expected to spell it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::OfficeAdmin => "officeAdmin",
            Role::Showroom => "showroom",
        }
    }

    /// home
    ///
    /// The RoleHomeTable: the landing path for an authenticated user of this role.
    /// The match is exhaustive, so every role has exactly one home.
    pub fn home(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::OfficeAdmin => "/office-admin",
            Role::Showroom => "/showroom-account",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown canonical role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// DecodedRole
///
/// What a readable credential says about its bearer. An unrecognized role is kept
/// verbatim so that "authenticated with a role we do not route" stays distinct from
/// "no role at all".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DecodedRole {
    Canonical(Role),
    Unrecognized(String),
}

impl DecodedRole {
    pub fn canonical(&self) -> Option<Role> {
        match self {
            DecodedRole::Canonical(role) => Some(*role),
            DecodedRole::Unrecognized(_) => None,
        }
    }

    /// Text form: the canonical identifier, or the raw claim.
    pub fn as_str(&self) -> &str {
        match self {
            DecodedRole::Canonical(role) => role.as_str(),
            DecodedRole::Unrecognized(raw) => raw,
        }
    }
}

/// CredentialError
///
/// Reasons a credential could not be read. These never leave this module:
/// `decode_role` logs them and answers "no role".
#[derive(Debug, Error)]
pub(crate) enum CredentialError {
    #[error("credential has no payload segment")]
    MissingPayload,
    #[error("payload is not base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("role claim is missing or not text")]
    RoleNotText,
}

// Lenient about trailing bits and padding, like a browser's atob.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// decode_role
///
/// Reads the `role` claim out of an unverified `header.payload.signature` token.
///
/// The signature is never checked. Every failure (empty token, missing payload,
/// bad base64, non-JSON, no textual `role`) yields `None`; nothing panics and no
/// error reaches the caller.
pub fn decode_role(token: Option<&str>) -> Option<DecodedRole> {
    let token = token.filter(|t| !t.is_empty())?;

    match read_role_claim(token) {
        Ok(raw) => classify(&raw),
        Err(e) => {
            tracing::debug!(error = %e, "unreadable credential treated as roleless");
            None
        }
    }
}

fn read_role_claim(token: &str) -> Result<String, CredentialError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or(CredentialError::MissingPayload)?;

    let bytes = PAYLOAD_ENGINE.decode(to_padded_base64(payload))?;
    let claims: Value = serde_json::from_slice(&bytes)?;
    let claims = claims.as_object().ok_or(CredentialError::NotAnObject)?;

    claims
        .get("role")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(CredentialError::RoleNotText)
}

/// Converts a base64url segment to padded standard base64.
fn to_padded_base64(segment: &str) -> String {
    let mut b64: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    match b64.len() % 4 {
        2 => b64.push_str("=="),
        3 => b64.push('='),
        _ => {}
    }
    b64
}

fn classify(raw: &str) -> Option<DecodedRole> {
    let normalized: String = raw
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    let role = match normalized.as_str() {
        "admin" => Role::Admin,
        "officeadmin" | "office" => Role::OfficeAdmin,
        "showroom" | "customer" => Role::Showroom,
        _ if raw.is_empty() => return None,
        _ => return Some(DecodedRole::Unrecognized(raw.to_string())),
    };
    Some(DecodedRole::Canonical(role))
}
