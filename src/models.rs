use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::policy::{Action, GuardState};

// --- Wire Schemas (exported to the front-end as TypeScript) ---

/// ActionKind
///
/// Whether a navigation may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ActionKind {
    Continue,
    Redirect,
}

/// EvaluationResponse
///
/// The edge decision for one path, as returned by `GET /guard/evaluate`. Lets an
/// out-of-process edge consult the exact policy the in-process guard applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct EvaluationResponse {
    pub action: ActionKind,
    // Redirect target; absent when the navigation continues.
    pub location: Option<String>,
    // "anonymous", "authenticated" or "unknown_role".
    pub state: String,
    // Canonical role, when the credential carries one.
    pub role: Option<String>,
}

impl EvaluationResponse {
    pub fn new(action: Action, state: GuardState) -> Self {
        let (action, location) = match action {
            Action::Continue => (ActionKind::Continue, None),
            Action::RedirectTo(target) => (ActionKind::Redirect, Some(target)),
        };

        Self {
            action,
            location,
            state: state.label().to_string(),
            role: state.role().map(|r| r.as_str().to_string()),
        }
    }
}

/// AreaLanding
///
/// What an area route answers once every guard has let the caller in. Page
/// rendering happens elsewhere; this only confirms the pass-through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AreaLanding {
    pub area: String,
    pub role: Option<String>,
}

/// Query parameters for `GET /guard/evaluate`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct EvaluateQuery {
    /// The path the client is about to navigate to.
    pub path: String,
}
