//! Wallet-holder authentication.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::query_types::non_empty;
use crate::state::AppState;

/// Body returned when the gate passes. Clients match on this text.
pub const AUTH_PASS: &str = "Auth Pass, You could see the secrect things now!";

/// Body returned for every other outcome.
pub const AUTH_UNPASS: &str = "Auth unPass";

#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    pub addr: Option<String>,
    pub msg: Option<String>,
    pub signature: Option<String>,
}

/// Verify that `addr` signed `msg` and holds enough shares of the gate
/// asset. Always 200; the outcome is in the `result` text.
///
/// GET /bodhi_auth?addr=A&msg=M&signature=S
pub async fn bodhi_auth(
    State(state): State<AppState>,
    Query(params): Query<AuthQuery>,
) -> Json<Value> {
    let pass = match (
        non_empty(&params.addr),
        params.msg.as_deref(),
        non_empty(&params.signature),
    ) {
        (Some(addr), Some(msg), Some(signature)) => {
            state.gate.authenticate(addr, msg, signature).await
        }
        _ => false,
    };

    info!(subsystem = "api", op = "bodhi_auth", success = pass, "Auth checked");
    let result = if pass { AUTH_PASS } else { AUTH_UNPASS };
    Json(json!({ "result": result }))
}
