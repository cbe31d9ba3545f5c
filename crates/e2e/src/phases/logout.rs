use serde_json::json;

use super::{Continuation, PhaseRun};
use crate::context::{Actor, ContextField};
use crate::probe::{ApiRequest, Expect};

/// Best effort: each logout runs only when its actor still holds tokens.
pub(super) async fn run(run: &mut PhaseRun<'_>) -> Continuation {
    let name = "Logout (Single Device)";
    if run.require(name, &[ContextField::Token(Actor::B), ContextField::RefreshToken(Actor::B)]) {
        let request = run.as_actor(
            Actor::B,
            ApiRequest::post("/auth/logout").json(json!({
                "refreshToken": run.ctx.refresh_token(Actor::B),
            })),
        );
        run.check(name, request, Expect::ok()).await;
    }

    let name = "Logout All Devices";
    if run.require(name, &[ContextField::Token(Actor::A)]) {
        let request = run.as_actor(Actor::A, ApiRequest::post("/auth/logout-all"));
        run.check(name, request, Expect::ok()).await;
    }
    Continuation::Continue
}
