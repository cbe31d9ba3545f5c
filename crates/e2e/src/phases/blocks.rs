//! Blocking. While A blocks B, the backend must refuse B's attempt to follow
//! A; a success status there is a failure.

use super::bookmarks::expect_flag;
use super::{Continuation, PhaseRun};
use crate::context::Actor;
use crate::probe::{ApiRequest, Expect};

pub(super) async fn run(run: &mut PhaseRun<'_>) -> Continuation {
    let a_id = run.ctx.user_id(Actor::A).unwrap_or_default();
    let b_id = run.ctx.user_id(Actor::B).unwrap_or_default();

    let request = run.as_actor(
        Actor::A,
        ApiRequest::post("/api/blocks/{userId}").path_param("userId", b_id),
    );
    run.check("Block User", request, Expect::ok()).await;

    let request = run.as_actor(
        Actor::A,
        ApiRequest::get("/api/blocks/{userId}/status").path_param("userId", b_id),
    );
    run.check_with("Check Block Status", request, Expect::ok(), |ex| {
        expect_flag(ex.json_bool("/isBlocked"), true, "Is blocked")
    })
    .await;

    let request = run.as_actor(Actor::A, ApiRequest::get("/api/blocks").page(0, run.page_size()));
    run.check_with("Get Blocked Users List", request, Expect::ok(), |ex| {
        let found = ex.items().len();
        if ex.contains_id(b_id) {
            Ok(format!("Found {found} blocked users"))
        } else {
            Err(format!("user {b_id} not among {found} blocked users"))
        }
    })
    .await;

    let request = run.as_actor(
        Actor::B,
        ApiRequest::post("/follow/{userId}").path_param("userId", a_id),
    );
    run.check("Blocked Follow Prevention", request, Expect::rejected())
        .await;

    let request = run.as_actor(
        Actor::A,
        ApiRequest::delete("/api/blocks/{userId}").path_param("userId", b_id),
    );
    run.check("Unblock User", request, Expect::ok()).await;
    Continuation::Continue
}
