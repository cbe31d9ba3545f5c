//! Follow graph. The phase ends with the follow edge removed, so the block
//! phase's follow attempt is a fresh follow and not a duplicate.

use super::{Continuation, PhaseRun};
use crate::context::Actor;
use crate::probe::{ApiRequest, Expect};

pub(super) async fn run(run: &mut PhaseRun<'_>) -> Continuation {
    let a_id = run.ctx.user_id(Actor::A).unwrap_or_default();
    let b_id = run.ctx.user_id(Actor::B).unwrap_or_default();
    let size = run.page_size();

    let request = run.as_actor(
        Actor::B,
        ApiRequest::post("/follow/{userId}").path_param("userId", a_id),
    );
    run.check("Follow User", request, Expect::ok()).await;

    let request = run.as_actor(
        Actor::A,
        ApiRequest::get("/follow/{userId}/followers")
            .path_param("userId", a_id)
            .page(0, size),
    );
    run.check_with("Get Followers", request, Expect::ok(), |ex| {
        Ok(format!("Found {} followers", ex.items().len()))
    })
    .await;

    let request = run.as_actor(
        Actor::B,
        ApiRequest::get("/follow/{userId}/following")
            .path_param("userId", b_id)
            .page(0, size),
    );
    run.check_with("Get Following", request, Expect::ok(), |ex| {
        Ok(format!("Found {} following", ex.items().len()))
    })
    .await;

    let request = run.as_actor(
        Actor::B,
        ApiRequest::delete("/follow/{userId}").path_param("userId", a_id),
    );
    run.check("Unfollow User", request, Expect::ok()).await;
    Continuation::Continue
}
