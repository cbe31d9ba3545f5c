use reqwest::Method;
use serde_json::json;

use super::{Continuation, PhaseRun};
use crate::context::Actor;
use crate::probe::{ApiRequest, Expect};

pub(super) async fn run(run: &mut PhaseRun<'_>) -> Continuation {
    let comment_id = run.ctx.comment_id().unwrap_or_default();
    let reactions = |method: Method, suffix: &str| {
        ApiRequest::new(method, format!("/api/comments/{{commentId}}/reactions{suffix}"))
            .path_param("commentId", comment_id)
    };

    let request = run.as_actor(Actor::A, reactions(Method::POST, "").json(json!({"type": "AGREE"})));
    run.check("Add Comment Reaction (AGREE)", request, Expect::ok()).await;

    let request = run.as_actor(Actor::A, reactions(Method::GET, "/counts"));
    run.check_with("Get Comment Reaction Counts", request, Expect::ok(), |ex| {
        match (ex.json_i64("/agree"), ex.json_i64("/disagree"), ex.json_i64("/total")) {
            (Some(agree), Some(disagree), Some(total)) => {
                Ok(format!("Counts: agree={agree}, disagree={disagree}, total={total}"))
            }
            _ => Ok(format!("Counts: {}", ex.text)),
        }
    })
    .await;

    let request = run.as_actor(Actor::A, reactions(Method::GET, "/me"));
    run.check("Get User's Comment Reaction", request, Expect::ok()).await;

    let request = run.as_actor(Actor::A, reactions(Method::DELETE, ""));
    run.check("Remove Comment Reaction", request, Expect::ok()).await;
    Continuation::Continue
}
