use serde_json::{json, Value};

use super::{Continuation, PhaseRun};
use crate::context::{Actor, ContextField};
use crate::probe::{ApiRequest, Expect};

pub(super) async fn run(run: &mut PhaseRun<'_>) -> Continuation {
    let artwork_id = run.ctx.artwork_id().unwrap_or_default();

    // B comments on A's artwork
    let request = run.as_actor(
        Actor::B,
        ApiRequest::post("/artworks/{artworkId}/comments")
            .path_param("artworkId", artwork_id)
            .json(json!({"text": "Great artwork! Very insightful interpretation."})),
    );
    let exchange = run
        .check_with("Add Comment", request, Expect::created(), |ex| {
            Ok(format!("Comment ID: {}", display_id(ex.json_i64("/id"))))
        })
        .await;
    if exchange.passed() {
        run.ctx.set_comment_id(exchange.json_i64("/id"));
    }

    let request = run.as_actor(
        Actor::A,
        ApiRequest::get("/artworks/{artworkId}/comments").path_param("artworkId", artwork_id),
    );
    let exchange = run
        .check_with("Get Comments", request, Expect::ok(), |ex| {
            Ok(format!("Found {} comments", ex.items().len()))
        })
        .await;
    if exchange.passed() && run.ctx.comment_id().is_none() {
        let id = exchange
            .items()
            .first()
            .and_then(|c| c.get("id"))
            .and_then(Value::as_i64);
        run.ctx.set_comment_id(id);
    }

    // A replies to B's comment
    let name = "Add Reply to Comment";
    if run.require(name, &[ContextField::CommentId]) {
        let request = run.as_actor(
            Actor::A,
            ApiRequest::post("/artworks/{artworkId}/comments/{commentId}/replies")
                .path_param("artworkId", artwork_id)
                .path_param("commentId", run.ctx.comment_id().unwrap_or_default())
                .json(json!({"text": "I agree with your perspective!"})),
        );
        let exchange = run
            .check_with(name, request, Expect::created(), |ex| {
                Ok(format!("Reply ID: {}", display_id(ex.json_i64("/id"))))
            })
            .await;
        if exchange.passed() {
            run.ctx.set_reply_id(exchange.json_i64("/id"));
        }
    }
    Continuation::Continue
}

fn display_id(id: Option<i64>) -> String {
    id.map_or_else(|| "unknown".to_string(), |id| id.to_string())
}
