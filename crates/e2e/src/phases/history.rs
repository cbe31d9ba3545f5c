//! Artwork revision history. The backend is not required to record a revision
//! for every update, so revision and edit counts are reported rather than
//! asserted.

use serde_json::{json, Value};

use super::{Continuation, PhaseRun};
use crate::context::Actor;
use crate::probe::{ApiRequest, Expect};

pub(super) async fn run(run: &mut PhaseRun<'_>) -> Continuation {
    let artwork_id = run.ctx.artwork_id().unwrap_or_default();
    let interpretation = format!("{} (revised)", run.config.artwork.interpretation);

    let request = run.as_actor(
        Actor::A,
        ApiRequest::put("/artworks/{artworkId}")
            .path_param("artworkId", artwork_id)
            .json(json!({"interpretation": interpretation})),
    );
    run.check("Update Artwork", request, Expect::ok()).await;

    let request = run.as_actor(
        Actor::A,
        ApiRequest::get("/api/artworks/{artworkId}/history").path_param("artworkId", artwork_id),
    );
    run.check_with("Get Artwork History", request, Expect::ok(), |ex| {
        Ok(format!("Found {} revisions", ex.items().len()))
    })
    .await;

    let request = run.as_actor(
        Actor::A,
        ApiRequest::get("/api/artworks/{artworkId}/history/count").path_param("artworkId", artwork_id),
    );
    run.check_with("Get Edit Count", request, Expect::ok(), |ex| {
        Ok(format!("Edit count: {}", edit_count(ex.body.as_ref()).unwrap_or_else(|| ex.text.clone())))
    })
    .await;
    Continuation::Continue
}

/// The count is either a bare number or wrapped as `{"count": n}`
fn edit_count(body: Option<&Value>) -> Option<String> {
    let body = body?;
    body.as_i64()
        .or_else(|| body.get("count").and_then(Value::as_i64))
        .map(|count| count.to_string())
}
