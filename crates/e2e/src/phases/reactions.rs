//! Artwork reactions. Setting a reaction overwrites the previous one, so
//! AGREE followed by DISAGREE must leave a single DISAGREE.

use reqwest::Method;

use super::{Continuation, PhaseRun};
use crate::context::Actor;
use crate::probe::{ApiRequest, Expect};

pub(super) async fn run(run: &mut PhaseRun<'_>) -> Continuation {
    let artwork_id = run.ctx.artwork_id().unwrap_or_default();
    let reactions = |method: Method, suffix: &str| {
        ApiRequest::new(method, format!("/artworks/{{artworkId}}/reactions{suffix}"))
            .path_param("artworkId", artwork_id)
    };

    let request = run.as_actor(Actor::A, reactions(Method::POST, "").query("type", "AGREE"));
    run.check("Set Reaction (AGREE)", request, Expect::ok()).await;

    let request = run.as_actor(Actor::A, reactions(Method::GET, "/me"));
    run.check_with("Get User's Reaction", request, Expect::ok(), |ex| {
        Ok(format!(
            "Has reaction: {}, Type: {}",
            ex.json_bool("/hasReaction").unwrap_or(false),
            ex.json_str("/type").unwrap_or_else(|| "none".to_string())
        ))
    })
    .await;

    let request = run.as_actor(Actor::A, reactions(Method::GET, ""));
    run.check_with("Get Reaction Counts", request, Expect::ok(), |ex| {
        Ok(format!("Counts: {}", ex.body.as_ref().map_or_else(|| ex.text.clone(), ToString::to_string)))
    })
    .await;

    let request = run.as_actor(Actor::A, reactions(Method::POST, "").query("type", "DISAGREE"));
    run.check("Update Reaction (DISAGREE)", request, Expect::ok()).await;

    let request = run.as_actor(Actor::A, reactions(Method::GET, "/me"));
    run.check_with("Verify Reaction Overwrite", request, Expect::ok(), |ex| {
        match (ex.json_bool("/hasReaction"), ex.json_str("/type").as_deref()) {
            (Some(true), Some("DISAGREE")) => Ok("Single reaction, Type: DISAGREE".to_string()),
            (has, kind) => Err(format!("expected DISAGREE, got hasReaction={has:?} type={kind:?}")),
        }
    })
    .await;

    let request = run.as_actor(Actor::A, reactions(Method::DELETE, ""));
    run.check("Remove Reaction", request, Expect::ok()).await;
    Continuation::Continue
}
