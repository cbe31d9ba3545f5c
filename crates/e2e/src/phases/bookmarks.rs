use super::{Continuation, PhaseRun};
use crate::context::Actor;
use crate::probe::{ApiRequest, Expect};

pub(super) async fn run(run: &mut PhaseRun<'_>) -> Continuation {
    let artwork_id = run.ctx.artwork_id().unwrap_or_default();
    let bookmark = || ApiRequest::post("/api/bookmarks/{artworkId}").path_param("artworkId", artwork_id);
    let status = || ApiRequest::get("/api/bookmarks/{artworkId}/status").path_param("artworkId", artwork_id);

    let request = run.as_actor(Actor::B, bookmark());
    run.check("Bookmark Artwork", request, Expect::ok()).await;

    let request = run.as_actor(Actor::B, status());
    run.check_with("Check Bookmark Status", request, Expect::ok(), |ex| {
        expect_flag(ex.json_bool("/isBookmarked"), true, "Is bookmarked")
    })
    .await;

    let request = run.as_actor(Actor::B, ApiRequest::get("/api/bookmarks").page(0, run.page_size()));
    run.check_with("Get User's Bookmarks", request, Expect::ok(), |ex| {
        let found = ex.items().len();
        if ex.contains_id(artwork_id) {
            Ok(format!("Found {found} bookmarks"))
        } else {
            Err(format!("artwork {artwork_id} not among {found} bookmarks"))
        }
    })
    .await;

    let request = run.as_actor(
        Actor::B,
        ApiRequest::delete("/api/bookmarks/{artworkId}").path_param("artworkId", artwork_id),
    );
    run.check("Unbookmark Artwork", request, Expect::ok()).await;

    let request = run.as_actor(Actor::B, status());
    run.check_with("Verify Bookmark Removed", request, Expect::ok(), |ex| {
        expect_flag(ex.json_bool("/isBookmarked"), false, "Is bookmarked")
    })
    .await;
    Continuation::Continue
}

/// Pass when a boolean status flag has the expected value
pub(super) fn expect_flag(actual: Option<bool>, expected: bool, label: &str) -> Result<String, String> {
    match actual {
        Some(value) if value == expected => Ok(format!("{label}: {value}")),
        Some(value) => Err(format!("{label}: {value} (expected {expected})")),
        None => Err(format!("{label}: missing from response")),
    }
}
