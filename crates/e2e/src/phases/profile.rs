use serde_json::{json, Value};

use super::{Continuation, PhaseRun};
use crate::context::Actor;
use crate::probe::{ApiRequest, Expect};

const UPLOAD_SKIPPED: &str = "requires an image upload, not exercised";

pub(super) async fn run(run: &mut PhaseRun<'_>) -> Continuation {
    let username = run.ctx.username(Actor::A).unwrap_or_default().to_string();
    let user_id = run.ctx.user_id(Actor::A).unwrap_or_default();

    let request = run.as_actor(
        Actor::A,
        ApiRequest::get("/users/{username}").path_param("username", &username),
    );
    run.check_with("Get Profile", request, Expect::ok(), |ex| {
        Ok(describe_stats(ex.json("/stats")))
    })
    .await;

    let request = run.as_actor(
        Actor::A,
        ApiRequest::put("/users/{userId}/edit")
            .path_param("userId", user_id)
            .json(json!({
                "displayName": "Test User A Updated",
                "bio": "This is my updated bio for testing",
            })),
    );
    run.check("Update Profile", request, Expect::ok()).await;

    run.skip("Upload Avatar", UPLOAD_SKIPPED);
    run.skip("Upload Banner", UPLOAD_SKIPPED);
    Continuation::Continue
}

fn describe_stats(stats: Option<&Value>) -> String {
    match stats {
        Some(stats) if stats.is_object() => {
            let count = |key: &str| stats.get(key).and_then(Value::as_i64).unwrap_or(0);
            format!(
                "Followers: {}, Following: {}",
                count("followersCount"),
                count("followingCount")
            )
        }
        _ => "No stats available".to_string(),
    }
}
