use super::{Continuation, PhaseRun};
use crate::context::Actor;
use crate::probe::{ApiRequest, Expect};

pub(super) async fn run(run: &mut PhaseRun<'_>) -> Continuation {
    let size = run.page_size();
    let searches = [
        ("Search Users", "/search/users", "q", run.config.user_prefix.clone(), "users"),
        ("Search Artworks by Title", "/search/artworks", "title", "test".to_string(), "artworks"),
        ("Search Artworks by Tags", "/search/artworks", "tags", "abstract".to_string(), "artworks"),
        (
            "Search Artworks by Location",
            "/search/artworks",
            "location",
            run.config.artwork.location_name.clone(),
            "artworks",
        ),
    ];

    for (name, path, key, term, noun) in searches {
        let request = run.as_actor(Actor::A, ApiRequest::get(path).query(key, term).page(0, size));
        run.check_with(name, request, Expect::ok(), |ex| {
            Ok(format!("Found {} {noun}", ex.items().len()))
        })
        .await;
    }
    Continuation::Continue
}
