//! Artwork creation and feeds. Sole producer of the artwork id.
//!
//! The id comes from the creation response when the backend returns it.
//! Otherwise it is looked up in places that are known to hold actor A's
//! work: the public feed entry owned by A, then A's own artworks. Taking the
//! first feed entry is the last resort and is called out in the check detail.

use serde_json::Value;
use tracing::{info, warn};

use super::{Continuation, PhaseRun};
use crate::context::{Actor, ContextField};
use crate::probe::{ApiRequest, Expect, FilePart, MultipartBody};

const PLACEHOLDER_IMAGE: &[u8] = b"fake_image_content";

pub(super) async fn run(run: &mut PhaseRun<'_>) -> Continuation {
    create(run).await;
    let first_feed_item = public_feed(run).await;
    my_artworks(run).await;

    let mut from_feed_head = false;
    if run.ctx.artwork_id().is_none() {
        if let Some(id) = first_feed_item {
            warn!(artwork_id = id, "falling back to the first public feed item; it may not belong to this run");
            from_feed_head = run.ctx.set_artwork_id(Some(id));
        }
    }
    info!(artwork_id = ?run.ctx.artwork_id(), "artwork discovery finished");

    by_id(run, from_feed_head).await;
    personalized_feed(run).await;

    let size = run.page_size();
    for (name, path) in [
        ("Get Popular Feed", "/artworks/popular"),
        ("Get Controversial Feed", "/artworks/controversial"),
    ] {
        let request = run.as_actor(Actor::A, ApiRequest::get(path).page(0, size));
        run.check(name, request, Expect::ok()).await;
    }
    Continuation::Continue
}

async fn create(run: &mut PhaseRun<'_>) {
    let fixture = &run.config.artwork;
    let form = MultipartBody::default()
        .text("title", &fixture.title)
        .text("artistName", &fixture.artist_name)
        .text("interpretation", &fixture.interpretation)
        .text("tags", fixture.tags.join(","))
        .text("locationName", &fixture.location_name)
        .text("lat", fixture.lat)
        .text("lon", fixture.lon)
        .file(FilePart {
            field: "file".to_string(),
            file_name: fixture.file_name.clone(),
            content_type: fixture.content_type.clone(),
            bytes: PLACEHOLDER_IMAGE.to_vec(),
        });
    let request = run.as_actor(Actor::A, ApiRequest::post("/artworks").multipart(form));

    let exchange = run
        .check_with("Create Artwork", request, Expect::created(), |ex| {
            Ok(match ex.json_i64("/id") {
                Some(id) => format!("Artwork ID: {id}"),
                None => format!("{}, no id in response", ex.status_detail()),
            })
        })
        .await;
    if exchange.passed() {
        run.ctx.set_artwork_id(exchange.json_i64("/id"));
    }
}

/// Reads the public feed twice and returns the first item's id as a fallback
async fn public_feed(run: &mut PhaseRun<'_>) -> Option<i64> {
    let size = run.page_size();
    let owner = run.ctx.username(Actor::A).map(str::to_string);
    let feed = || ApiRequest::get("/artworks/feed").page(0, size);

    let request = run.as_actor(Actor::A, feed());
    let exchange = run
        .check_with("Get Public Feed", request, Expect::ok(), |ex| {
            let total = ex.total_elements().unwrap_or(0);
            if ex.items().is_empty() {
                Ok("Feed is empty (expected for new database)".to_string())
            } else {
                Ok(format!("Found {total} artworks"))
            }
        })
        .await;
    if !exchange.passed() {
        run.skip("Feed Read Consistency", "public feed could not be read");
        return None;
    }

    if run.ctx.artwork_id().is_none() {
        if let Some(owner) = owner.as_deref() {
            run.ctx.set_artwork_id(find_owned(exchange.items(), owner));
        }
    }

    let first_total = exchange.total_elements();
    let request = run.as_actor(Actor::A, feed());
    run.check_with("Feed Read Consistency", request, Expect::ok(), |ex| {
        let second_total = ex.total_elements();
        if second_total == first_total {
            Ok(format!("totalElements stable at {}", first_total.unwrap_or(0)))
        } else {
            Err(format!("totalElements changed from {first_total:?} to {second_total:?}"))
        }
    })
    .await;

    exchange.items().first().and_then(item_id)
}

async fn my_artworks(run: &mut PhaseRun<'_>) {
    let request = run.as_actor(Actor::A, ApiRequest::get("/artworks/my"));
    let exchange = run
        .check_with("Get My Artworks", request, Expect::ok(), |ex| {
            Ok(format!("Found {} artworks", ex.items().len()))
        })
        .await;
    if exchange.passed() && run.ctx.artwork_id().is_none() {
        let title = run.config.artwork.title.as_str();
        let items = exchange.items();
        let id = items
            .iter()
            .find(|item| item.get("title").and_then(Value::as_str) == Some(title))
            .or_else(|| items.first())
            .and_then(item_id);
        run.ctx.set_artwork_id(id);
    }
}

async fn by_id(run: &mut PhaseRun<'_>, from_feed_head: bool) {
    let name = "Get Artwork by ID";
    if !run.require(name, &[ContextField::ArtworkId]) {
        return;
    }
    let request = run.as_actor(
        Actor::A,
        ApiRequest::get("/artworks/{artworkId}").path_param("artworkId", run.ctx.artwork_id().unwrap_or_default()),
    );
    run.check_with(name, request, Expect::ok(), |ex| {
        if from_feed_head {
            Ok(format!("{} (id taken from the first feed item, owner unverified)", ex.status_detail()))
        } else {
            Ok(ex.status_detail())
        }
    })
    .await;
}

async fn personalized_feed(run: &mut PhaseRun<'_>) {
    let name = "Get Personalized Feed";
    if !run.require(name, &[ContextField::UserId(Actor::A)]) {
        return;
    }
    let request = run.as_actor(
        Actor::A,
        ApiRequest::get("/artworks/feed/{userId}")
            .path_param("userId", run.ctx.user_id(Actor::A).unwrap_or_default())
            .page(0, run.page_size()),
    );
    run.check_with(name, request, Expect::ok(), |ex| {
        Ok(format!("Found {} artworks from followed users", ex.items().len()))
    })
    .await;
}

fn item_id(item: &Value) -> Option<i64> {
    item.get("id").and_then(Value::as_i64)
}

/// Id of the first listed artwork whose owner is `username`
fn find_owned(items: &[Value], username: &str) -> Option<i64> {
    items
        .iter()
        .find(|item| item.pointer("/user/username").and_then(Value::as_str) == Some(username))
        .and_then(item_id)
}
