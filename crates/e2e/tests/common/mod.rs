//! In-process stand-in for the Critik backend
//!
//! Implements every endpoint the check sequence touches, with just enough
//! state to answer consistently. [`StubOptions`] switches individual
//! behaviours off so negative paths can be driven from tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use critik_e2e::HarnessConfig;

/// Toggles for misbehaving backends
#[derive(Debug, Clone)]
pub struct StubOptions {
    pub healthy: bool,
    pub reject_registration: bool,
    pub login_without_token: bool,
    pub enforce_blocks: bool,
    pub omit_created_id: bool,
    /// A second reaction keeps the first instead of replacing it
    pub sticky_reactions: bool,
    /// Start with an artwork owned by someone else at the head of the feed
    pub seed_foreign_artwork: bool,
    /// `POST /artworks` answers 500
    pub fail_artwork_creation: bool,
    /// Health answers only after this delay
    pub health_delay: Option<Duration>,
    /// Every public feed read reports one more element than the last
    pub growing_feed: bool,
}

impl Default for StubOptions {
    fn default() -> Self {
        Self {
            healthy: true,
            reject_registration: false,
            login_without_token: false,
            enforce_blocks: true,
            omit_created_id: false,
            sticky_reactions: false,
            seed_foreign_artwork: false,
            fail_artwork_creation: false,
            health_delay: None,
            growing_feed: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    password: String,
    display_name: Option<String>,
    bio: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Artwork {
    pub id: i64,
    pub owner: i64,
    pub title: String,
    tags: Vec<String>,
    location: String,
    interpretation: String,
    revisions: u32,
}

#[derive(Debug, Clone)]
struct Comment {
    id: i64,
    artwork: i64,
    author: i64,
    text: String,
    parent: Option<i64>,
}

#[derive(Debug, Default)]
pub struct Backend {
    next_id: i64,
    pub users: Vec<User>,
    tokens: HashMap<String, i64>,
    refresh_tokens: HashMap<String, i64>,
    pub artworks: Vec<Artwork>,
    comments: Vec<Comment>,
    artwork_reactions: HashMap<(i64, i64), String>,
    comment_reactions: HashMap<(i64, i64), String>,
    bookmarks: HashSet<(i64, i64)>,
    follows: HashSet<(i64, i64)>,
    blocks: HashSet<(i64, i64)>,
    feed_reads: usize,
    /// `METHOD /path` for every request received, in order
    pub requests: Vec<String>,
}

impl Backend {
    fn seeded(options: &StubOptions) -> Self {
        let mut backend = Self::default();
        if options.seed_foreign_artwork {
            let owner = backend.next_id();
            backend.users.push(User {
                id: owner,
                username: "someone_else".to_string(),
                password: "secret".to_string(),
                display_name: None,
                bio: None,
            });
            let id = backend.next_id();
            backend.artworks.push(Artwork {
                id,
                owner,
                title: "Older Work".to_string(),
                tags: vec!["abstract".to_string()],
                location: "Elsewhere".to_string(),
                interpretation: "Not part of this run".to_string(),
                revisions: 0,
            });
        }
        backend
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn user_json(&self, id: i64) -> Value {
        match self.user(id) {
            Some(user) => json!({
                "id": user.id,
                "username": user.username,
                "displayName": user.display_name,
                "bio": user.bio,
            }),
            None => json!({"id": id}),
        }
    }

    fn artwork_json(&self, artwork: &Artwork) -> Value {
        json!({
            "id": artwork.id,
            "title": artwork.title,
            "interpretation": artwork.interpretation,
            "tags": artwork.tags,
            "locationName": artwork.location,
            "user": self.user_json(artwork.owner),
        })
    }

    fn artworks_where(&self, keep: impl Fn(&Artwork) -> bool) -> Vec<Value> {
        self.artworks
            .iter()
            .filter(|a| keep(a))
            .map(|a| self.artwork_json(a))
            .collect()
    }

    fn issue_tokens(&mut self, user: i64) -> (String, String) {
        let serial = self.next_id();
        let access = format!("access-{user}-{serial}");
        let refresh = format!("refresh-{user}-{serial}");
        self.tokens.insert(access.clone(), user);
        self.refresh_tokens.insert(refresh.clone(), user);
        (access, refresh)
    }

    fn blocked_between(&self, a: i64, b: i64) -> bool {
        self.blocks.contains(&(a, b)) || self.blocks.contains(&(b, a))
    }
}

#[derive(Clone)]
struct Stub {
    backend: Arc<Mutex<Backend>>,
    options: StubOptions,
}

type Reply = (StatusCode, Json<Value>);
type Handled = Result<Reply, Reply>;

fn ok(value: Value) -> Handled {
    Ok((StatusCode::OK, Json(value)))
}

fn created(value: Value) -> Handled {
    Ok((StatusCode::CREATED, Json(value)))
}

fn refuse(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({"error": message})))
}

fn paged(items: Vec<Value>) -> Handled {
    let total = items.len();
    ok(json!({"content": items, "totalElements": total}))
}

impl Stub {
    fn backend(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap()
    }

    /// User id behind the request's bearer token
    fn caller(&self, headers: &HeaderMap) -> Result<i64, Reply> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| refuse(StatusCode::UNAUTHORIZED, "missing bearer token"))?;
        self.backend()
            .tokens
            .get(token)
            .copied()
            .ok_or_else(|| refuse(StatusCode::UNAUTHORIZED, "unknown token"))
    }
}

/// Handle to a running stub; the server stops when this is dropped
pub struct StubBackend {
    base_url: String,
    backend: Arc<Mutex<Backend>>,
    task: JoinHandle<()>,
}

impl StubBackend {
    pub async fn spawn(options: StubOptions) -> Self {
        let backend = Arc::new(Mutex::new(Backend::seeded(&options)));
        let stub = Stub {
            backend: Arc::clone(&backend),
            options,
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("stub backend bind failed");
        let addr = listener.local_addr().expect("stub backend has no local address");
        let app = router(stub);
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            base_url: format!("http://{addr}"),
            backend,
            task,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Harness configuration pointing at this stub
    pub fn config(&self) -> HarnessConfig {
        HarnessConfig {
            base_url: self.base_url.clone(),
            health_timeout_secs: 2,
            request_timeout_secs: 5,
            ..HarnessConfig::default()
        }
    }

    pub fn state(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap()
    }

    pub fn requests(&self) -> Vec<String> {
        self.state().requests.clone()
    }

    pub fn user_id(&self, username_prefix: &str) -> Option<i64> {
        self.state()
            .users
            .iter()
            .find(|u| u.username.starts_with(username_prefix))
            .map(|u| u.id)
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn router(stub: Stub) -> Router {
    Router::new()
        .route("/actuator/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/logout-all", post(logout_all))
        .route("/artworks", post(create_artwork))
        .route("/artworks/feed", get(public_feed))
        .route("/artworks/feed/:id", get(personalized_feed))
        .route("/artworks/my", get(my_artworks))
        .route("/artworks/popular", get(all_artworks))
        .route("/artworks/controversial", get(all_artworks))
        .route("/artworks/:id", get(get_artwork).put(update_artwork))
        .route("/artworks/:id/comments", get(list_comments).post(add_comment))
        .route("/artworks/:id/comments/:comment_id/replies", post(add_reply))
        .route(
            "/artworks/:id/reactions",
            get(artwork_reaction_counts)
                .post(set_artwork_reaction)
                .delete(remove_artwork_reaction),
        )
        .route("/artworks/:id/reactions/me", get(my_artwork_reaction))
        .route(
            "/api/comments/:id/reactions",
            post(set_comment_reaction).delete(remove_comment_reaction),
        )
        .route("/api/comments/:id/reactions/counts", get(comment_reaction_counts))
        .route("/api/comments/:id/reactions/me", get(my_comment_reaction))
        .route("/api/bookmarks", get(list_bookmarks))
        .route("/api/bookmarks/:id", post(bookmark).delete(unbookmark))
        .route("/api/bookmarks/:id/status", get(bookmark_status))
        .route("/follow/:id", post(follow).delete(unfollow))
        .route("/follow/:id/followers", get(followers))
        .route("/follow/:id/following", get(following))
        .route("/api/blocks", get(list_blocks))
        .route("/api/blocks/:id", post(block).delete(unblock))
        .route("/api/blocks/:id/status", get(block_status))
        .route("/users/:id", get(profile))
        .route("/users/:id/edit", put(edit_profile))
        .route("/search/users", get(search_users))
        .route("/search/artworks", get(search_artworks))
        .route("/api/artworks/:id/history", get(history))
        .route("/api/artworks/:id/history/count", get(history_count))
        .layer(middleware::from_fn_with_state(stub.clone(), log_request))
        .with_state(stub)
}

async fn log_request(State(stub): State<Stub>, request: Request, next: Next) -> Response {
    let line = format!("{} {}", request.method(), request.uri().path());
    stub.backend().requests.push(line);
    next.run(request).await
}

fn text(body: &Value, key: &str) -> String {
    body.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

// Health and auth

async fn health(State(stub): State<Stub>) -> Handled {
    if let Some(delay) = stub.options.health_delay {
        tokio::time::sleep(delay).await;
    }
    if stub.options.healthy {
        ok(json!({"status": "UP"}))
    } else {
        Err(refuse(StatusCode::SERVICE_UNAVAILABLE, "DOWN"))
    }
}

async fn register(State(stub): State<Stub>, Json(body): Json<Value>) -> Handled {
    if stub.options.reject_registration {
        return Err(refuse(StatusCode::BAD_REQUEST, "registration disabled"));
    }
    let username = text(&body, "username");
    let mut backend = stub.backend();
    if username.is_empty() || backend.users.iter().any(|u| u.username == username) {
        return Err(refuse(StatusCode::BAD_REQUEST, "username unavailable"));
    }
    let id = backend.next_id();
    backend.users.push(User {
        id,
        username,
        password: text(&body, "password"),
        display_name: None,
        bio: None,
    });
    ok(json!({"message": "User registered successfully"}))
}

async fn login(State(stub): State<Stub>, Json(body): Json<Value>) -> Handled {
    let username = text(&body, "username");
    let password = text(&body, "password");
    let mut backend = stub.backend();
    let id = backend
        .users
        .iter()
        .find(|u| u.username == username && u.password == password)
        .map(|u| u.id)
        .ok_or_else(|| refuse(StatusCode::UNAUTHORIZED, "bad credentials"))?;
    if stub.options.login_without_token {
        return ok(json!({"userId": id, "username": username}));
    }
    let (access, refresh) = backend.issue_tokens(id);
    ok(json!({
        "accessToken": access,
        "refreshToken": refresh,
        "userId": id,
        "username": username,
    }))
}

async fn refresh(State(stub): State<Stub>, Json(body): Json<Value>) -> Handled {
    let token = text(&body, "refreshToken");
    let mut backend = stub.backend();
    let id = backend
        .refresh_tokens
        .remove(&token)
        .ok_or_else(|| refuse(StatusCode::UNAUTHORIZED, "unknown refresh token"))?;
    let (access, refresh) = backend.issue_tokens(id);
    ok(json!({"accessToken": access, "refreshToken": refresh}))
}

async fn logout(State(stub): State<Stub>, headers: HeaderMap, Json(body): Json<Value>) -> Handled {
    stub.caller(&headers)?;
    let token = text(&body, "refreshToken");
    stub.backend().refresh_tokens.remove(&token);
    ok(json!({"message": "Logged out"}))
}

async fn logout_all(State(stub): State<Stub>, headers: HeaderMap) -> Handled {
    let me = stub.caller(&headers)?;
    let mut backend = stub.backend();
    backend.tokens.retain(|_, user| *user != me);
    backend.refresh_tokens.retain(|_, user| *user != me);
    ok(json!({"message": "Logged out from all devices"}))
}

// Artworks

async fn create_artwork(State(stub): State<Stub>, headers: HeaderMap, mut multipart: Multipart) -> Handled {
    let me = stub.caller(&headers)?;
    if stub.options.fail_artwork_creation {
        return Err(refuse(StatusCode::INTERNAL_SERVER_ERROR, "storage unavailable"));
    }
    let mut fields = HashMap::new();
    let mut has_file = false;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            has_file = field.bytes().await.map(|b| !b.is_empty()).unwrap_or(false);
        } else if let Ok(value) = field.text().await {
            fields.insert(name, value);
        }
    }
    if !has_file {
        return Err(refuse(StatusCode::BAD_REQUEST, "file part required"));
    }

    let mut backend = stub.backend();
    let id = backend.next_id();
    let artwork = Artwork {
        id,
        owner: me,
        title: fields.remove("title").unwrap_or_default(),
        tags: fields
            .remove("tags")
            .unwrap_or_default()
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        location: fields.remove("locationName").unwrap_or_default(),
        interpretation: fields.remove("interpretation").unwrap_or_default(),
        revisions: 0,
    };
    let mut body = backend.artwork_json(&artwork);
    backend.artworks.push(artwork);
    if stub.options.omit_created_id {
        body = json!({"message": "Artwork created"});
    }
    created(body)
}

async fn public_feed(State(stub): State<Stub>, headers: HeaderMap) -> Handled {
    stub.caller(&headers)?;
    let mut backend = stub.backend();
    backend.feed_reads += 1;
    let items = backend.artworks_where(|_| true);
    let mut total = items.len();
    if stub.options.growing_feed {
        total += backend.feed_reads;
    }
    ok(json!({"content": items, "totalElements": total}))
}

async fn all_artworks(State(stub): State<Stub>, headers: HeaderMap) -> Handled {
    stub.caller(&headers)?;
    paged(stub.backend().artworks_where(|_| true))
}

async fn personalized_feed(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Handled {
    stub.caller(&headers)?;
    let backend = stub.backend();
    let items = backend.artworks_where(|a| backend.follows.contains(&(id, a.owner)));
    paged(items)
}

async fn my_artworks(State(stub): State<Stub>, headers: HeaderMap) -> Handled {
    let me = stub.caller(&headers)?;
    let items = stub.backend().artworks_where(|a| a.owner == me);
    ok(Value::Array(items))
}

async fn get_artwork(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Handled {
    stub.caller(&headers)?;
    let backend = stub.backend();
    let artwork = backend
        .artworks
        .iter()
        .find(|a| a.id == id)
        .ok_or_else(|| refuse(StatusCode::NOT_FOUND, "artwork not found"))?;
    ok(backend.artwork_json(artwork))
}

async fn update_artwork(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Handled {
    let me = stub.caller(&headers)?;
    let mut backend = stub.backend();
    let artwork = backend
        .artworks
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(|| refuse(StatusCode::NOT_FOUND, "artwork not found"))?;
    if artwork.owner != me {
        return Err(refuse(StatusCode::FORBIDDEN, "not the owner"));
    }
    if let Some(interpretation) = body.get("interpretation").and_then(Value::as_str) {
        artwork.interpretation = interpretation.to_string();
        artwork.revisions += 1;
    }
    let artwork = artwork.clone();
    ok(backend.artwork_json(&artwork))
}

// Comments

fn comment_json(comment: &Comment) -> Value {
    json!({
        "id": comment.id,
        "artworkId": comment.artwork,
        "authorId": comment.author,
        "text": comment.text,
        "parentId": comment.parent,
    })
}

async fn add_comment(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Path(artwork): Path<i64>,
    Json(body): Json<Value>,
) -> Handled {
    let me = stub.caller(&headers)?;
    let mut backend = stub.backend();
    if !backend.artworks.iter().any(|a| a.id == artwork) {
        return Err(refuse(StatusCode::NOT_FOUND, "artwork not found"));
    }
    let comment = Comment {
        id: backend.next_id(),
        artwork,
        author: me,
        text: text(&body, "text"),
        parent: None,
    };
    let reply = comment_json(&comment);
    backend.comments.push(comment);
    created(reply)
}

async fn list_comments(State(stub): State<Stub>, headers: HeaderMap, Path(artwork): Path<i64>) -> Handled {
    stub.caller(&headers)?;
    let items = stub
        .backend()
        .comments
        .iter()
        .filter(|c| c.artwork == artwork && c.parent.is_none())
        .map(comment_json)
        .collect();
    ok(Value::Array(items))
}

async fn add_reply(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Path((artwork, parent)): Path<(i64, i64)>,
    Json(body): Json<Value>,
) -> Handled {
    let me = stub.caller(&headers)?;
    let mut backend = stub.backend();
    if !backend.comments.iter().any(|c| c.id == parent && c.artwork == artwork) {
        return Err(refuse(StatusCode::NOT_FOUND, "comment not found"));
    }
    let comment = Comment {
        id: backend.next_id(),
        artwork,
        author: me,
        text: text(&body, "text"),
        parent: Some(parent),
    };
    let reply = comment_json(&comment);
    backend.comments.push(comment);
    created(reply)
}

// Reactions

fn counts(reactions: &HashMap<(i64, i64), String>, target: i64) -> Value {
    let count = |kind: &str| {
        reactions
            .iter()
            .filter(|((t, _), k)| *t == target && k.as_str() == kind)
            .count()
    };
    let (agree, disagree) = (count("AGREE"), count("DISAGREE"));
    json!({"agree": agree, "disagree": disagree, "total": agree + disagree})
}

fn mine(reactions: &HashMap<(i64, i64), String>, target: i64, me: i64) -> Value {
    match reactions.get(&(target, me)) {
        Some(kind) => json!({"hasReaction": true, "type": kind}),
        None => json!({"hasReaction": false, "type": null}),
    }
}

fn react(reactions: &mut HashMap<(i64, i64), String>, key: (i64, i64), kind: String, sticky: bool) -> Handled {
    if kind != "AGREE" && kind != "DISAGREE" {
        return Err(refuse(StatusCode::BAD_REQUEST, "unknown reaction type"));
    }
    if sticky {
        reactions.entry(key).or_insert(kind);
    } else {
        reactions.insert(key, kind);
    }
    ok(json!({"message": "Reaction saved"}))
}

async fn set_artwork_reaction(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Handled {
    let me = stub.caller(&headers)?;
    let kind = params.get("type").cloned().unwrap_or_default();
    let sticky = stub.options.sticky_reactions;
    react(&mut stub.backend().artwork_reactions, (id, me), kind, sticky)
}

async fn artwork_reaction_counts(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Handled {
    stub.caller(&headers)?;
    ok(counts(&stub.backend().artwork_reactions, id))
}

async fn my_artwork_reaction(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Handled {
    let me = stub.caller(&headers)?;
    ok(mine(&stub.backend().artwork_reactions, id, me))
}

async fn remove_artwork_reaction(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Handled {
    let me = stub.caller(&headers)?;
    stub.backend().artwork_reactions.remove(&(id, me));
    ok(json!({"message": "Reaction removed"}))
}

async fn set_comment_reaction(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Handled {
    let me = stub.caller(&headers)?;
    let sticky = stub.options.sticky_reactions;
    react(&mut stub.backend().comment_reactions, (id, me), text(&body, "type"), sticky)
}

async fn comment_reaction_counts(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Handled {
    stub.caller(&headers)?;
    ok(counts(&stub.backend().comment_reactions, id))
}

async fn my_comment_reaction(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Handled {
    let me = stub.caller(&headers)?;
    ok(mine(&stub.backend().comment_reactions, id, me))
}

async fn remove_comment_reaction(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Handled {
    let me = stub.caller(&headers)?;
    stub.backend().comment_reactions.remove(&(id, me));
    ok(json!({"message": "Reaction removed"}))
}

// Bookmarks

async fn bookmark(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Handled {
    let me = stub.caller(&headers)?;
    stub.backend().bookmarks.insert((me, id));
    ok(json!({"message": "Bookmarked"}))
}

async fn unbookmark(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Handled {
    let me = stub.caller(&headers)?;
    stub.backend().bookmarks.remove(&(me, id));
    ok(json!({"message": "Bookmark removed"}))
}

async fn bookmark_status(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Handled {
    let me = stub.caller(&headers)?;
    ok(json!({"isBookmarked": stub.backend().bookmarks.contains(&(me, id))}))
}

async fn list_bookmarks(State(stub): State<Stub>, headers: HeaderMap) -> Handled {
    let me = stub.caller(&headers)?;
    let backend = stub.backend();
    paged(backend.artworks_where(|a| backend.bookmarks.contains(&(me, a.id))))
}

// Follow graph

async fn follow(State(stub): State<Stub>, headers: HeaderMap, Path(target): Path<i64>) -> Handled {
    let me = stub.caller(&headers)?;
    let mut backend = stub.backend();
    if backend.user(target).is_none() {
        return Err(refuse(StatusCode::NOT_FOUND, "user not found"));
    }
    if target == me {
        return Err(refuse(StatusCode::BAD_REQUEST, "cannot follow yourself"));
    }
    if backend.follows.contains(&(me, target)) {
        return Err(refuse(StatusCode::CONFLICT, "already following"));
    }
    if stub.options.enforce_blocks && backend.blocked_between(me, target) {
        return Err(refuse(StatusCode::FORBIDDEN, "blocked"));
    }
    backend.follows.insert((me, target));
    ok(json!({"message": "Followed"}))
}

async fn unfollow(State(stub): State<Stub>, headers: HeaderMap, Path(target): Path<i64>) -> Handled {
    let me = stub.caller(&headers)?;
    stub.backend().follows.remove(&(me, target));
    ok(json!({"message": "Unfollowed"}))
}

async fn followers(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Handled {
    stub.caller(&headers)?;
    let backend = stub.backend();
    let items = backend
        .follows
        .iter()
        .filter(|(_, followee)| *followee == id)
        .map(|(follower, _)| backend.user_json(*follower))
        .collect();
    paged(items)
}

async fn following(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Handled {
    stub.caller(&headers)?;
    let backend = stub.backend();
    let items = backend
        .follows
        .iter()
        .filter(|(follower, _)| *follower == id)
        .map(|(_, followee)| backend.user_json(*followee))
        .collect();
    paged(items)
}

// Blocks

async fn block(State(stub): State<Stub>, headers: HeaderMap, Path(target): Path<i64>) -> Handled {
    let me = stub.caller(&headers)?;
    let mut backend = stub.backend();
    if backend.user(target).is_none() {
        return Err(refuse(StatusCode::NOT_FOUND, "user not found"));
    }
    backend.blocks.insert((me, target));
    ok(json!({"message": "Blocked"}))
}

async fn unblock(State(stub): State<Stub>, headers: HeaderMap, Path(target): Path<i64>) -> Handled {
    let me = stub.caller(&headers)?;
    stub.backend().blocks.remove(&(me, target));
    ok(json!({"message": "Unblocked"}))
}

async fn block_status(State(stub): State<Stub>, headers: HeaderMap, Path(target): Path<i64>) -> Handled {
    let me = stub.caller(&headers)?;
    ok(json!({"isBlocked": stub.backend().blocks.contains(&(me, target))}))
}

async fn list_blocks(State(stub): State<Stub>, headers: HeaderMap) -> Handled {
    let me = stub.caller(&headers)?;
    let backend = stub.backend();
    let items = backend
        .blocks
        .iter()
        .filter(|(blocker, _)| *blocker == me)
        .map(|(_, blocked)| backend.user_json(*blocked))
        .collect();
    paged(items)
}

// Profiles and search

async fn profile(State(stub): State<Stub>, headers: HeaderMap, Path(username): Path<String>) -> Handled {
    stub.caller(&headers)?;
    let backend = stub.backend();
    let user = backend
        .users
        .iter()
        .find(|u| u.username == username)
        .ok_or_else(|| refuse(StatusCode::NOT_FOUND, "user not found"))?;
    let mut body = backend.user_json(user.id);
    body["stats"] = json!({
        "followersCount": backend.follows.iter().filter(|(_, f)| *f == user.id).count(),
        "followingCount": backend.follows.iter().filter(|(f, _)| *f == user.id).count(),
        "artworksCount": backend.artworks.iter().filter(|a| a.owner == user.id).count(),
    });
    ok(body)
}

async fn edit_profile(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Handled {
    let me = stub.caller(&headers)?;
    if me != id {
        return Err(refuse(StatusCode::FORBIDDEN, "cannot edit another user"));
    }
    let mut backend = stub.backend();
    if let Some(user) = backend.users.iter_mut().find(|u| u.id == id) {
        user.display_name = body.get("displayName").and_then(Value::as_str).map(str::to_string);
        user.bio = body.get("bio").and_then(Value::as_str).map(str::to_string);
    }
    ok(backend.user_json(id))
}

async fn search_users(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Handled {
    stub.caller(&headers)?;
    let q = params.get("q").cloned().unwrap_or_default();
    let backend = stub.backend();
    let items = backend
        .users
        .iter()
        .filter(|u| u.username.contains(&q))
        .map(|u| backend.user_json(u.id))
        .collect();
    paged(items)
}

async fn search_artworks(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Handled {
    stub.caller(&headers)?;
    let matches = |artwork: &Artwork| {
        let title = params
            .get("title")
            .map_or(true, |t| artwork.title.to_lowercase().contains(&t.to_lowercase()));
        let tags = params.get("tags").map_or(true, |t| artwork.tags.contains(t));
        let location = params
            .get("location")
            .map_or(true, |l| artwork.location.contains(l.as_str()));
        title && tags && location
    };
    paged(stub.backend().artworks_where(matches))
}

// History

async fn history(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Handled {
    stub.caller(&headers)?;
    let backend = stub.backend();
    let artwork = backend
        .artworks
        .iter()
        .find(|a| a.id == id)
        .ok_or_else(|| refuse(StatusCode::NOT_FOUND, "artwork not found"))?;
    let revisions = (1..=artwork.revisions)
        .map(|revision| json!({"revision": revision, "artworkId": id}))
        .collect();
    ok(Value::Array(revisions))
}

async fn history_count(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Handled {
    stub.caller(&headers)?;
    let backend = stub.backend();
    let count = backend.artworks.iter().find(|a| a.id == id).map_or(0, |a| a.revisions);
    ok(json!(count))
}
