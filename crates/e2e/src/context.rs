//! Shared state threaded through every phase of a run

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// The two registered users a run acts as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Actor {
    A,
    B,
}

impl Actor {
    /// Human label used in check names ("User A")
    pub fn label(self) -> &'static str {
        match self {
            Actor::A => "User A",
            Actor::B => "User B",
        }
    }

    /// Lowercase suffix used in generated usernames and emails
    pub fn slug(self) -> &'static str {
        match self {
            Actor::A => "a",
            Actor::B => "b",
        }
    }
}

/// Per-actor credentials and identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorSlot {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub user_id: Option<i64>,
    pub username: Option<String>,
}

/// Addressable fields of [`TestContext`], used by phase descriptors to
/// declare what they read and write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContextField {
    Token(Actor),
    RefreshToken(Actor),
    UserId(Actor),
    Username(Actor),
    ArtworkId,
    CommentId,
    ReplyId,
}

impl ContextField {
    /// Credentials rotate; everything else is set at most once per run
    pub fn is_write_once(self) -> bool {
        !matches!(self, ContextField::Token(_) | ContextField::RefreshToken(_))
    }
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextField::Token(actor) => write!(f, "{} token", actor.label()),
            ContextField::RefreshToken(actor) => write!(f, "{} refresh token", actor.label()),
            ContextField::UserId(actor) => write!(f, "{} id", actor.label()),
            ContextField::Username(actor) => write!(f, "{} username", actor.label()),
            ContextField::ArtworkId => f.write_str("artwork id"),
            ContextField::CommentId => f.write_str("comment id"),
            ContextField::ReplyId => f.write_str("reply id"),
        }
    }
}

/// Cross-phase state for a single run.
///
/// Writers take `Option` so values parsed from a response body can be passed
/// straight through: `None` never clears an existing value, and a second write
/// to a write-once field keeps the first value.
#[derive(Debug, Clone, Default)]
pub struct TestContext {
    a: ActorSlot,
    b: ActorSlot,
    artwork_id: Option<i64>,
    comment_id: Option<i64>,
    reply_id: Option<i64>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actor(&self, actor: Actor) -> &ActorSlot {
        match actor {
            Actor::A => &self.a,
            Actor::B => &self.b,
        }
    }

    fn actor_mut(&mut self, actor: Actor) -> &mut ActorSlot {
        match actor {
            Actor::A => &mut self.a,
            Actor::B => &mut self.b,
        }
    }

    pub fn token(&self, actor: Actor) -> Option<&str> {
        self.actor(actor).token.as_deref()
    }

    pub fn refresh_token(&self, actor: Actor) -> Option<&str> {
        self.actor(actor).refresh_token.as_deref()
    }

    pub fn user_id(&self, actor: Actor) -> Option<i64> {
        self.actor(actor).user_id
    }

    pub fn username(&self, actor: Actor) -> Option<&str> {
        self.actor(actor).username.as_deref()
    }

    pub fn artwork_id(&self) -> Option<i64> {
        self.artwork_id
    }

    pub fn comment_id(&self) -> Option<i64> {
        self.comment_id
    }

    pub fn reply_id(&self) -> Option<i64> {
        self.reply_id
    }

    pub fn is_set(&self, field: ContextField) -> bool {
        match field {
            ContextField::Token(actor) => self.token(actor).is_some(),
            ContextField::RefreshToken(actor) => self.refresh_token(actor).is_some(),
            ContextField::UserId(actor) => self.user_id(actor).is_some(),
            ContextField::Username(actor) => self.username(actor).is_some(),
            ContextField::ArtworkId => self.artwork_id.is_some(),
            ContextField::CommentId => self.comment_id.is_some(),
            ContextField::ReplyId => self.reply_id.is_some(),
        }
    }

    /// Fields from `required` that are still unset, in declaration order
    pub fn missing(&self, required: &[ContextField]) -> Vec<ContextField> {
        required.iter().copied().filter(|f| !self.is_set(*f)).collect()
    }

    pub fn set_token(&mut self, actor: Actor, token: Option<String>) {
        if let Some(token) = token {
            debug!(field = %ContextField::Token(actor), "context updated");
            self.actor_mut(actor).token = Some(token);
        }
    }

    pub fn set_refresh_token(&mut self, actor: Actor, token: Option<String>) {
        if let Some(token) = token {
            debug!(field = %ContextField::RefreshToken(actor), "context updated");
            self.actor_mut(actor).refresh_token = Some(token);
        }
    }

    pub fn set_user_id(&mut self, actor: Actor, id: Option<i64>) -> bool {
        write_once(&mut self.actor_mut(actor).user_id, id, ContextField::UserId(actor))
    }

    pub fn set_username(&mut self, actor: Actor, username: Option<String>) -> bool {
        write_once(&mut self.actor_mut(actor).username, username, ContextField::Username(actor))
    }

    pub fn set_artwork_id(&mut self, id: Option<i64>) -> bool {
        write_once(&mut self.artwork_id, id, ContextField::ArtworkId)
    }

    pub fn set_comment_id(&mut self, id: Option<i64>) -> bool {
        write_once(&mut self.comment_id, id, ContextField::CommentId)
    }

    pub fn set_reply_id(&mut self, id: Option<i64>) -> bool {
        write_once(&mut self.reply_id, id, ContextField::ReplyId)
    }
}

/// Returns true when the value was stored
fn write_once<T: fmt::Debug + PartialEq>(slot: &mut Option<T>, value: Option<T>, field: ContextField) -> bool {
    let Some(value) = value else {
        return false;
    };
    match slot {
        Some(existing) if *existing == value => false,
        Some(existing) => {
            warn!(%field, ?existing, rejected = ?value, "ignoring second write to write-once field");
            false
        }
        None => {
            debug!(%field, "context updated");
            *slot = Some(value);
            true
        }
    }
}
