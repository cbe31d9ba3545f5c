//! Phase plan and the shared machinery phases run on
//!
//! The run is a single pass over [`PLAN`]. Each descriptor declares which
//! context fields it needs before any of its probes make sense (`reads`) and
//! which ones it may produce (`writes`); the runner uses `reads` to decide
//! between running a phase and recording a single skip for it.

use serde::Serialize;
use std::fmt;

use crate::config::HarnessConfig;
use crate::context::{Actor, ContextField, TestContext};
use crate::probe::{ApiRequest, Exchange, Expect, Probe};
use crate::recorder::{CheckOutcome, Recorder};

mod artworks;
mod auth;
mod blocks;
mod bookmarks;
mod comment_reactions;
mod comments;
mod follows;
mod health;
mod history;
mod logout;
mod profile;
mod reactions;
mod search;

use crate::context::ContextField::{ArtworkId, CommentId, RefreshToken, ReplyId, Token, UserId, Username};

/// Every phase of a run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PhaseId {
    Health,
    Authentication,
    Artworks,
    Comments,
    ArtworkReactions,
    CommentReactions,
    Bookmarks,
    Follows,
    Blocks,
    Profile,
    Search,
    ArtworkHistory,
    Logout,
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(PhaseDescriptor::of(*self).title)
    }
}

/// Whether the run may proceed past a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    Continue,
    Abort,
}

/// Static description of a phase and its place in the dependency graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDescriptor {
    pub id: PhaseId,
    /// Section header printed when the phase starts
    pub title: &'static str,
    /// Check name used when the whole phase is skipped
    pub group: &'static str,
    /// Fields that must be set for the phase to run at all
    pub reads: &'static [ContextField],
    /// Fields the phase may set
    pub writes: &'static [ContextField],
    /// An `Abort` from this phase ends the run
    pub fatal: bool,
}

impl PhaseDescriptor {
    pub fn of(id: PhaseId) -> &'static PhaseDescriptor {
        &PLAN[id as usize]
    }
}

/// The run, in order
pub static PLAN: [PhaseDescriptor; 13] = [
    PhaseDescriptor {
        id: PhaseId::Health,
        title: "HEALTH CHECK",
        group: "Health",
        reads: &[],
        writes: &[],
        fatal: true,
    },
    PhaseDescriptor {
        id: PhaseId::Authentication,
        title: "1. AUTHENTICATION TESTS",
        group: "Authentication",
        reads: &[],
        writes: &[
            Username(Actor::A),
            Token(Actor::A),
            RefreshToken(Actor::A),
            UserId(Actor::A),
            Username(Actor::B),
            Token(Actor::B),
            RefreshToken(Actor::B),
            UserId(Actor::B),
        ],
        fatal: true,
    },
    PhaseDescriptor {
        id: PhaseId::Artworks,
        title: "2. ARTWORK TESTS",
        group: "Artwork",
        reads: &[Token(Actor::A)],
        writes: &[ArtworkId],
        fatal: false,
    },
    PhaseDescriptor {
        id: PhaseId::Comments,
        title: "3. COMMENT TESTS",
        group: "Comment",
        reads: &[ArtworkId, Token(Actor::A), Token(Actor::B)],
        writes: &[CommentId, ReplyId],
        fatal: false,
    },
    PhaseDescriptor {
        id: PhaseId::ArtworkReactions,
        title: "4. ARTWORK REACTION TESTS",
        group: "Reaction",
        reads: &[ArtworkId, Token(Actor::A)],
        writes: &[],
        fatal: false,
    },
    PhaseDescriptor {
        id: PhaseId::CommentReactions,
        title: "5. COMMENT REACTION TESTS",
        group: "Comment Reaction",
        reads: &[CommentId, Token(Actor::A)],
        writes: &[],
        fatal: false,
    },
    PhaseDescriptor {
        id: PhaseId::Bookmarks,
        title: "6. BOOKMARK TESTS",
        group: "Bookmark",
        reads: &[ArtworkId, Token(Actor::B)],
        writes: &[],
        fatal: false,
    },
    PhaseDescriptor {
        id: PhaseId::Follows,
        title: "7. FOLLOW TESTS",
        group: "Follow",
        reads: &[Token(Actor::A), Token(Actor::B), UserId(Actor::A), UserId(Actor::B)],
        writes: &[],
        fatal: false,
    },
    PhaseDescriptor {
        id: PhaseId::Blocks,
        title: "8. BLOCK TESTS",
        group: "Block",
        reads: &[Token(Actor::A), Token(Actor::B), UserId(Actor::A), UserId(Actor::B)],
        writes: &[],
        fatal: false,
    },
    PhaseDescriptor {
        id: PhaseId::Profile,
        title: "9. PROFILE TESTS",
        group: "Profile",
        reads: &[Token(Actor::A), Username(Actor::A), UserId(Actor::A)],
        writes: &[],
        fatal: false,
    },
    PhaseDescriptor {
        id: PhaseId::Search,
        title: "10. SEARCH TESTS",
        group: "Search",
        reads: &[Token(Actor::A)],
        writes: &[],
        fatal: false,
    },
    PhaseDescriptor {
        id: PhaseId::ArtworkHistory,
        title: "11. ARTWORK HISTORY TESTS",
        group: "Artwork History",
        reads: &[ArtworkId, Token(Actor::A)],
        writes: &[],
        fatal: false,
    },
    PhaseDescriptor {
        id: PhaseId::Logout,
        title: "12. LOGOUT TESTS",
        group: "Logout",
        reads: &[],
        writes: &[],
        fatal: false,
    },
];

/// Everything a phase body can touch while it runs
pub struct PhaseRun<'a> {
    pub probe: &'a Probe,
    pub recorder: &'a mut Recorder,
    pub ctx: &'a mut TestContext,
    pub config: &'a HarnessConfig,
    /// Unix timestamp of the run, used to make usernames unique
    pub stamp: i64,
}

impl PhaseRun<'_> {
    pub async fn check(&mut self, name: &str, request: ApiRequest, expect: Expect) -> Exchange {
        self.probe.check(self.recorder, name, request, expect).await
    }

    pub async fn check_with<F>(
        &mut self,
        name: &str,
        request: ApiRequest,
        expect: Expect,
        assess: F,
    ) -> Exchange
    where
        F: FnOnce(&Exchange) -> Result<String, String>,
    {
        self.probe
            .check_with(self.recorder, name, request, expect, assess)
            .await
    }

    pub fn skip(&mut self, name: &str, detail: &str) {
        self.recorder.record(CheckOutcome::skip(name, detail));
    }

    /// Record a skip for `name` if any of `fields` is unset
    pub fn require(&mut self, name: &str, fields: &[ContextField]) -> bool {
        let missing = self.ctx.missing(fields);
        if missing.is_empty() {
            return true;
        }
        let detail = format!("missing {}", join_fields(&missing));
        self.skip(name, &detail);
        false
    }

    /// Attach the actor's current bearer token to a request
    pub fn as_actor(&self, actor: Actor, request: ApiRequest) -> ApiRequest {
        request.bearer(self.ctx.token(actor))
    }

    pub fn page_size(&self) -> u32 {
        self.config.page_size
    }
}

pub(crate) fn join_fields(fields: &[ContextField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Dispatch to a phase body. Preconditions have already been checked.
pub async fn run_phase(id: PhaseId, run: &mut PhaseRun<'_>) -> Continuation {
    match id {
        PhaseId::Health => health::run(run).await,
        PhaseId::Authentication => auth::run(run).await,
        PhaseId::Artworks => artworks::run(run).await,
        PhaseId::Comments => comments::run(run).await,
        PhaseId::ArtworkReactions => reactions::run(run).await,
        PhaseId::CommentReactions => comment_reactions::run(run).await,
        PhaseId::Bookmarks => bookmarks::run(run).await,
        PhaseId::Follows => follows::run(run).await,
        PhaseId::Blocks => blocks::run(run).await,
        PhaseId::Profile => profile::run(run).await,
        PhaseId::Search => search::run(run).await,
        PhaseId::ArtworkHistory => history::run(run).await,
        PhaseId::Logout => logout::run(run).await,
    }
}
