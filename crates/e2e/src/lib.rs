//! Critik E2E check engine
//!
//! This crate drives a single, strictly sequential pass of HTTP checks
//! against a running Critik backend:
//! - Registers and logs in two actors and carries their tokens forward
//! - Creates an artwork, comments and reactions, then exercises the
//!   social graph (bookmarks, follows, blocks) around them
//! - Classifies every request as PASS, FAIL or SKIP and prints a summary
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    TestRunner                               │
//! │    ├── banner / header per phase / summary  (Recorder)      │
//! │    └── for phase in PLAN:                                   │
//! │          reads unmet?  -> one SKIP "<group> Tests"          │
//! │          else          -> run_phase(id, PhaseRun)           │
//! │          fatal Abort   -> stop, remaining phases NOT_RUN    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PhaseRun                                                   │
//! │    ├── Probe      one request -> Exchange + recorded outcome│
//! │    ├── Recorder   tally, check lines                        │
//! │    └── TestContext tokens, user ids, artwork/comment ids    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod phases;
pub mod probe;
pub mod recorder;
pub mod runner;

pub use config::{ArtworkFixture, HarnessConfig};
pub use context::{Actor, ContextField, TestContext};
pub use error::{E2eError, E2eResult};
pub use phases::{PhaseDescriptor, PhaseId, PLAN};
pub use probe::{ApiRequest, Exchange, Expect, Probe};
pub use recorder::{CheckOutcome, Recorder, Tally, Verdict};
pub use runner::{PhaseRecord, PhaseState, RunReport, TestRunner};
