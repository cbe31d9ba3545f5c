//! Sequential run over the phase plan

use chrono::{Local, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::config::HarnessConfig;
use crate::context::TestContext;
use crate::error::E2eResult;
use crate::phases::{join_fields, run_phase, Continuation, PhaseId, PhaseRun, PLAN};
use crate::probe::Probe;
use crate::recorder::{CheckOutcome, Recorder, Tally};

/// Lifecycle of one phase within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseState {
    NotRun,
    Running,
    Done,
}

/// Final state of a phase, as reported after the run
#[derive(Debug, Clone, Serialize)]
pub struct PhaseRecord {
    pub id: PhaseId,
    pub title: &'static str,
    pub state: PhaseState,
    /// The phase was entered but its preconditions were unmet
    pub skipped: bool,
}

/// Result of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub base_url: String,
    pub started: String,
    pub duration_ms: u64,
    pub tally: Tally,
    pub phases: Vec<PhaseRecord>,
    /// Fatal phase that ended the run early, if any
    pub aborted_at: Option<PhaseId>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.aborted_at.is_none() && self.tally.all_passed()
    }

    pub fn phase(&self, id: PhaseId) -> Option<&PhaseRecord> {
        self.phases.iter().find(|p| p.id == id)
    }

    pub fn to_json(&self) -> E2eResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Drives one run: banner, every phase in plan order, summary
pub struct TestRunner {
    config: HarnessConfig,
    probe: Probe,
}

impl TestRunner {
    /// Validate the configuration and build the shared HTTP client
    pub fn new(config: HarnessConfig) -> E2eResult<Self> {
        config.validate()?;
        let probe = Probe::new(&config)?;
        Ok(Self { config, probe })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run every phase against a fresh context
    pub async fn run(&self, recorder: &mut Recorder) -> RunReport {
        let mut ctx = TestContext::new();
        self.run_with_context(recorder, &mut ctx).await
    }

    /// Run every phase against a caller-supplied context.
    ///
    /// Phases whose required fields are unset record one skip and are not
    /// entered. An abort from a fatal phase leaves the rest `NotRun`; the
    /// summary is printed either way.
    pub async fn run_with_context(&self, recorder: &mut Recorder, ctx: &mut TestContext) -> RunReport {
        let start = Instant::now();
        let started = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let stamp = Utc::now().timestamp();
        recorder.banner(self.probe.base_url(), &started);
        info!(base_url = self.probe.base_url(), stamp, "starting run");

        let mut phases: Vec<PhaseRecord> = PLAN
            .iter()
            .map(|descriptor| PhaseRecord {
                id: descriptor.id,
                title: descriptor.title,
                state: PhaseState::NotRun,
                skipped: false,
            })
            .collect();
        let mut aborted_at = None;

        for (descriptor, record) in PLAN.iter().zip(phases.iter_mut()) {
            recorder.header(descriptor.title);
            record.state = PhaseState::Running;

            let missing = ctx.missing(descriptor.reads);
            let continuation = if missing.is_empty() {
                debug!(phase = %descriptor.id, "entering phase");
                let mut run = PhaseRun {
                    probe: &self.probe,
                    recorder: &mut *recorder,
                    ctx: &mut *ctx,
                    config: &self.config,
                    stamp,
                };
                run_phase(descriptor.id, &mut run).await
            } else {
                let detail = format!("missing {}", join_fields(&missing));
                info!(phase = %descriptor.id, %detail, "skipping phase");
                recorder.record(CheckOutcome::skip(format!("{} Tests", descriptor.group), detail));
                record.skipped = true;
                Continuation::Continue
            };
            record.state = PhaseState::Done;

            if continuation == Continuation::Abort && descriptor.fatal {
                error!(phase = %descriptor.id, "fatal phase failed, aborting run");
                recorder.notice(abort_notice(descriptor.id));
                aborted_at = Some(descriptor.id);
                break;
            }
        }

        let tally = recorder.summarize();
        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            passed = tally.passed,
            failed = tally.failed,
            skipped = tally.skipped,
            duration_ms,
            "run finished"
        );

        RunReport {
            base_url: self.probe.base_url().to_string(),
            started,
            duration_ms,
            tally,
            phases,
            aborted_at,
        }
    }
}

fn abort_notice(id: PhaseId) -> &'static str {
    match id {
        PhaseId::Health => {
            "[!] Application is not running or not healthy! Please start the application and try again."
        }
        PhaseId::Authentication => "[!] Authentication failed! Cannot proceed with other tests.",
        _ => "[!] Run aborted.",
    }
}
