//! Check outcomes and the run-wide tally
//!
//! Every probe ends in exactly one [`CheckOutcome`]. The [`Recorder`] counts
//! it, prints one line for it, and at the end of the run renders the summary.

use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, warn};

const RULE_WIDTH: usize = 70;

/// Result of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
    Skip,
}

impl Verdict {
    pub fn tag(self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::Skip => "SKIP",
        }
    }

    fn colored_tag(self) -> String {
        let tag = format!("[{}]", self.tag());
        match self {
            Verdict::Pass => tag.green().to_string(),
            Verdict::Fail => tag.red().bold().to_string(),
            Verdict::Skip => tag.yellow().to_string(),
        }
    }
}

/// One check's name, verdict and detail message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub name: String,
    pub verdict: Verdict,
    pub detail: String,
}

impl CheckOutcome {
    pub fn new(name: impl Into<String>, verdict: Verdict, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verdict,
            detail: detail.into(),
        }
    }

    pub fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, Verdict::Pass, detail)
    }

    pub fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, Verdict::Fail, detail)
    }

    pub fn skip(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, Verdict::Skip, detail)
    }

    /// The line printed for this outcome, without the colored tag
    pub fn line(&self) -> String {
        format!("[{}] {}", self.verdict.tag(), self.body())
    }

    fn body(&self) -> String {
        match self.verdict {
            Verdict::Pass if self.detail.is_empty() => format!("{}: PASSED", self.name),
            Verdict::Pass => format!("{}: PASSED {}", self.name, self.detail),
            Verdict::Fail => format!("{}: FAILED - {}", self.name, self.detail),
            Verdict::Skip => format!("{}: SKIPPED - {}", self.name, self.detail),
        }
    }
}

/// Pass/fail/skip counters; `total` always equals the sum of the other three
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Tally {
    fn count(&mut self, verdict: Verdict) {
        self.total += 1;
        match verdict {
            Verdict::Pass => self.passed += 1,
            Verdict::Fail => self.failed += 1,
            Verdict::Skip => self.skipped += 1,
        }
    }

    /// True when nothing failed; skips do not count against the run
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn verdict_line(&self) -> String {
        if self.all_passed() {
            "All tests passed!".to_string()
        } else {
            format!("{} test(s) failed", self.failed)
        }
    }

    /// Deterministic multi-line summary block
    pub fn render(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        format!(
            "\n{rule}\n  TEST SUMMARY\n{rule}\n\
             Total Tests: {}\n\
             [PASS] Passed: {}\n\
             [FAIL] Failed: {}\n\
             [SKIP] Skipped: {}\n\
             \n*** {}\n{rule}",
            self.total,
            self.passed,
            self.failed,
            self.skipped,
            self.verdict_line(),
        )
    }
}

/// Accumulates outcomes for one run and writes the console report
pub struct Recorder {
    tally: Tally,
    outcomes: Vec<CheckOutcome>,
    out: Box<dyn Write + Send>,
}

impl Recorder {
    /// Recorder writing to an arbitrary sink
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            tally: Tally::default(),
            outcomes: Vec::new(),
            out,
        }
    }

    /// Recorder writing to stdout
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Recorder that discards its report (tally is still kept)
    pub fn silent() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Count an outcome and print its line. Never fails.
    pub fn record(&mut self, outcome: CheckOutcome) -> Verdict {
        let verdict = outcome.verdict;
        self.tally.count(verdict);
        match verdict {
            Verdict::Fail => warn!(check = %outcome.name, detail = %outcome.detail, "check failed"),
            _ => debug!(check = %outcome.name, verdict = verdict.tag(), "check recorded"),
        }
        self.emit(&format!("{} {}", verdict.colored_tag(), outcome.body()));
        self.outcomes.push(outcome);
        verdict
    }

    /// Section header printed when a phase starts
    pub fn header(&mut self, title: &str) {
        let rule = "=".repeat(RULE_WIDTH);
        self.emit(&format!("\n{rule}\n  {}\n{rule}", title.bold()));
    }

    /// Opening banner for the whole run
    pub fn banner(&mut self, base_url: &str, started: &str) {
        let rule = "=".repeat(RULE_WIDTH);
        self.emit(&format!(
            "\n{rule}\n  CRITIK BACKEND - END-TO-END API CHECKS\n{rule}\n  Base URL: {base_url}\n  Time: {started}\n{rule}"
        ));
    }

    /// Free-form notice, used for fatal aborts
    pub fn notice(&mut self, text: &str) {
        self.emit(&format!("\n{}", text.yellow()));
    }

    /// Print the summary block and hand back the final tally
    pub fn summarize(&mut self) -> Tally {
        let rendered = self.tally.render();
        self.emit(&rendered);
        self.tally
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// Outcomes recorded so far, in order
    pub fn outcomes(&self) -> &[CheckOutcome] {
        &self.outcomes
    }

    /// Look up the most recent outcome with the given name
    pub fn outcome(&self, name: &str) -> Option<&CheckOutcome> {
        self.outcomes.iter().rev().find(|o| o.name == name)
    }

    fn emit(&mut self, text: &str) {
        // Report output is best-effort; a closed pipe must not abort bookkeeping.
        let _ = writeln!(self.out, "{text}");
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::stdout()
    }
}
