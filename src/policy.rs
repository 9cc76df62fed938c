//! Transform failure policy
//!
//! Transform errors happen in the bundling engine, but whether they abort the
//! run is decided by the descriptor's `bail` flag:
//! - Fail-fast (production): the first error discards every staged output
//!   and the run produces nothing
//! - Best-effort (development): errors are reported, and the dev server keeps
//!   serving the last build that completed cleanly

use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::descriptor::ConfigDescriptor;

/// Mode-level reaction to transform errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    FailFast,
    BestEffort,
}

impl FailurePolicy {
    pub fn for_descriptor(descriptor: &ConfigDescriptor) -> Self {
        if descriptor.bail() {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::BestEffort
        }
    }
}

/// A transform failure reported by the bundling engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{path}: {message}")]
pub struct TransformError {
    pub path: String,
    pub message: String,
}

impl TransformError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// An output produced by a successful transform, not yet written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedOutput {
    pub source: String,
    pub output_path: PathBuf,
}

/// Whether the engine should keep transforming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Continue,
    Abort,
}

/// Outputs and reported errors of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildOutcome {
    pub outputs: Vec<StagedOutput>,
    pub errors: Vec<TransformError>,
}

impl BuildOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A fail-fast run stopped at its first transform error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("build aborted: {first} ({discarded} staged output(s) discarded)")]
pub struct BuildAborted {
    pub first: TransformError,
    pub discarded: usize,
}

/// Collects transform results for one run under a failure policy.
#[derive(Debug)]
pub struct BuildLedger {
    policy: FailurePolicy,
    staged: Vec<StagedOutput>,
    errors: Vec<TransformError>,
    aborted: Option<BuildAborted>,
}

impl BuildLedger {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            staged: Vec::new(),
            errors: Vec::new(),
            aborted: None,
        }
    }

    pub fn for_descriptor(descriptor: &ConfigDescriptor) -> Self {
        Self::new(FailurePolicy::for_descriptor(descriptor))
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// Stage a successful output. Ignored once the run has aborted.
    pub fn record_output(&mut self, output: StagedOutput) -> Progress {
        if self.is_aborted() {
            return Progress::Abort;
        }
        self.staged.push(output);
        Progress::Continue
    }

    /// Record a transform error and decide whether the run continues.
    pub fn record_failure(&mut self, err: TransformError) -> Progress {
        if self.is_aborted() {
            return Progress::Abort;
        }

        match self.policy {
            FailurePolicy::FailFast => {
                let discarded = self.staged.len();
                error!(path = %err.path, discarded, "transform failed, aborting build");
                self.staged.clear();
                self.aborted = Some(BuildAborted {
                    first: err,
                    discarded,
                });
                Progress::Abort
            }
            FailurePolicy::BestEffort => {
                warn!(path = %err.path, message = %err.message, "transform failed");
                self.errors.push(err);
                Progress::Continue
            }
        }
    }

    /// Close the run. A fail-fast run that saw an error yields no outputs.
    pub fn finish(self) -> Result<BuildOutcome, BuildAborted> {
        if let Some(aborted) = self.aborted {
            return Err(aborted);
        }
        Ok(BuildOutcome {
            outputs: self.staged,
            errors: self.errors,
        })
    }
}

/// The build a dev server currently serves.
#[derive(Debug, Default)]
pub struct ServeState {
    current: Option<BuildOutcome>,
    generation: u64,
}

impl ServeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a finished rebuild.
    ///
    /// A clean rebuild replaces the served build. One with errors only
    /// replaces it when nothing has been served yet. Returns whether the
    /// served build changed.
    pub fn publish(&mut self, outcome: BuildOutcome) -> bool {
        if !outcome.is_clean() && self.current.is_some() {
            warn!(
                errors = outcome.errors.len(),
                generation = self.generation,
                "rebuild had errors, keeping last good build"
            );
            return false;
        }

        self.generation += 1;
        info!(
            generation = self.generation,
            outputs = outcome.outputs.len(),
            "serving new build"
        );
        self.current = Some(outcome);
        true
    }

    pub fn current(&self) -> Option<&BuildOutcome> {
        self.current.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
