// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Deployment sequencer - pure logic without process dependencies.
//!
//! The sequencer walks a linear state machine:
//!
//! ```text
//! Idle -> Building -> UploadingFilesystem -> UploadingFirmware -> Monitoring -> Done
//!            |                |                      |
//!            +----------------+----------------------+--> Failed
//! ```
//!
//! Each state owns one pipeline step. The outcome of that step alone decides
//! the next state, so transitions are testable without spawning anything.
//! Processes are started through a [`CommandRunner`] supplied by the caller.

use tracing::debug;

use crate::error::DeployError;
use crate::pipeline::{DeployConfig, ExecMode, FailurePolicy, PipelineStep, StepKind, ToolCommand};
use crate::transcript::{Transcript, TranscriptEvent};

/// Result of running one external command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Exit status zero.
    Success,
    /// Non-zero exit status or spawn error, with a printable detail.
    Failure(String),
    /// The user pressed Ctrl+C while the command was running.
    Interrupted,
}

impl StepOutcome {
    pub fn failure(detail: impl Into<String>) -> Self {
        StepOutcome::Failure(detail.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Success)
    }
}

/// Starts external commands on behalf of the sequencer.
pub trait CommandRunner {
    /// Run a command with its output captured and discarded. Used for the
    /// toolchain presence check.
    fn probe(&mut self, command: &ToolCommand) -> StepOutcome;

    /// Run a command with inherited stdio and wait for it according to `mode`.
    fn run(&mut self, command: &ToolCommand, mode: ExecMode) -> StepOutcome;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &mut R {
    fn probe(&mut self, command: &ToolCommand) -> StepOutcome {
        (**self).probe(command)
    }

    fn run(&mut self, command: &ToolCommand, mode: ExecMode) -> StepOutcome {
        (**self).run(command, mode)
    }
}

/// States of a deployment run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Building,
    UploadingFilesystem,
    UploadingFirmware,
    Monitoring,
    Done,
    Failed,
}

impl SequencerState {
    /// Leave `Idle` once the toolchain has been found.
    pub fn start(self) -> Self {
        match self {
            SequencerState::Idle => SequencerState::Building,
            other => other,
        }
    }

    /// The step executed while in this state, if any.
    pub fn step(self) -> Option<StepKind> {
        match self {
            SequencerState::Building => Some(StepKind::Build),
            SequencerState::UploadingFilesystem => Some(StepKind::UploadFilesystem),
            SequencerState::UploadingFirmware => Some(StepKind::UploadFirmware),
            SequencerState::Monitoring => Some(StepKind::Monitor),
            SequencerState::Idle | SequencerState::Done | SequencerState::Failed => None,
        }
    }

    /// Next state after this state's step finished with `outcome`.
    pub fn transition(self, outcome: &StepOutcome) -> Self {
        let Some(kind) = self.step() else {
            return self;
        };

        if kind.failure_policy() == FailurePolicy::Abort && !outcome.is_success() {
            return SequencerState::Failed;
        }

        match self {
            SequencerState::Building => SequencerState::UploadingFilesystem,
            SequencerState::UploadingFilesystem => SequencerState::UploadingFirmware,
            SequencerState::UploadingFirmware => SequencerState::Monitoring,
            _ => SequencerState::Done,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SequencerState::Done | SequencerState::Failed)
    }
}

/// A step that ran and how it ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepRecord {
    pub kind: StepKind,
    pub outcome: StepOutcome,
}

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub state: SequencerState,
    pub steps: Vec<StepRecord>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.state == SequencerState::Done
    }

    pub fn outcome_of(&self, kind: StepKind) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|record| record.kind == kind)
            .map(|record| &record.outcome)
    }

    /// Turn a failed run into the error of the step that stopped it.
    pub fn into_result(self) -> Result<(), DeployError> {
        if self.succeeded() {
            return Ok(());
        }

        let failed = self
            .steps
            .iter()
            .rev()
            .find(|record| record.kind.failure_policy() == FailurePolicy::Abort);

        let (step, detail) = match failed {
            Some(StepRecord {
                kind,
                outcome: StepOutcome::Failure(detail),
            }) => (kind.label(), detail.clone()),
            Some(StepRecord { kind, .. }) => (kind.label(), "interrupted".to_string()),
            None => ("Deployment", "no step was run".to_string()),
        };

        Err(DeployError::StepFailed {
            step: step.to_string(),
            detail,
        })
    }
}

/// Run a single step: announce it, execute it, report how it ended.
pub fn run_step<R, T>(runner: &mut R, transcript: &mut T, step: &PipelineStep) -> StepOutcome
where
    R: CommandRunner + ?Sized,
    T: Transcript + ?Sized,
{
    transcript.record(TranscriptEvent::StepStarted(step));
    debug!(command = %step.command, "starting {}", step.label());

    let outcome = runner.run(&step.command, step.kind.exec_mode());

    match &outcome {
        // A monitor that exits on its own has nothing to celebrate.
        StepOutcome::Success if step.kind == StepKind::Monitor => {
            debug!("serial monitor exited");
        }
        StepOutcome::Success => transcript.record(TranscriptEvent::StepSucceeded(step)),
        StepOutcome::Failure(detail) => transcript.record(TranscriptEvent::StepFailed {
            step,
            detail: detail.as_str(),
        }),
        StepOutcome::Interrupted if step.kind == StepKind::Monitor => {
            transcript.record(TranscriptEvent::MonitorStopped)
        }
        StepOutcome::Interrupted => transcript.record(TranscriptEvent::StepFailed {
            step,
            detail: "interrupted",
        }),
    }

    outcome
}

/// Drives the fixed deployment pipeline.
pub struct Sequencer<R, T> {
    runner: R,
    transcript: T,
    version_check: ToolCommand,
    steps: Vec<PipelineStep>,
    state: SequencerState,
}

impl<R: CommandRunner, T: Transcript> Sequencer<R, T> {
    pub fn new(config: &DeployConfig, runner: R, transcript: T) -> Self {
        Self {
            runner,
            transcript,
            version_check: config.version_check(),
            steps: config.pipeline(),
            state: SequencerState::Idle,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Make sure the toolchain answers `--version` before touching the device.
    pub fn check_toolchain(&mut self) -> Result<(), DeployError> {
        debug!(command = %self.version_check, "probing toolchain");

        match self.runner.probe(&self.version_check) {
            StepOutcome::Success => Ok(()),
            StepOutcome::Failure(detail) => Err(DeployError::ToolchainNotFound {
                program: self.version_check.program.clone(),
                detail,
            }),
            StepOutcome::Interrupted => Err(DeployError::ToolchainNotFound {
                program: self.version_check.program.clone(),
                detail: "interrupted".to_string(),
            }),
        }
    }

    /// Run the presence check and then the whole pipeline.
    ///
    /// Returns `Err` only when the toolchain is missing. A failing step is
    /// reflected in the report's final state. Every call starts over from
    /// `Idle`.
    pub fn run(&mut self) -> Result<RunReport, DeployError> {
        self.state = SequencerState::Idle;
        self.check_toolchain()?;

        let mut records = Vec::with_capacity(self.steps.len());
        self.state = self.state.start();

        while let Some(kind) = self.state.step() {
            let Some(step) = self.steps.iter().find(|step| step.kind == kind) else {
                break;
            };

            let outcome = run_step(&mut self.runner, &mut self.transcript, step);
            let next = self.state.transition(&outcome);
            debug!(from = ?self.state, to = ?next, "sequencer transition");

            records.push(StepRecord { kind, outcome });
            self.state = next;
        }

        Ok(RunReport {
            state: self.state,
            steps: records,
        })
    }
}
