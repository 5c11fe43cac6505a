// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Common types and sequencing logic for pio-deploy.
//!
//! This crate holds everything that does not touch the operating system:
//! - `pipeline`: the fixed list of toolchain invocations and their arguments
//! - `sequencer`: the deployment state machine and the step runner
//! - `transcript`: the progress lines printed while a deployment runs
//!
//! Spawning processes is left to a [`CommandRunner`] implementation supplied
//! by the host tool, so the whole sequence can be driven by a scripted runner
//! in tests.

pub mod error;
pub mod pipeline;
pub mod sequencer;
pub mod transcript;

// Re-export commonly used types
pub use error::DeployError;
pub use pipeline::{DeployConfig, ExecMode, FailurePolicy, PipelineStep, StepKind, ToolCommand};
pub use pipeline::{DEFAULT_TOOLCHAIN, PIPELINE_ORDER};
pub use sequencer::{run_step, CommandRunner, RunReport, Sequencer, SequencerState};
pub use sequencer::{StepOutcome, StepRecord};
pub use transcript::{Transcript, TranscriptEvent};
