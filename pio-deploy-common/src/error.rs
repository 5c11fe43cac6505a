// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Errors that end a deployment with a non-zero exit code.
//!
//! A failing serial monitor is not listed here: it is reported through
//! [`crate::StepOutcome`] and never fails the run.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    /// The toolchain executable could not be located or did not answer
    /// `--version`.
    #[error("{program} is not installed or not in PATH ({detail})")]
    ToolchainNotFound { program: String, detail: String },

    /// A build or upload step exited with a non-zero status.
    #[error("{step} failed: {detail}")]
    StepFailed { step: String, detail: String },
}
