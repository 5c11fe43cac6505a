// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Progress lines shown while a deployment runs.

use std::fmt;

use crate::pipeline::{PipelineStep, StepKind};

/// A single entry in the deployment transcript.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TranscriptEvent<'a> {
    StepStarted(&'a PipelineStep),
    StepSucceeded(&'a PipelineStep),
    StepFailed {
        step: &'a PipelineStep,
        detail: &'a str,
    },
    MonitorStopped,
}

impl fmt::Display for TranscriptEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptEvent::StepStarted(step) => {
                write!(f, "\n=== {} ===", step.label())?;
                if step.kind == StepKind::Monitor {
                    write!(f, "\nPress Ctrl+C to exit")?;
                }
                Ok(())
            }
            TranscriptEvent::StepSucceeded(step) => {
                write!(f, "✓ {} completed successfully!", step.label())
            }
            TranscriptEvent::StepFailed { step, detail } if step.kind == StepKind::Monitor => {
                write!(f, "Error starting serial monitor: {}", detail)
            }
            TranscriptEvent::StepFailed { step, detail } => {
                write!(f, "✗ Error during {}: {}", step.label(), detail)
            }
            TranscriptEvent::MonitorStopped => write!(f, "\nSerial monitor stopped"),
        }
    }
}

/// Sink for transcript events.
pub trait Transcript {
    fn record(&mut self, event: TranscriptEvent<'_>);
}

impl<T: Transcript + ?Sized> Transcript for &mut T {
    fn record(&mut self, event: TranscriptEvent<'_>) {
        (**self).record(event)
    }
}
