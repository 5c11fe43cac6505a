// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Transcript printed to the terminal.

use std::io::Write;

use pio_deploy_common::{Transcript, TranscriptEvent};
use tracing::warn;

/// Writes each event as a line on stdout.
pub struct ConsoleTranscript;

impl Transcript for ConsoleTranscript {
    fn record(&mut self, event: TranscriptEvent<'_>) {
        println!("{}", event);
        // Children share our stdout; keep the banner ahead of their output.
        if let Err(e) = std::io::stdout().flush() {
            warn!(error = %e, "failed to flush stdout");
        }
    }
}
