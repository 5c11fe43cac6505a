// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Build, upload and monitor a PlatformIO project in one go.
//!
//! Usage:
//!   pio-deploy
//!   pio-deploy --environment esp32dev --port /dev/ttyUSB0
//!   pio-deploy --project-dir firmware/ -vv

mod cli;
mod console;
mod runner;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::init_tracing(args.verbose);
    cli::run(args)
}
