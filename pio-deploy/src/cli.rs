// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use pio_deploy_common::{DeployConfig, Sequencer, DEFAULT_TOOLCHAIN};

use crate::console::ConsoleTranscript;
use crate::runner::SystemRunner;

/// Command-line arguments.
///
/// With no arguments the full pipeline runs against `platformio` in the
/// current directory.
#[derive(Parser)]
#[command(name = "pio-deploy")]
#[command(about = "Build, upload filesystem, upload firmware and monitor a PlatformIO project")]
#[command(version)]
pub struct Cli {
    /// Toolchain executable (name on PATH or full path)
    #[arg(long, value_name = "EXE", default_value = DEFAULT_TOOLCHAIN)]
    pub toolchain: String,

    /// Project directory (defaults to the current directory)
    #[arg(short = 'd', long, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// PlatformIO environment to build, upload and monitor
    #[arg(short, long, value_name = "ENV")]
    pub environment: Option<String>,

    /// Serial port (e.g., /dev/ttyUSB0) for uploads and the monitor
    #[arg(short, long)]
    pub port: Option<String>,

    /// Serial monitor baud rate
    #[arg(short, long, value_name = "RATE")]
    pub baud: Option<u32>,

    /// Show diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Resolve the arguments into a deployment configuration.
    ///
    /// Relative paths are anchored to the directory pio-deploy was started
    /// from, since every child runs inside the project directory.
    pub fn into_config(self) -> Result<DeployConfig> {
        let cwd = std::env::current_dir().context("Failed to resolve the current directory")?;
        let project_dir = match self.project_dir {
            Some(dir) => cwd.join(dir),
            None => cwd.clone(),
        };

        Ok(DeployConfig {
            toolchain: resolve_toolchain(&self.toolchain, &cwd),
            project_dir: Some(project_dir),
            environment: self.environment,
            port: self.port,
            baud: self.baud,
        })
    }
}

/// Bare names stay as they are for PATH lookup; relative paths become absolute.
fn resolve_toolchain(toolchain: &str, cwd: &Path) -> String {
    let path = Path::new(toolchain);
    if path.is_relative() && path.components().count() > 1 {
        cwd.join(path).to_string_lossy().into_owned()
    } else {
        toolchain.to_string()
    }
}

/// Install the stderr log subscriber. The level comes from `-v` only.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Execute the deployment described by the parsed CLI.
pub fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config()?;
    let runner = SystemRunner::new()?;

    let mut sequencer = Sequencer::new(&config, runner, ConsoleTranscript);
    let report = sequencer.run()?;

    report.into_result()?;
    Ok(())
}
