// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Process runner backed by tokio child processes.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::process::{Child, Command};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use pio_deploy_common::{CommandRunner, ExecMode, StepOutcome, ToolCommand};

/// How long an interrupted monitor gets to exit before it is killed.
pub const INTERRUPT_GRACE: Duration = Duration::from_secs(2);

#[cfg(unix)]
const SIGINT: i32 = 2;

/// Runs toolchain commands as real child processes.
pub struct SystemRunner {
    runtime: Runtime,
}

impl SystemRunner {
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start the process runtime")?;

        Ok(Self { runtime })
    }
}

impl CommandRunner for SystemRunner {
    fn probe(&mut self, command: &ToolCommand) -> StepOutcome {
        let program = match which::which(&command.program) {
            Ok(path) => path,
            Err(e) => return StepOutcome::failure(format!("{}: {}", command.program, e)),
        };
        info!(path = %program.display(), "found toolchain");

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Checking {}...", command));
        spinner.enable_steady_tick(Duration::from_millis(100));

        let output = self.runtime.block_on(async {
            build(command, &program)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await
        });
        spinner.finish_and_clear();

        match output {
            Ok(output) if output.status.success() => {
                debug!(
                    version = %String::from_utf8_lossy(&output.stdout).trim(),
                    "toolchain answered"
                );
                StepOutcome::Success
            }
            Ok(output) => StepOutcome::failure(exit_detail(command, output.status)),
            Err(e) => StepOutcome::failure(format!("failed to run `{}`: {}", command, e)),
        }
    }

    fn run(&mut self, command: &ToolCommand, mode: ExecMode) -> StepOutcome {
        self.runtime.block_on(async {
            let spawned = build(command, Path::new(&command.program))
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .spawn();

            let mut child = match spawned {
                Ok(child) => child,
                Err(e) => {
                    return StepOutcome::failure(format!("failed to start `{}`: {}", command, e))
                }
            };
            debug!(pid = ?child.id(), "spawned `{}`", command);

            let status = match mode {
                ExecMode::Blocking => child.wait().await,
                // The Ctrl+C listener is only armed here. Before the monitor
                // starts, an interrupt still terminates the whole tool.
                ExecMode::Interruptible => tokio::select! {
                    biased;

                    signal = tokio::signal::ctrl_c() => match signal {
                        Ok(()) => {
                            settle(&mut child, command).await;
                            return StepOutcome::Interrupted;
                        }
                        Err(e) => {
                            warn!(error = %e, "cannot listen for Ctrl+C");
                            child.wait().await
                        }
                    },
                    status = child.wait() => status,
                },
            };

            match status {
                Ok(status) if status.success() => StepOutcome::Success,
                Ok(status) if mode == ExecMode::Interruptible && interrupted_by_user(status) => {
                    StepOutcome::Interrupted
                }
                Ok(status) => StepOutcome::failure(exit_detail(command, status)),
                Err(e) => StepOutcome::failure(format!("failed waiting for `{}`: {}", command, e)),
            }
        })
    }
}

fn build(command: &ToolCommand, program: &Path) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(&command.args);
    if let Some(dir) = &command.working_dir {
        cmd.current_dir(dir);
    }
    cmd
}

fn exit_detail(command: &ToolCommand, status: ExitStatus) -> String {
    debug!(%status, "`{}` finished", command);
    format!("`{}` returned {}", command, status)
}

/// Give an interrupted child the chance to exit on its own, then kill it.
async fn settle(child: &mut Child, command: &ToolCommand) {
    match tokio::time::timeout(INTERRUPT_GRACE, child.wait()).await {
        Ok(Ok(status)) => debug!(%status, "`{}` stopped", command),
        Ok(Err(e)) => warn!(error = %e, "failed waiting for `{}`", command),
        Err(_) => {
            warn!("`{}` still running after Ctrl+C, killing it", command);
            if let Err(e) = child.kill().await {
                warn!(error = %e, "failed to kill `{}`", command);
            }
        }
    }
}

#[cfg(unix)]
fn interrupted_by_user(status: ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    status.signal() == Some(SIGINT)
}

#[cfg(not(unix))]
fn interrupted_by_user(_status: ExitStatus) -> bool {
    false
}
