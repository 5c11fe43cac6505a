// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! The fixed deployment pipeline and the toolchain command lines it runs.

use std::fmt;
use std::path::PathBuf;

/// Executable invoked when no `--toolchain` override is given.
pub const DEFAULT_TOOLCHAIN: &str = "platformio";

/// Pipeline steps in execution order.
pub const PIPELINE_ORDER: [StepKind; 4] = [
    StepKind::Build,
    StepKind::UploadFilesystem,
    StepKind::UploadFirmware,
    StepKind::Monitor,
];

/// One stage of the deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepKind {
    Build,
    UploadFilesystem,
    UploadFirmware,
    Monitor,
}

/// What a failing step does to the rest of the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the pipeline and fail the run.
    Abort,
    /// Report the failure, keep the run outcome.
    BestEffort,
}

/// How the runner waits for the child process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecMode {
    /// Wait until the child exits; Ctrl+C keeps its default effect.
    Blocking,
    /// Wait until the child exits or the user presses Ctrl+C.
    Interruptible,
}

impl StepKind {
    /// Human-readable label used in the transcript.
    pub fn label(self) -> &'static str {
        match self {
            StepKind::Build => "Building project",
            StepKind::UploadFilesystem => "Uploading filesystem",
            StepKind::UploadFirmware => "Uploading firmware",
            StepKind::Monitor => "Starting Serial Monitor",
        }
    }

    pub fn failure_policy(self) -> FailurePolicy {
        match self {
            StepKind::Monitor => FailurePolicy::BestEffort,
            _ => FailurePolicy::Abort,
        }
    }

    pub fn exec_mode(self) -> ExecMode {
        match self {
            StepKind::Monitor => ExecMode::Interruptible,
            _ => ExecMode::Blocking,
        }
    }
}

/// An external command: program, arguments and working directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            working_dir: None,
        }
    }

    /// Run the command from `dir` instead of the current directory.
    pub fn in_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// A pipeline stage bound to its concrete command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineStep {
    pub kind: StepKind,
    pub command: ToolCommand,
}

impl PipelineStep {
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}

/// Deployment settings, resolved once from the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployConfig {
    /// Toolchain executable name or path.
    pub toolchain: String,
    /// Working directory for every child process (None = inherit).
    pub project_dir: Option<PathBuf>,
    /// PlatformIO environment (`-e`).
    pub environment: Option<String>,
    /// Serial port for uploads and the monitor.
    pub port: Option<String>,
    /// Monitor baud rate.
    pub baud: Option<u32>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            toolchain: DEFAULT_TOOLCHAIN.to_string(),
            project_dir: None,
            environment: None,
            port: None,
            baud: None,
        }
    }
}

impl DeployConfig {
    /// The presence probe: `<toolchain> --version`.
    pub fn version_check(&self) -> ToolCommand {
        ToolCommand::new(&self.toolchain, ["--version"]).in_dir(self.project_dir.clone())
    }

    /// Build the command for a single step.
    pub fn command_for(&self, kind: StepKind) -> ToolCommand {
        let mut args: Vec<String> = match kind {
            StepKind::Build => vec!["run".into()],
            StepKind::UploadFilesystem => vec!["run".into(), "-t".into(), "uploadfs".into()],
            StepKind::UploadFirmware => vec!["run".into(), "-t".into(), "upload".into()],
            StepKind::Monitor => vec!["device".into(), "monitor".into()],
        };

        if let Some(env) = &self.environment {
            args.push("-e".into());
            args.push(env.clone());
        }

        match kind {
            StepKind::Build => {}
            StepKind::UploadFilesystem | StepKind::UploadFirmware => {
                if let Some(port) = &self.port {
                    args.push("--upload-port".into());
                    args.push(port.clone());
                }
            }
            StepKind::Monitor => {
                if let Some(port) = &self.port {
                    args.push("--port".into());
                    args.push(port.clone());
                }
                if let Some(baud) = self.baud {
                    args.push("--baud".into());
                    args.push(baud.to_string());
                }
            }
        }

        ToolCommand::new(&self.toolchain, args).in_dir(self.project_dir.clone())
    }

    /// All four steps in execution order.
    pub fn pipeline(&self) -> Vec<PipelineStep> {
        PIPELINE_ORDER
            .iter()
            .map(|&kind| PipelineStep {
                kind,
                command: self.command_for(kind),
            })
            .collect()
    }
}
