// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Unit tests for the deployment sequencer, driven by a scripted runner.

use std::collections::VecDeque;

use pio_deploy_common::sequencer::{
    run_step, CommandRunner, RunReport, Sequencer, SequencerState, StepOutcome, StepRecord,
};
use pio_deploy_common::{
    DeployConfig, DeployError, ExecMode, StepKind, ToolCommand, Transcript, TranscriptEvent,
};

/// Replays canned outcomes and remembers every command it was asked to run.
struct ScriptedRunner {
    probe: StepOutcome,
    outcomes: VecDeque<StepOutcome>,
    probed: Vec<ToolCommand>,
    ran: Vec<(ToolCommand, ExecMode)>,
}

impl ScriptedRunner {
    fn new(outcomes: Vec<StepOutcome>) -> Self {
        Self {
            probe: StepOutcome::Success,
            outcomes: outcomes.into(),
            probed: Vec::new(),
            ran: Vec::new(),
        }
    }

    fn missing_toolchain() -> Self {
        Self {
            probe: StepOutcome::failure("executable not found"),
            ..Self::new(Vec::new())
        }
    }

    fn ran_kinds(&self) -> Vec<Vec<String>> {
        self.ran.iter().map(|(cmd, _)| cmd.args.clone()).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn probe(&mut self, command: &ToolCommand) -> StepOutcome {
        self.probed.push(command.clone());
        self.probe.clone()
    }

    fn run(&mut self, command: &ToolCommand, mode: ExecMode) -> StepOutcome {
        self.ran.push((command.clone(), mode));
        self.outcomes.pop_front().unwrap_or(StepOutcome::Success)
    }
}

#[derive(Default)]
struct Recorder {
    lines: Vec<String>,
}

impl Recorder {
    fn count(&self, needle: &str) -> usize {
        self.lines.iter().filter(|l| l.contains(needle)).count()
    }
}

impl Transcript for Recorder {
    fn record(&mut self, event: TranscriptEvent<'_>) {
        self.lines.push(event.to_string());
    }
}

fn deploy(outcomes: Vec<StepOutcome>) -> (Result<RunReport, DeployError>, ScriptedRunner, Recorder) {
    let config = DeployConfig::default();
    let mut runner = ScriptedRunner::new(outcomes);
    let mut transcript = Recorder::default();
    let result = Sequencer::new(&config, &mut runner, &mut transcript).run();
    (result, runner, transcript)
}

// =============================================================================
// State transition tests
// =============================================================================

#[test]
fn test_start_leaves_idle_for_building() {
    assert_eq!(SequencerState::Idle.start(), SequencerState::Building);
}

#[test]
fn test_start_is_noop_outside_idle() {
    assert_eq!(SequencerState::Monitoring.start(), SequencerState::Monitoring);
    assert_eq!(SequencerState::Failed.start(), SequencerState::Failed);
}

#[test]
fn test_success_walks_the_chain() {
    let ok = StepOutcome::Success;
    let mut state = SequencerState::Building;
    let mut visited = vec![state];
    while !state.is_terminal() {
        state = state.transition(&ok);
        visited.push(state);
    }
    assert_eq!(
        visited,
        vec![
            SequencerState::Building,
            SequencerState::UploadingFilesystem,
            SequencerState::UploadingFirmware,
            SequencerState::Monitoring,
            SequencerState::Done,
        ]
    );
}

#[test]
fn test_failure_in_first_three_states_fails() {
    let failed = StepOutcome::failure("exit status: 1");
    for state in [
        SequencerState::Building,
        SequencerState::UploadingFilesystem,
        SequencerState::UploadingFirmware,
    ] {
        assert_eq!(state.transition(&failed), SequencerState::Failed, "{:?}", state);
    }
}

#[test]
fn test_monitoring_always_ends_done() {
    for outcome in [
        StepOutcome::Success,
        StepOutcome::failure("exit status: 2"),
        StepOutcome::Interrupted,
    ] {
        assert_eq!(
            SequencerState::Monitoring.transition(&outcome),
            SequencerState::Done
        );
    }
}

#[test]
fn test_terminal_states_do_not_move() {
    for state in [SequencerState::Done, SequencerState::Failed, SequencerState::Idle] {
        assert_eq!(state.transition(&StepOutcome::Success), state);
        assert_eq!(state.step(), None);
    }
}

#[test]
fn test_interrupt_before_monitor_is_fatal() {
    assert_eq!(
        SequencerState::UploadingFirmware.transition(&StepOutcome::Interrupted),
        SequencerState::Failed
    );
}

// =============================================================================
// run_step tests
// =============================================================================

#[test]
fn test_run_step_success_prints_start_and_success() {
    let config = DeployConfig::default();
    let step = &config.pipeline()[0];
    let mut runner = ScriptedRunner::new(vec![StepOutcome::Success]);
    let mut transcript = Recorder::default();

    let outcome = run_step(&mut runner, &mut transcript, step);

    assert_eq!(outcome, StepOutcome::Success);
    assert_eq!(
        transcript.lines,
        vec![
            "\n=== Building project ===".to_string(),
            "✓ Building project completed successfully!".to_string(),
        ]
    );
}

#[test]
fn test_run_step_failure_includes_detail() {
    let config = DeployConfig::default();
    let step = &config.pipeline()[1];
    let mut runner = ScriptedRunner::new(vec![StepOutcome::failure("exit status: 1")]);
    let mut transcript = Recorder::default();

    let outcome = run_step(&mut runner, &mut transcript, step);

    assert_eq!(outcome, StepOutcome::failure("exit status: 1"));
    assert_eq!(
        transcript.lines[1],
        "✗ Error during Uploading filesystem: exit status: 1"
    );
}

#[test]
fn test_run_step_uses_step_exec_mode() {
    let config = DeployConfig::default();
    let mut runner = ScriptedRunner::new(Vec::new());
    let mut transcript = Recorder::default();

    for step in config.pipeline() {
        run_step(&mut runner, &mut transcript, &step);
    }

    let modes: Vec<ExecMode> = runner.ran.iter().map(|(_, mode)| *mode).collect();
    assert_eq!(
        modes,
        vec![
            ExecMode::Blocking,
            ExecMode::Blocking,
            ExecMode::Blocking,
            ExecMode::Interruptible,
        ]
    );
}

// =============================================================================
// Full pipeline tests
// =============================================================================

#[test]
fn test_all_steps_succeed() {
    let (result, runner, transcript) = deploy(Vec::new());
    let report = result.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.steps.len(), 4);
    assert!(report.steps.iter().all(|r| r.outcome.is_success()));
    assert_eq!(runner.ran.len(), 4);
    assert_eq!(transcript.count("==="), 4);
    assert_eq!(transcript.count("completed successfully"), 3);
    assert!(report.into_result().is_ok());
}

#[test]
fn test_toolchain_probe_runs_version_check() {
    let (_, runner, _) = deploy(Vec::new());
    assert_eq!(runner.probed.len(), 1);
    assert_eq!(runner.probed[0].program, "platformio");
    assert_eq!(runner.probed[0].args, vec!["--version".to_string()]);
}

#[test]
fn test_missing_toolchain_runs_nothing() {
    let config = DeployConfig::default();
    let mut runner = ScriptedRunner::missing_toolchain();
    let mut transcript = Recorder::default();
    let mut sequencer = Sequencer::new(&config, &mut runner, &mut transcript);

    let err = sequencer.run().unwrap_err();

    assert_eq!(sequencer.state(), SequencerState::Idle);
    assert_eq!(
        err,
        DeployError::ToolchainNotFound {
            program: "platformio".to_string(),
            detail: "executable not found".to_string(),
        }
    );
    assert!(runner.ran.is_empty());
    assert!(transcript.lines.is_empty());
}

#[test]
fn test_each_abort_step_stops_the_pipeline() {
    for failing in 0..3 {
        let mut outcomes = vec![StepOutcome::Success; failing];
        outcomes.push(StepOutcome::failure("exit status: 1"));

        let (result, runner, transcript) = deploy(outcomes);
        let report = result.unwrap();

        assert_eq!(report.state, SequencerState::Failed);
        assert_eq!(runner.ran.len(), failing + 1, "step {} failing", failing);
        assert_eq!(transcript.count("✗ Error during"), 1);
        assert!(report.outcome_of(StepKind::Monitor).is_none());
        assert!(report.into_result().is_err());
    }
}

#[test]
fn test_build_failure_transcript() {
    let (result, runner, transcript) = deploy(vec![StepOutcome::failure("exit status: 1")]);
    let report = result.unwrap();

    assert_eq!(runner.ran_kinds(), vec![vec!["run".to_string()]]);
    assert_eq!(
        transcript.lines,
        vec![
            "\n=== Building project ===".to_string(),
            "✗ Error during Building project: exit status: 1".to_string(),
        ]
    );
    assert_eq!(
        report.into_result(),
        Err(DeployError::StepFailed {
            step: "Building project".to_string(),
            detail: "exit status: 1".to_string(),
        })
    );
}

#[test]
fn test_monitor_interrupt_is_benign() {
    let (result, _, transcript) = deploy(vec![
        StepOutcome::Success,
        StepOutcome::Success,
        StepOutcome::Success,
        StepOutcome::Interrupted,
    ]);
    let report = result.unwrap();

    assert!(report.succeeded());
    assert_eq!(
        report.outcome_of(StepKind::Monitor),
        Some(&StepOutcome::Interrupted)
    );
    assert_eq!(transcript.count("\n=== "), 4);
    assert_eq!(transcript.count("completed successfully"), 3);
    assert_eq!(transcript.count("Serial monitor stopped"), 1);
    assert_eq!(transcript.count("Error"), 0);
    assert!(report.into_result().is_ok());
}

#[test]
fn test_monitor_failure_keeps_prior_outcomes() {
    let (result, _, transcript) = deploy(vec![
        StepOutcome::Success,
        StepOutcome::Success,
        StepOutcome::Success,
        StepOutcome::failure("exit status: 1"),
    ]);
    let report = result.unwrap();

    assert!(report.succeeded());
    assert_eq!(
        &report.steps[..3],
        &[
            StepRecord {
                kind: StepKind::Build,
                outcome: StepOutcome::Success
            },
            StepRecord {
                kind: StepKind::UploadFilesystem,
                outcome: StepOutcome::Success
            },
            StepRecord {
                kind: StepKind::UploadFirmware,
                outcome: StepOutcome::Success
            },
        ]
    );
    assert_eq!(
        transcript.lines.last().map(String::as_str),
        Some("Error starting serial monitor: exit status: 1")
    );
    assert!(report.into_result().is_ok());
}

#[test]
fn test_monitor_clean_exit_prints_nothing_more() {
    let (_, _, transcript) = deploy(Vec::new());
    assert_eq!(
        transcript.lines.last().map(String::as_str),
        Some("\n=== Starting Serial Monitor ===\nPress Ctrl+C to exit")
    );
}

#[test]
fn test_second_run_starts_over() {
    let config = DeployConfig::default();
    let mut runner = ScriptedRunner::new(vec![
        StepOutcome::Success,
        StepOutcome::Success,
        StepOutcome::Success,
        StepOutcome::Success,
        StepOutcome::failure("exit status: 1"),
    ]);
    let mut transcript = Recorder::default();
    let mut sequencer = Sequencer::new(&config, &mut runner, &mut transcript);

    let first = sequencer.run().unwrap();
    assert!(first.succeeded());
    assert_eq!(sequencer.state(), SequencerState::Done);

    let second = sequencer.run().unwrap();
    assert_eq!(second.state, SequencerState::Failed);
    assert_eq!(second.steps.len(), 1);
    assert_eq!(
        second.outcome_of(StepKind::Build),
        Some(&StepOutcome::failure("exit status: 1"))
    );

    assert_eq!(runner.probed.len(), 2);
    assert_eq!(runner.ran.len(), 5);
}
