// SPDX-License-Identifier: Apache-2.0

//! The simulation flow:
//!
//! ```text
//! PREPARE -> ANALYZE_PACKAGES -> ANALYZE_SOURCES -> ELABORATE -> RUN -> [VIEW | SKIP_VIEW]
//! ```
//!
//! Every stage runs to completion even when individual tool invocations fail;
//! each invocation's status is kept in a `StageReport`. Only workspace
//! preparation can abort the flow.

use std::path::PathBuf;

use crate::config::ResolvedProject;
use crate::discovery::discover_sources;
use crate::ghdlsim_error::GhdlSimError;
use crate::tools::{Invocation, InvocationStatus, ToolRunner, Toolchain};
use crate::viewer::launch_viewers;
use crate::workspace::prepare_workspace;

/// Why the viewer stage did not open anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The run stage's aggregate status is a failure.
    RunFailed,
    /// The caller asked not to open viewers.
    Disabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Prepare,
    AnalyzePackages,
    AnalyzeSources,
    Elaborate,
    Run,
    View,
    SkipView(SkipReason),
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Prepare => "prepare workspace",
            Stage::AnalyzePackages => "analyze packages",
            Stage::AnalyzeSources => "analyze sources",
            Stage::Elaborate => "elaborate testbenches",
            Stage::Run => "run testbenches",
            Stage::View => "open wave files",
            Stage::SkipView(_) => "skip wave files",
        };
        write!(f, "{}", name)
    }
}

/// One tool invocation and how it ended.
#[derive(Clone, Debug)]
pub struct InvocationOutcome {
    /// The file or testbench the invocation was about.
    pub subject: String,
    pub invocation: Invocation,
    pub status: InvocationStatus,
}

/// Every invocation made by one stage, in invocation order.
#[derive(Clone, Debug)]
pub struct StageReport {
    pub stage: Stage,
    pub outcomes: Vec<InvocationOutcome>,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        StageReport {
            stage,
            outcomes: vec![],
        }
    }

    /// Aggregate status of the stage: the status of its *last* invocation.
    ///
    /// Earlier failures are overridden by a later success, so with testbenches
    /// `[A, B]` where only `A` fails the stage counts as successful. A stage
    /// without invocations is successful.
    pub fn last_call_failed(&self) -> bool {
        self.outcomes
            .last()
            .map(|o| !o.status.is_success())
            .unwrap_or(false)
    }

    pub fn failures(&self) -> impl Iterator<Item = &InvocationOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_success())
    }

    pub fn any_failed(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn subjects(&self) -> Vec<&str> {
        self.outcomes.iter().map(|o| o.subject.as_str()).collect()
    }
}

/// Receives progress notifications so a front-end can print banners around
/// the tools' own output. All methods default to doing nothing.
pub trait StageObserver {
    fn stage_started(&mut self, _stage: Stage) {}
    fn invocation_finished(&mut self, _stage: Stage, _outcome: &InvocationOutcome) {}
    fn stage_finished(&mut self, _report: &StageReport) {}
}

impl StageObserver for () {}

/// Everything a flow needs besides the runner.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub project: ResolvedProject,
    pub toolchain: Toolchain,
    /// Passed verbatim to `--stop-time=`.
    pub stop_time: String,
    /// When false the viewer stage is skipped even after a successful run.
    pub open_viewer: bool,
}

/// Stage reports of a completed flow, in stage order.
#[derive(Clone, Debug)]
pub struct PipelineReport {
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    pub fn elaborate_failed(&self) -> bool {
        self.stage(Stage::Elaborate)
            .map(StageReport::last_call_failed)
            .unwrap_or(false)
    }

    pub fn run_failed(&self) -> bool {
        self.stage(Stage::Run)
            .map(StageReport::last_call_failed)
            .unwrap_or(false)
    }

    /// Every failed analysis, packages first.
    pub fn analysis_failures(&self) -> Vec<&InvocationOutcome> {
        [Stage::AnalyzePackages, Stage::AnalyzeSources]
            .iter()
            .filter_map(|s| self.stage(*s))
            .flat_map(|r| r.failures())
            .collect()
    }

    /// The last stage, i.e. `View` or `SkipView`.
    pub fn view_stage(&self) -> Option<&StageReport> {
        self.stages.last()
    }
}

/// Runs `invocation` as part of `report`'s stage and records the outcome.
pub(crate) fn record(
    report: &mut StageReport,
    subject: String,
    invocation: Invocation,
    detached: bool,
    runner: &mut dyn ToolRunner,
    observer: &mut dyn StageObserver,
) {
    let status = if detached {
        runner.launch(&invocation)
    } else {
        runner.run(&invocation)
    };
    if !status.is_success() {
        log::warn!("{}: {} failed: {}", report.stage, subject, status);
    }
    let outcome = InvocationOutcome {
        subject,
        invocation,
        status,
    };
    observer.invocation_finished(report.stage, &outcome);
    report.outcomes.push(outcome);
}

fn analyze_files(
    stage: Stage,
    files: Vec<PathBuf>,
    project: &ResolvedProject,
    toolchain: &Toolchain,
    runner: &mut dyn ToolRunner,
    observer: &mut dyn StageObserver,
) -> StageReport {
    let mut report = StageReport::new(stage);
    for file in files {
        let invocation = toolchain.analyze(project, &file);
        record(
            &mut report,
            file.display().to_string(),
            invocation,
            false,
            runner,
            observer,
        );
    }
    report
}

/// Analyzes the package files in list order; later packages may depend on
/// earlier ones.
pub fn analyze_packages(
    project: &ResolvedProject,
    toolchain: &Toolchain,
    runner: &mut dyn ToolRunner,
    observer: &mut dyn StageObserver,
) -> StageReport {
    log::info!("analyze_packages; count: {}", project.packages.len());
    analyze_files(
        Stage::AnalyzePackages,
        project.package_paths(),
        project,
        toolchain,
        runner,
        observer,
    )
}

/// Analyzes every discovered non-package source.
pub fn analyze_sources(
    project: &ResolvedProject,
    toolchain: &Toolchain,
    runner: &mut dyn ToolRunner,
    observer: &mut dyn StageObserver,
) -> StageReport {
    let sources = discover_sources(project);
    log::info!("analyze_sources; count: {}", sources.len());
    analyze_files(
        Stage::AnalyzeSources,
        sources,
        project,
        toolchain,
        runner,
        observer,
    )
}

pub fn elaborate_testbenches(
    project: &ResolvedProject,
    toolchain: &Toolchain,
    runner: &mut dyn ToolRunner,
    observer: &mut dyn StageObserver,
) -> StageReport {
    log::info!("elaborate_testbenches; testbenches: {:?}", project.testbenches);
    let mut report = StageReport::new(Stage::Elaborate);
    for testbench in &project.testbenches {
        let invocation = toolchain.elaborate(project, testbench);
        record(
            &mut report,
            testbench.clone(),
            invocation,
            false,
            runner,
            observer,
        );
    }
    report
}

pub fn run_testbenches(
    project: &ResolvedProject,
    toolchain: &Toolchain,
    stop_time: &str,
    runner: &mut dyn ToolRunner,
    observer: &mut dyn StageObserver,
) -> StageReport {
    log::info!(
        "run_testbenches; testbenches: {:?}; stop_time: {}",
        project.testbenches,
        stop_time
    );
    let mut report = StageReport::new(Stage::Run);
    for testbench in &project.testbenches {
        let invocation = toolchain.run(project, testbench, stop_time);
        record(
            &mut report,
            testbench.clone(),
            invocation,
            false,
            runner,
            observer,
        );
    }
    report
}

/// Runs the whole flow. Returns an error only if the workspace cannot be
/// prepared; tool failures are reported through the stage reports.
pub fn run_pipeline(
    options: &PipelineOptions,
    runner: &mut dyn ToolRunner,
    observer: &mut dyn StageObserver,
) -> Result<PipelineReport, GhdlSimError> {
    let project = &options.project;
    let toolchain = &options.toolchain;
    if project.testbenches.is_empty() {
        log::warn!("no testbenches configured; nothing will be elaborated or run");
    }

    observer.stage_started(Stage::Prepare);
    prepare_workspace(&project.workspace_dir)?;
    let prepare = StageReport::new(Stage::Prepare);
    observer.stage_finished(&prepare);
    let mut stages = vec![prepare];

    observer.stage_started(Stage::AnalyzePackages);
    let packages = analyze_packages(project, toolchain, runner, observer);
    observer.stage_finished(&packages);
    stages.push(packages);

    observer.stage_started(Stage::AnalyzeSources);
    let sources = analyze_sources(project, toolchain, runner, observer);
    observer.stage_finished(&sources);
    stages.push(sources);

    observer.stage_started(Stage::Elaborate);
    let elaborate = elaborate_testbenches(project, toolchain, runner, observer);
    observer.stage_finished(&elaborate);
    stages.push(elaborate);

    observer.stage_started(Stage::Run);
    let run = run_testbenches(project, toolchain, &options.stop_time, runner, observer);
    observer.stage_finished(&run);
    let run_failed = run.last_call_failed();
    stages.push(run);

    let view_stage = if run_failed {
        Stage::SkipView(SkipReason::RunFailed)
    } else if !options.open_viewer {
        Stage::SkipView(SkipReason::Disabled)
    } else {
        Stage::View
    };
    observer.stage_started(view_stage);
    let view = match view_stage {
        Stage::View => launch_viewers(project, toolchain, runner, observer),
        _ => StageReport::new(view_stage),
    };
    observer.stage_finished(&view);
    stages.push(view);

    Ok(PipelineReport { stages })
}
