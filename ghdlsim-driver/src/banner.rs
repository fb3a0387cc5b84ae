// SPDX-License-Identifier: Apache-2.0

//! Human readable progress banners printed between the tools' own output.

use colored::Colorize;
use ghdlsim::{InvocationOutcome, SkipReason, Stage, StageObserver, StageReport};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Warning,
    Error,
}

/// Heading printed when `stage` starts, if any.
pub fn started_banner(stage: Stage) -> Option<(String, Tone)> {
    let text = match stage {
        Stage::Prepare => return None,
        Stage::AnalyzePackages => "\n* ANALYZE PACKAGES",
        Stage::AnalyzeSources => "\n* ANALYZE ALL SOURCES",
        Stage::Elaborate => "\n* ELABORATE THE TESTBENCHES",
        Stage::Run => "\n* RUN THE TESTBENCHES",
        Stage::View => "\n* OPEN THE WAVE FILES",
        Stage::SkipView(SkipReason::RunFailed) => {
            return Some((
                "\n* NOT OPENING THE WAVE FILES DUE TO PREVIOUS RUN ERRORS!".to_string(),
                Tone::Error,
            ))
        }
        Stage::SkipView(SkipReason::Disabled) => "\n* NOT OPENING THE WAVE FILES (disabled)",
    };
    Some((text.to_string(), Tone::Plain))
}

/// Summary printed when a stage completes, if any.
pub fn finished_banner(report: &StageReport) -> Option<(String, Tone)> {
    let analysis_summary = |what: &str| {
        let failed = report.failures().count();
        if failed == 0 {
            (format!("\n{} done.\n", what), Tone::Plain)
        } else {
            (
                format!(
                    "\n{} done; {} of {} file(s) failed to analyze.\n",
                    what,
                    failed,
                    report.outcomes.len()
                ),
                Tone::Warning,
            )
        }
    };
    match report.stage {
        Stage::AnalyzePackages => Some(analysis_summary("Analyze packages")),
        Stage::AnalyzeSources => Some(analysis_summary("Analyze all sources")),
        Stage::Elaborate if report.last_call_failed() => Some((
            "\nELABORATE THE TESTBENCHES FAILED!".to_string(),
            Tone::Error,
        )),
        Stage::Elaborate => Some((
            "\nElaborate the testbenches done.".to_string(),
            Tone::Plain,
        )),
        Stage::Run if report.last_call_failed() => {
            Some(("\nRUN THE TESTBENCHES FAILED!".to_string(), Tone::Error))
        }
        Stage::Run => Some(("\nRun the testbenches done.".to_string(), Tone::Plain)),
        Stage::Prepare | Stage::View | Stage::SkipView(_) => None,
    }
}

/// Line printed after a single invocation, if any. Successful blocking
/// invocations speak for themselves through the tool's output.
pub fn invocation_line(stage: Stage, outcome: &InvocationOutcome) -> Option<(String, Tone)> {
    match (stage, outcome.status.is_success()) {
        (Stage::AnalyzePackages | Stage::AnalyzeSources, false) => Some((
            format!(
                "warning: analysis of {} failed ({})",
                outcome.subject, outcome.status
            ),
            Tone::Warning,
        )),
        (Stage::View, true) => Some((format!("Opened {}", outcome.subject), Tone::Plain)),
        (Stage::View, false) => Some((
            format!(
                "warning: could not open viewer for {} ({})",
                outcome.subject, outcome.status
            ),
            Tone::Warning,
        )),
        _ => None,
    }
}

fn print(line: Option<(String, Tone)>) {
    match line {
        Some((text, Tone::Plain)) => println!("{}", text),
        Some((text, Tone::Warning)) => println!("{}", text.yellow().bold()),
        Some((text, Tone::Error)) => println!("{}", text.red().bold()),
        None => {}
    }
}

/// Prints the banners to stdout as the flow progresses.
#[derive(Debug, Default)]
pub struct BannerPrinter;

impl StageObserver for BannerPrinter {
    fn stage_started(&mut self, stage: Stage) {
        print(started_banner(stage));
    }

    fn invocation_finished(&mut self, stage: Stage, outcome: &InvocationOutcome) {
        print(invocation_line(stage, outcome));
    }

    fn stage_finished(&mut self, report: &StageReport) {
        print(finished_banner(report));
    }
}
