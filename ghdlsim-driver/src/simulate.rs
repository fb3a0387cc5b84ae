// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use clap::ArgMatches;
use ghdlsim::{run_pipeline, PipelineOptions, PipelineReport, ProjectConfig, SystemRunner};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::banner::BannerPrinter;
use crate::common::parse_bool_flag_or;
use crate::report_cli_error::{report_cli_error_and_exit, report_cli_warning};
use crate::toolchain_config::{
    get_ghdl, get_gtkwave, make_toolchain, resolve_executable, ToolchainConfig,
};

/// VHDL physical literal of type `time`, e.g. `100ns` or `1.5 us`.
static TIME_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[0-9]+(\.[0-9]+)?\s*(fs|ps|ns|us|ms|sec|min|hr)\s*$")
        .expect("time literal regex is valid")
});

pub fn looks_like_vhdl_time(stop_time: &str) -> bool {
    TIME_LITERAL.is_match(stop_time)
}

/// Whether the driver should report failure through its exit status.
pub fn flow_failed(report: &PipelineReport) -> bool {
    report.elaborate_failed() || report.run_failed() || !report.analysis_failures().is_empty()
}

pub fn handle_simulate(
    matches: &ArgMatches,
    project_config: Option<ProjectConfig>,
    toolchain_config: &Option<ToolchainConfig>,
    base_dir: &Path,
) -> i32 {
    log::info!("handle_simulate; base_dir: {}", base_dir.display());
    let stop_time = matches
        .get_one::<String>("STOP_TIME")
        .expect("STOP_TIME is a required argument")
        .clone();
    if !looks_like_vhdl_time(&stop_time) {
        log::warn!(
            "stop time {:?} does not look like a VHDL time literal; passing it to ghdl as-is",
            stop_time
        );
    }

    let mut project_config = project_config.unwrap_or_default();
    if let Some(sim_dir) = matches.get_one::<String>("sim_dir") {
        // Relative to where the driver was invoked, not to the config file.
        let cwd = match std::env::current_dir() {
            Ok(cwd) => cwd,
            Err(e) => report_cli_error_and_exit(
                "cannot determine current directory",
                None,
                vec![("error", &e.to_string())],
            ),
        };
        project_config.sim_dir = Some(cwd.join(sim_dir));
    }
    let mut project = match project_config.resolve(base_dir) {
        Ok(project) => project,
        Err(e) => report_cli_error_and_exit(
            "invalid project configuration",
            None,
            vec![("error", &e.to_string())],
        ),
    };
    if let Some(testbenches) = matches.get_many::<String>("testbench") {
        project = match project.with_testbenches(testbenches.cloned().collect()) {
            Ok(project) => project,
            Err(e) => report_cli_error_and_exit(
                "invalid --testbench value",
                None,
                vec![("error", &e.to_string())],
            ),
        };
    }

    let open_viewer = parse_bool_flag_or(matches, "view", true);
    let fail_on_error = parse_bool_flag_or(matches, "fail_on_error", false);

    let ghdl_name = get_ghdl(matches, toolchain_config);
    let ghdl = match resolve_executable(&ghdl_name) {
        Ok(path) => path,
        Err(e) => report_cli_error_and_exit(
            "ghdl executable not found",
            None,
            vec![("ghdl", &ghdl_name), ("error", &e.to_string())],
        ),
    };
    let gtkwave_name = get_gtkwave(matches, toolchain_config);
    let gtkwave = match resolve_executable(&gtkwave_name) {
        Ok(path) => path,
        Err(e) => {
            if open_viewer {
                report_cli_warning(
                    "gtkwave executable not found; wave files cannot be opened",
                    vec![("gtkwave", &gtkwave_name), ("error", &e.to_string())],
                );
            }
            PathBuf::from(&gtkwave_name)
        }
    };
    let toolchain = make_toolchain(ghdl, gtkwave, toolchain_config);
    log::info!("toolchain: {:?}", toolchain);

    let options = PipelineOptions {
        project,
        toolchain,
        stop_time,
        open_viewer,
    };
    let report = match run_pipeline(&options, &mut SystemRunner, &mut BannerPrinter) {
        Ok(report) => report,
        Err(e) => report_cli_error_and_exit(
            "simulation setup failed",
            None,
            vec![("error", &e.to_string())],
        ),
    };

    log::info!(
        "flow finished; analysis failures: {}; elaborate failed: {}; run failed: {}",
        report.analysis_failures().len(),
        report.elaborate_failed(),
        report.run_failed()
    );
    if fail_on_error && flow_failed(&report) {
        1
    } else {
        0
    }
}
