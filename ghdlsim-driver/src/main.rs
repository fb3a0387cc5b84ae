// SPDX-License-Identifier: Apache-2.0

//! Command line driver that runs a GHDL simulation flow for a VHDL project.
//!
//! The flow wipes the working library, analyzes the shared packages (in the
//! configured order) and then every other source found under the source
//! folders, elaborates and runs each testbench for the given simulated time,
//! and finally opens GTKWave on the resulting `.ghw` traces.
//!
//! ```text
//! ghdlsim-driver <options> <STOP_TIME>
//! ```
//!
//! The project is described by a `ghdlsim.toml`, given via `--config` or
//! picked up from the current directory:
//!
//! ```toml
//! [toolchain]
//! ghdl = "/usr/local/bin/ghdl"
//! ieee = "synopsys"
//!
//! [project]
//! packages = ["pkg_Common.vhd", "pkg_CoefficientsFi.vhd"]
//! include_files = ["AddersTree.vhd", "FIR.vhd", "ParallelFIR.vhd", "ParallelFIR_tb.vhd"]
//! testbenches = ["ParallelFIR_tb"]
//! ```
//!
//! Sample usage:
//!
//! ```shell
//! $ cargo run -- --config=sim/ghdlsim.toml 100ns
//! $ cargo run -- --testbench=FIR_tb --view=false 2us
//! ```

mod banner;
mod common;
mod report_cli_error;
mod simulate;
mod toolchain_config;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Arg, ArgAction};
use ghdlsim::ProjectConfig;
use report_cli_error::report_cli_error_and_exit;
use serde::Deserialize;

use crate::toolchain_config::ToolchainConfig;

const CONFIG_FILE_NAME: &str = "ghdlsim.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GhdlSimToml {
    toolchain: Option<ToolchainConfig>,
    project: Option<ProjectConfig>,
}

trait AppExt {
    fn add_bool_arg(self, long: &'static str, help: &'static str) -> Self;
    fn add_tool_args(self) -> Self;
}

impl AppExt for clap::Command {
    /// Adds a boolean argument to the command; the helper ensures we have a
    /// uniform style/handling for boolean arguments.
    fn add_bool_arg(self, long: &'static str, help: &'static str) -> Self {
        (self as clap::Command).arg(
            Arg::new(long)
                .long(long)
                .value_name("BOOL")
                .action(ArgAction::Set)
                .value_parser(["true", "false"])
                .num_args(1)
                .help(help),
        )
    }

    fn add_tool_args(self) -> Self {
        (self as clap::Command)
            .arg(
                Arg::new("ghdl")
                    .long("ghdl")
                    .value_name("GHDL")
                    .help("GHDL executable (overrides the toolchain config)")
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("gtkwave")
                    .long("gtkwave")
                    .value_name("GTKWAVE")
                    .help("GTKWave executable (overrides the toolchain config)")
                    .action(ArgAction::Set),
            )
    }
}

fn load_config_file(path: &Path) -> anyhow::Result<GhdlSimToml> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parse config file {}", path.display()))
}

fn main() {
    let _ = env_logger::try_init();

    log::info!(
        "ghdlsim-driver starting; version: {}",
        env!("CARGO_PKG_VERSION")
    );

    let matches = clap::Command::new("ghdlsim-driver")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Analyzes, elaborates and runs VHDL testbenches with GHDL, then opens GTKWave")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("CONFIG")
                .help("Path to a ghdlsim.toml file")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("sim_dir")
                .long("sim_dir")
                .value_name("SIM_DIR")
                .help("Simulation directory (holds work/, waves/ and the traces)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("testbench")
                .long("testbench")
                .value_name("TESTBENCH")
                .help("Testbench to elaborate and run; repeat for several (overrides the config)")
                .action(ArgAction::Append),
        )
        .add_tool_args()
        .add_bool_arg("view", "Open GTKWave after a successful run (default true)")
        .add_bool_arg(
            "fail_on_error",
            "Exit with status 1 if any analysis, elaboration or run failed (default false)",
        )
        .arg(
            Arg::new("STOP_TIME")
                .help("Simulated time to run each testbench for, e.g. 100ns")
                .required(true)
                .index(1),
        )
        .get_matches();

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => report_cli_error_and_exit(
            "cannot determine current directory",
            None,
            vec![("error", &e.to_string())],
        ),
    };

    let mut config_path: Option<PathBuf> = matches.get_one::<String>("config").map(PathBuf::from);

    // If there is no config flag specified, but there is a ghdlsim.toml in the
    // current directory, use that.
    if config_path.is_none() {
        let cwd_config_path = cwd.join(CONFIG_FILE_NAME);
        if cwd_config_path.exists() {
            log::info!(
                "Using {} in current directory: {}",
                CONFIG_FILE_NAME,
                cwd_config_path.display()
            );
            config_path = Some(cwd_config_path);
        }
    }

    let (config, base_dir) = match config_path {
        Some(path) => {
            let path = cwd.join(path);
            if !path.exists() {
                report_cli_error_and_exit(
                    "config file does not exist",
                    None,
                    vec![
                        ("path", &path.display().to_string()),
                        ("working directory", &cwd.display().to_string()),
                    ],
                );
            }
            let config = match load_config_file(&path) {
                Ok(config) => config,
                Err(e) => report_cli_error_and_exit(
                    "could not load config file",
                    None,
                    vec![("error", &format!("{:#}", e))],
                ),
            };
            let base_dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| cwd.clone());
            (config, base_dir)
        }
        None => (GhdlSimToml::default(), cwd.clone()),
    };

    let exit_code =
        simulate::handle_simulate(&matches, config.project, &config.toolchain, &base_dir);
    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_with_both_tables() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
[toolchain]
ghdl = "/opt/ghdl/bin/ghdl"
extra_flags = ["--std=08"]

[project]
packages = ["pkg_Common.vhd"]
testbenches = ["FIR_tb"]
"#,
        )
        .unwrap();
        let config = load_config_file(&path).unwrap();
        let toolchain = config.toolchain.unwrap();
        assert_eq!(toolchain.ghdl.as_deref(), Some("/opt/ghdl/bin/ghdl"));
        assert_eq!(config.project.unwrap().testbenches, vec!["FIR_tb"]);
    }

    #[test]
    fn unknown_table_is_reported_with_the_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[simulation]\nstop = 1\n").unwrap();
        let err = load_config_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parse config file"), "{:#}", err);
    }
}
