// SPDX-License-Identifier: Apache-2.0

//! Runs the driver binary against a scratch project with shell scripts
//! standing in for `ghdl` and `gtkwave`. Each script appends its arguments to
//! a log file next to it.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{Duration, Instant};

use ghdlsim_test_helpers::write_tree;
use pretty_assertions::assert_eq;

/// Fake `ghdl`: logs `$@` and exits 1 when `"<mode> <subject>"` equals
/// `$GHDL_FAIL`. With the default flags the subject is the fifth argument.
const FAKE_GHDL: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/ghdl.log"
if [ -n "$GHDL_FAIL" ] && [ "$1 $5" = "$GHDL_FAIL" ]; then
  exit 1
fi
exit 0
"#;

const FAKE_GTKWAVE: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/gtkwave.log"
"#;

struct Fixture {
    _temp_dir: tempfile::TempDir,
    root: PathBuf,
    bin: PathBuf,
}

impl Fixture {
    fn sim(&self) -> PathBuf {
        self.root.join("sim")
    }

    fn ghdl_log(&self) -> Vec<String> {
        read_lines(&self.bin.join("ghdl.log"))
    }

    /// The viewer is launched detached, so its log may show up late.
    fn wait_for_gtkwave_log(&self) -> Vec<String> {
        let path = self.bin.join("gtkwave.log");
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            let lines = read_lines(&path);
            if !lines.is_empty() {
                return lines;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        vec![]
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => text.lines().map(str::to_string).collect(),
        Err(_) => vec![],
    }
}

fn write_script(path: &Path, text: &str) {
    std::fs::write(path, text).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Lays out a project with a `sim/ghdlsim.toml` naming testbenches `A` and
/// `B`, plus fake tools under `bin/`.
fn fixture(ghdl: &str) -> Fixture {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().to_path_buf();
    write_tree(
        &root,
        &["rtl/pkg/pkg_Common.vhd", "rtl/FIR.vhd", "sim/A.vhd", "sim/B.vhd"],
    );
    let bin = root.join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    write_script(&bin.join("ghdl"), FAKE_GHDL);
    write_script(&bin.join("gtkwave"), FAKE_GTKWAVE);

    let ghdl = if ghdl.is_empty() {
        bin.join("ghdl").display().to_string()
    } else {
        ghdl.to_string()
    };
    std::fs::write(
        root.join("sim/ghdlsim.toml"),
        format!(
            r#"[toolchain]
ghdl = "{}"
gtkwave = "{}"

[project]
packages = ["pkg_Common.vhd"]
testbenches = ["A", "B"]
"#,
            ghdl,
            bin.join("gtkwave").display()
        ),
    )
    .unwrap();
    Fixture {
        _temp_dir: temp_dir,
        root,
        bin,
    }
}

fn driver(cwd: &Path, args: &[&str], ghdl_fail: &str) -> Output {
    let command_path = env!("CARGO_BIN_EXE_ghdlsim-driver");
    Command::new(command_path)
        .current_dir(cwd)
        .args(args)
        .env("GHDL_FAIL", ghdl_fail)
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to run ghdlsim-driver")
}

fn describe(output: &Output) -> String {
    format!(
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn full_flow_runs_every_stage_and_opens_the_last_trace() {
    let fixture = fixture("");
    let output = driver(
        &fixture.root,
        &["--config", "sim/ghdlsim.toml", "100ns"],
        "",
    );
    assert!(output.status.success(), "{}", describe(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    for banner in [
        "* ANALYZE PACKAGES",
        "* ANALYZE ALL SOURCES",
        "* ELABORATE THE TESTBENCHES",
        "* RUN THE TESTBENCHES",
        "* OPEN THE WAVE FILES",
    ] {
        assert!(stdout.contains(banner), "missing {:?}\n{}", banner, describe(&output));
    }

    let sim = fixture.sim();
    let modes: Vec<String> = fixture
        .ghdl_log()
        .iter()
        .map(|line| line.split(' ').next().unwrap().to_string())
        .collect();
    assert_eq!(modes, vec!["-a", "-a", "-a", "-a", "-e", "-e", "-r", "-r"]);
    let log = fixture.ghdl_log();
    assert!(log[0].ends_with("pkg_Common.vhd"), "{:?}", log);
    assert_eq!(
        log[7],
        format!(
            "-r --workdir={} --ieee=synopsys -fexplicit B --wave=B.ghw --stop-time=100ns",
            sim.join("work").display()
        )
    );
    assert!(sim.join("work").is_dir());

    assert_eq!(
        fixture.wait_for_gtkwave_log(),
        vec![sim.join("B.ghw").display().to_string()]
    );
}

#[test]
fn failed_last_run_skips_the_viewer() {
    let fixture = fixture("");
    let output = driver(
        &fixture.root,
        &["--config", "sim/ghdlsim.toml", "100ns"],
        "-r B",
    );
    assert!(output.status.success(), "{}", describe(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RUN THE TESTBENCHES FAILED!"), "{}", stdout);
    assert!(
        stdout.contains("NOT OPENING THE WAVE FILES DUE TO PREVIOUS RUN ERRORS!"),
        "{}",
        stdout
    );
    assert!(!fixture.bin.join("gtkwave.log").exists());
}

#[test]
fn fail_on_error_turns_a_failed_elaboration_into_exit_status_one() {
    let fixture = fixture("");
    let output = driver(
        &fixture.root,
        &[
            "--config",
            "sim/ghdlsim.toml",
            "--fail_on_error",
            "true",
            "--view",
            "false",
            "100ns",
        ],
        "-e B",
    );
    assert_eq!(output.status.code(), Some(1), "{}", describe(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ELABORATE THE TESTBENCHES FAILED!"), "{}", stdout);
}

#[test]
fn testbench_flag_overrides_the_config() {
    let fixture = fixture("");
    let output = driver(
        &fixture.root,
        &[
            "--config",
            "sim/ghdlsim.toml",
            "--testbench",
            "A",
            "--view=false",
            "1us",
        ],
        "",
    );
    assert!(output.status.success(), "{}", describe(&output));
    let runs: Vec<String> = fixture
        .ghdl_log()
        .into_iter()
        .filter(|line| line.starts_with("-r "))
        .collect();
    assert_eq!(runs.len(), 1);
    assert!(runs[0].contains(" A --wave=A.ghw --stop-time=1us"), "{:?}", runs);
    assert!(!fixture.bin.join("gtkwave.log").exists());
}

#[test]
fn config_in_the_current_directory_is_picked_up() {
    let fixture = fixture("");
    let output = driver(&fixture.sim(), &["--view=false", "100ns"], "");
    assert!(output.status.success(), "{}", describe(&output));
    assert_eq!(
        fixture
            .ghdl_log()
            .iter()
            .filter(|line| line.starts_with("-e "))
            .count(),
        2
    );
}

#[test]
fn missing_config_file_is_an_error() {
    let fixture = fixture("");
    let output = driver(&fixture.root, &["--config", "nope.toml", "100ns"], "");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config file does not exist"), "{}", stderr);
    assert!(fixture.ghdl_log().is_empty());
}

#[test]
fn missing_ghdl_is_an_error_before_anything_runs() {
    let fixture = fixture("/nonexistent/bin/ghdl");
    let output = driver(
        &fixture.root,
        &["--config", "sim/ghdlsim.toml", "100ns"],
        "",
    );
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ghdl executable not found"), "{}", stderr);
    assert!(!fixture.sim().join("work").exists());
}

#[test]
fn stop_time_is_required() {
    let fixture = fixture("");
    let output = driver(&fixture.root, &["--config", "sim/ghdlsim.toml"], "");
    assert!(!output.status.success());
    assert!(fixture.ghdl_log().is_empty());
}

fn analyzed_files(fixture: &Fixture) -> Vec<String> {
    fixture
        .ghdl_log()
        .into_iter()
        .filter(|line| line.starts_with("-a "))
        .map(|line| line.rsplit(' ').next().unwrap().to_string())
        .collect()
}

#[test]
fn config_given_relative_to_a_subdirectory_finds_the_project_root() {
    let fixture = fixture("");
    write_tree(&fixture.root, &["sim/sub/notes.txt"]);
    let output = driver(
        &fixture.sim().join("sub"),
        &["--config", "../ghdlsim.toml", "--view=false", "100ns"],
        "",
    );
    assert!(output.status.success(), "{}", describe(&output));
    let analyzed = analyzed_files(&fixture);
    assert_eq!(analyzed.len(), 4, "{:?}", analyzed);
    assert!(analyzed[0].ends_with("rtl/pkg/pkg_Common.vhd"), "{:?}", analyzed);
    assert!(analyzed[1].ends_with("rtl/FIR.vhd"), "{:?}", analyzed);
    assert!(fixture.sim().join("work").is_dir());
    assert!(!fixture.sim().join("sub/work").exists());
}

#[test]
fn sim_dir_parent_flag_from_a_subdirectory() {
    let fixture = fixture("");
    write_tree(&fixture.root, &["sim/sub/notes.txt"]);
    let ghdl = fixture.bin.join("ghdl").display().to_string();
    let output = driver(
        &fixture.sim().join("sub"),
        &[
            "--sim_dir",
            "..",
            "--ghdl",
            &ghdl,
            "--testbench",
            "A",
            "--view=false",
            "100ns",
        ],
        "",
    );
    assert!(output.status.success(), "{}", describe(&output));
    // No packages configured, so pkg_Common.vhd is found by the walk.
    let analyzed = analyzed_files(&fixture);
    assert_eq!(analyzed.len(), 4, "{:?}", analyzed);
    assert!(analyzed.iter().any(|f| f.ends_with("rtl/FIR.vhd")), "{:?}", analyzed);
    assert!(fixture.sim().join("work").is_dir());
}

#[test]
fn path_like_testbench_flag_is_rejected() {
    let fixture = fixture("");
    let output = driver(
        &fixture.root,
        &["--config", "sim/ghdlsim.toml", "--testbench", "a/b", "100ns"],
        "",
    );
    assert_eq!(output.status.code(), Some(1), "{}", describe(&output));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid --testbench value"), "{}", stderr);
    assert!(fixture.ghdl_log().is_empty());
}
