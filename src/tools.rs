// SPDX-License-Identifier: Apache-2.0

//! Command lines for the external tools (GHDL and GTKWave) and the
//! `ToolRunner` seam that executes them.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::ResolvedProject;

pub const DEFAULT_GHDL: &str = "ghdl";
pub const DEFAULT_GTKWAVE: &str = "gtkwave";
pub const DEFAULT_IEEE: &str = "synopsys";

/// A fully spelled-out external command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub current_dir: PathBuf,
}

impl Invocation {
    pub fn new(program: &Path, current_dir: &Path) -> Self {
        Invocation {
            program: program.to_path_buf(),
            args: vec![],
            current_dir: current_dir.to_path_buf(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Arguments as (lossy) UTF-8, mostly for logs and assertions.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).current_dir(&self.current_dir);
        command
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// How an invocation ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvocationStatus {
    /// Exited with status zero, or, for detached launches, was started.
    Success,
    /// Exited unsuccessfully; `code` is `None` when killed by a signal.
    Failed { code: Option<i32> },
    /// The process could not be started at all.
    SpawnFailed(String),
}

impl InvocationStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationStatus::Success)
    }
}

impl std::fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvocationStatus::Success => write!(f, "success"),
            InvocationStatus::Failed { code: Some(code) } => write!(f, "exit code {}", code),
            InvocationStatus::Failed { code: None } => write!(f, "terminated by signal"),
            InvocationStatus::SpawnFailed(msg) => write!(f, "could not start: {}", msg),
        }
    }
}

/// Executes invocations. The flow only talks to the outside world through
/// this trait.
pub trait ToolRunner {
    /// Runs the invocation and blocks until it exits.
    fn run(&mut self, invocation: &Invocation) -> InvocationStatus;

    /// Starts the invocation and returns without waiting for it.
    fn launch(&mut self, invocation: &Invocation) -> InvocationStatus;
}

/// Runs invocations as real child processes, sharing our stdout/stderr.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> InvocationStatus {
        log::info!("Running command: {}", invocation);
        match invocation.to_command().status() {
            Ok(status) if status.success() => InvocationStatus::Success,
            Ok(status) => InvocationStatus::Failed {
                code: status.code(),
            },
            Err(e) => InvocationStatus::SpawnFailed(e.to_string()),
        }
    }

    fn launch(&mut self, invocation: &Invocation) -> InvocationStatus {
        log::info!("Launching command: {}", invocation);
        // The child is intentionally not waited on; dropping the handle leaves
        // it running after we exit.
        match invocation.to_command().stdin(Stdio::null()).spawn() {
            Ok(child) => {
                log::debug!("launched pid {}", child.id());
                InvocationStatus::Success
            }
            Err(e) => InvocationStatus::SpawnFailed(e.to_string()),
        }
    }
}

/// Locations and fixed flags of the external tools.
#[derive(Clone, Debug)]
pub struct Toolchain {
    pub ghdl: PathBuf,
    pub gtkwave: PathBuf,
    /// Value for `--ieee=`.
    pub ieee: String,
    /// Adds `-fexplicit` (explicit operator resolution).
    pub explicit: bool,
    /// Appended to every GHDL command after the fixed flags.
    pub extra_flags: Vec<String>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Toolchain {
            ghdl: PathBuf::from(DEFAULT_GHDL),
            gtkwave: PathBuf::from(DEFAULT_GTKWAVE),
            ieee: DEFAULT_IEEE.to_string(),
            explicit: true,
            extra_flags: vec![],
        }
    }
}

impl Toolchain {
    fn ghdl_command(&self, mode: &str, project: &ResolvedProject) -> Invocation {
        let mut workdir = OsString::from("--workdir=");
        workdir.push(project.workspace_dir.as_os_str());
        let mut invocation = Invocation::new(&self.ghdl, &project.sim_dir)
            .arg(mode)
            .arg(workdir)
            .arg(format!("--ieee={}", self.ieee));
        if self.explicit {
            invocation = invocation.arg("-fexplicit");
        }
        for flag in &self.extra_flags {
            invocation = invocation.arg(flag);
        }
        invocation
    }

    /// `ghdl -a ... <file>`
    pub fn analyze(&self, project: &ResolvedProject, file: &Path) -> Invocation {
        self.ghdl_command("-a", project).arg(file.as_os_str())
    }

    /// `ghdl -e ... <testbench>`
    pub fn elaborate(&self, project: &ResolvedProject, testbench: &str) -> Invocation {
        self.ghdl_command("-e", project).arg(testbench)
    }

    /// `ghdl -r ... <testbench> --wave=<testbench>.ghw --stop-time=<stop_time>`
    ///
    /// `stop_time` is passed through untouched.
    pub fn run(&self, project: &ResolvedProject, testbench: &str, stop_time: &str) -> Invocation {
        self.ghdl_command("-r", project)
            .arg(testbench)
            .arg(format!(
                "--wave={}",
                ResolvedProject::trace_file_name(testbench)
            ))
            .arg(format!("--stop-time={}", stop_time))
    }

    /// `gtkwave <trace> [-a <save file>]`
    pub fn view(
        &self,
        project: &ResolvedProject,
        testbench: &str,
        save_file: Option<&Path>,
    ) -> Invocation {
        let mut invocation = Invocation::new(&self.gtkwave, &project.sim_dir)
            .arg(project.trace_path(testbench).into_os_string());
        if let Some(save_file) = save_file {
            invocation = invocation.arg("-a").arg(save_file.as_os_str());
        }
        invocation
    }
}
