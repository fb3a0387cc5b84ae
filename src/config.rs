// SPDX-License-Identifier: Apache-2.0

//! Project description: which directories hold the VHDL sources, which files
//! are shared packages, which testbenches to run.
//!
//! A `ProjectConfig` is what the user writes (the `[project]` table of a
//! `ghdlsim.toml`, all fields optional). Relative entries are resolved once,
//! up front, into an immutable `ResolvedProject` that every stage of the flow
//! borrows.

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::discovery::SourceFilter;
use crate::ghdlsim_error::GhdlSimError;

pub const DEFAULT_EXTENSIONS: &[&str] = &[".vhd", ".vhdl"];
pub const DEFAULT_SRC_FOLDERS: &[&str] = &["rtl", "sim"];
pub const DEFAULT_PACKAGES_DIR: &str = "rtl/pkg";
pub const DEFAULT_WAVES_DIR: &str = "waves";
pub const DEFAULT_WORKDIR: &str = "work";

/// Extension of the trace files written by `ghdl -r --wave=...`.
pub const TRACE_EXTENSION: &str = "ghw";

/// What to open when no testbench has a saved viewer layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewerFallback {
    /// A single bare viewer on the trace of the last listed testbench.
    #[default]
    LastTestbench,
    /// One bare viewer per testbench.
    EveryTestbench,
}

impl std::str::FromStr for ViewerFallback {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last-testbench" => Ok(Self::LastTestbench),
            "every-testbench" => Ok(Self::EveryTestbench),
            _ => Err(format!("invalid viewer fallback: {}", s)),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Directory the flow runs in; holds the workspace, the waves directory and
    /// the trace files. Relative paths are taken against the base directory
    /// given to `resolve`.
    pub sim_dir: Option<PathBuf>,

    /// Root of the source tree. Defaults to the parent of `sim_dir`.
    pub root_dir: Option<PathBuf>,

    /// File name suffixes that identify VHDL sources, e.g. `.vhd`.
    pub extensions: Vec<String>,

    /// Source roots to scan, relative to `root_dir`.
    pub src_folders: Vec<String>,

    /// Directory holding the shared packages, relative to `root_dir`.
    pub packages_dir: PathBuf,

    /// Package file names, analyzed first and in this order.
    pub packages: Vec<String>,

    /// If non-empty, only these file names are analyzed.
    pub include_files: Vec<String>,

    /// File names that are never analyzed.
    pub exclude_files: Vec<String>,

    /// Testbench units to elaborate and run, in order.
    pub testbenches: Vec<String>,

    /// Root of the per-testbench `.gtkw` layouts, relative to `sim_dir`.
    pub waves_dir: PathBuf,

    /// GHDL working library directory, relative to `sim_dir`. Wiped on every
    /// run.
    pub workdir: PathBuf,

    pub viewer_fallback: ViewerFallback,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            sim_dir: None,
            root_dir: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            src_folders: DEFAULT_SRC_FOLDERS.iter().map(|s| s.to_string()).collect(),
            packages_dir: PathBuf::from(DEFAULT_PACKAGES_DIR),
            packages: vec![],
            include_files: vec![],
            exclude_files: vec![],
            testbenches: vec![],
            waves_dir: PathBuf::from(DEFAULT_WAVES_DIR),
            workdir: PathBuf::from(DEFAULT_WORKDIR),
            viewer_fallback: ViewerFallback::default(),
        }
    }
}

impl ProjectConfig {
    /// Resolves every directory to an absolute path and checks the lists for
    /// obvious mistakes.
    ///
    /// `base_dir` is where a relative `sim_dir` is anchored (normally the
    /// directory holding the config file); it becomes `sim_dir` itself when
    /// none is configured.
    pub fn resolve(&self, base_dir: &Path) -> Result<ResolvedProject, GhdlSimError> {
        let base_dir = absolutize(base_dir)?;
        // `parent()` below must see `/proj/sim`, never `/proj/sim/sub/..`.
        let sim_dir = match &self.sim_dir {
            Some(dir) => normalize(&base_dir.join(dir)),
            None => normalize(&base_dir),
        };
        let root_dir = match &self.root_dir {
            Some(dir) => normalize(&sim_dir.join(dir)),
            None => sim_dir
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| sim_dir.clone()),
        };

        if self.extensions.iter().all(|e| e.is_empty()) {
            return Err(GhdlSimError::Config(
                "at least one non-empty source extension is required".to_string(),
            ));
        }
        check_file_names("packages", &self.packages)?;
        check_file_names("include_files", &self.include_files)?;
        check_file_names("exclude_files", &self.exclude_files)?;
        check_file_names("testbenches", &self.testbenches)?;

        let resolved = ResolvedProject {
            workspace_dir: sim_dir.join(&self.workdir),
            waves_dir: sim_dir.join(&self.waves_dir),
            packages_dir: root_dir.join(&self.packages_dir),
            source_roots: self.src_folders.iter().map(|f| root_dir.join(f)).collect(),
            extensions: self
                .extensions
                .iter()
                .filter(|e| !e.is_empty())
                .cloned()
                .collect(),
            packages: self.packages.clone(),
            include_files: self.include_files.clone(),
            exclude_files: self.exclude_files.clone(),
            testbenches: self.testbenches.clone(),
            viewer_fallback: self.viewer_fallback,
            sim_dir,
            root_dir,
        };
        log::debug!("resolved project: {:?}", resolved);
        Ok(resolved)
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, GhdlSimError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| GhdlSimError::Config(format!("cannot determine current directory: {}", e)))?;
    Ok(cwd.join(path))
}

/// Removes `.` and `..` components without touching the filesystem, the way
/// `os.path.normpath` would. `..` at the root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Names in the lists are bare file or unit names; they are compared against
/// directory entries, so separators can never match.
fn check_file_names(what: &str, names: &[String]) -> Result<(), GhdlSimError> {
    for name in names {
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(GhdlSimError::Config(format!(
                "{} entry {:?} must be a bare name",
                what, name
            )));
        }
    }
    Ok(())
}

/// Fully resolved, immutable view of the project used by every stage.
#[derive(Clone, Debug)]
pub struct ResolvedProject {
    pub sim_dir: PathBuf,
    pub root_dir: PathBuf,
    pub workspace_dir: PathBuf,
    pub packages_dir: PathBuf,
    pub source_roots: Vec<PathBuf>,
    pub waves_dir: PathBuf,
    pub extensions: Vec<String>,
    pub packages: Vec<String>,
    pub include_files: Vec<String>,
    pub exclude_files: Vec<String>,
    pub testbenches: Vec<String>,
    pub viewer_fallback: ViewerFallback,
}

impl ResolvedProject {
    pub fn source_filter(&self) -> SourceFilter<'_> {
        SourceFilter {
            extensions: &self.extensions,
            packages: &self.packages,
            include_files: &self.include_files,
            exclude_files: &self.exclude_files,
        }
    }

    /// Package files in analysis order.
    pub fn package_paths(&self) -> Vec<PathBuf> {
        self.packages
            .iter()
            .map(|p| self.packages_dir.join(p))
            .collect()
    }

    /// Name handed to `--wave=`; GHDL writes it relative to `sim_dir`.
    pub fn trace_file_name(testbench: &str) -> String {
        format!("{}.{}", testbench, TRACE_EXTENSION)
    }

    pub fn trace_path(&self, testbench: &str) -> PathBuf {
        self.sim_dir.join(Self::trace_file_name(testbench))
    }

    /// Directory searched for the testbench's `.gtkw` layouts.
    pub fn testbench_waves_dir(&self, testbench: &str) -> PathBuf {
        self.waves_dir.join(testbench)
    }

    /// Replaces the testbench list, e.g. from the command line. The names are
    /// checked the same way as the configured ones.
    pub fn with_testbenches(mut self, testbenches: Vec<String>) -> Result<Self, GhdlSimError> {
        check_file_names("testbenches", &testbenches)?;
        self.testbenches = testbenches;
        Ok(self)
    }
}
