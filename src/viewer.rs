// SPDX-License-Identifier: Apache-2.0

//! Opens GTKWave on the traces of a successful run.

use std::path::PathBuf;

use crate::config::{ResolvedProject, ViewerFallback};
use crate::discovery::collect_files;
use crate::pipeline::{record, Stage, StageObserver, StageReport};
use crate::tools::{ToolRunner, Toolchain};

pub const SAVE_FILE_EXTENSION: &str = ".gtkw";

/// Saved viewer layouts for `testbench`, searched recursively under
/// `<waves_dir>/<testbench>/`.
pub fn find_save_files(project: &ResolvedProject, testbench: &str) -> Vec<PathBuf> {
    let dir = project.testbench_waves_dir(testbench);
    log::info!("looking for save files in {}", dir.display());
    if !dir.is_dir() {
        return vec![];
    }
    collect_files(&dir, &|name| name.ends_with(SAVE_FILE_EXTENSION))
}

/// Launches one detached viewer per save file found for any testbench.
///
/// When no testbench has a save file, falls back according to the project's
/// `viewer_fallback`: by default a single bare viewer on the trace of the
/// last testbench in the list.
pub fn launch_viewers(
    project: &ResolvedProject,
    toolchain: &Toolchain,
    runner: &mut dyn ToolRunner,
    observer: &mut dyn StageObserver,
) -> StageReport {
    let mut report = StageReport::new(Stage::View);
    let mut found_save_file = false;
    for testbench in &project.testbenches {
        for save_file in find_save_files(project, testbench) {
            found_save_file = true;
            let invocation = toolchain.view(project, testbench, Some(&save_file));
            record(
                &mut report,
                format!("{} ({})", testbench, save_file.display()),
                invocation,
                true,
                runner,
                observer,
            );
        }
    }
    if found_save_file {
        return report;
    }

    let bare: Vec<&String> = match project.viewer_fallback {
        ViewerFallback::LastTestbench => project.testbenches.last().into_iter().collect(),
        ViewerFallback::EveryTestbench => project.testbenches.iter().collect(),
    };
    if bare.is_empty() {
        log::warn!("no testbenches; not opening a viewer");
    }
    for testbench in bare {
        let invocation = toolchain.view(project, testbench, None);
        record(
            &mut report,
            testbench.clone(),
            invocation,
            true,
            runner,
            observer,
        );
    }
    report
}
