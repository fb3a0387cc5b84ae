// SPDX-License-Identifier: Apache-2.0

//! Finds the files the flow works on: VHDL sources under the configured source
//! roots and `.gtkw` layouts under the waves directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::ResolvedProject;

/// Decides from a bare file name whether a discovered file gets analyzed.
#[derive(Clone, Copy, Debug)]
pub struct SourceFilter<'a> {
    pub extensions: &'a [String],
    pub packages: &'a [String],
    pub include_files: &'a [String],
    pub exclude_files: &'a [String],
}

impl SourceFilter<'_> {
    /// A file is accepted when its name carries one of the extensions, is not
    /// excluded, is not a package (those are analyzed separately and first),
    /// and is listed in the include filter if that filter is non-empty.
    pub fn accepts(&self, file_name: &str) -> bool {
        if !self
            .extensions
            .iter()
            .any(|ext| file_name.ends_with(ext.as_str()))
        {
            return false;
        }
        if self.exclude_files.iter().any(|f| f == file_name) {
            log::debug!("{}: excluded", file_name);
            return false;
        }
        if self.packages.iter().any(|p| p == file_name) {
            log::debug!("{}: package, already analyzed", file_name);
            return false;
        }
        if !self.include_files.is_empty() && !self.include_files.iter().any(|f| f == file_name) {
            log::debug!("{}: not in include list", file_name);
            return false;
        }
        true
    }
}

/// Collects every regular file below `root` whose name satisfies `keep`.
///
/// Entries are visited sorted by name and a directory's files come before its
/// subdirectories, so the result is the same on every platform. Symlinks to
/// files are followed, symlinked directories are not. Unreadable directories
/// are logged and skipped.
pub fn collect_files(root: &Path, keep: &dyn Fn(&str) -> bool) -> Vec<PathBuf> {
    let mut out = Vec::new();
    collect_files_into(root, keep, &mut out);
    out
}

fn collect_files_into(dir: &Path, keep: &dyn Fn(&str) -> bool, out: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("cannot read directory {}: {}", dir.display(), e);
            return;
        }
    };
    let mut entries: Vec<std::fs::DirEntry> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("cannot read entry in {}: {}", dir.display(), e);
                None
            }
        })
        .collect();
    entries.sort_by_key(|entry| entry.file_name());

    let mut subdirs = vec![];
    for entry in entries {
        let path = entry.path();
        let ty = match entry.file_type() {
            Ok(ty) => ty,
            Err(e) => {
                log::warn!("cannot stat {}: {}", path.display(), e);
                continue;
            }
        };
        let is_file = if ty.is_symlink() {
            std::fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false)
        } else {
            ty.is_file()
        };
        if ty.is_dir() {
            subdirs.push(path);
        } else if is_file {
            let name = entry.file_name();
            if keep(&name.to_string_lossy()) {
                out.push(path);
            }
        }
    }
    for subdir in subdirs {
        collect_files_into(&subdir, keep, out);
    }
}

/// General (non-package) sources to analyze, in analysis order.
///
/// Roots are scanned in configured order. A file reachable from two
/// overlapping roots is only reported once.
pub fn discover_sources(project: &ResolvedProject) -> Vec<PathBuf> {
    let filter = project.source_filter();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut sources = vec![];
    for root in &project.source_roots {
        if !root.is_dir() {
            log::warn!("source folder does not exist: {}", root.display());
            continue;
        }
        log::info!("scanning source folder {}", root.display());
        for path in collect_files(root, &|name| filter.accepts(name)) {
            let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if seen.insert(key) {
                sources.push(path);
            }
        }
    }
    sources
}
