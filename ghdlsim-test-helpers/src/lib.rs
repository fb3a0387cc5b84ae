// SPDX-License-Identifier: Apache-2.0

//! Test helpers for driving the flow without GHDL or GTKWave installed.

use std::path::Path;

use ghdlsim::{Invocation, InvocationStatus, ToolRunner};

type FailurePredicate = Box<dyn Fn(&Invocation) -> bool>;

/// One call seen by a `RecordingRunner`.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub invocation: Invocation,
    /// True for `launch` (viewer), false for blocking `run`.
    pub detached: bool,
}

/// A `ToolRunner` that records every invocation instead of executing it.
///
/// Invocations succeed unless one of the `fail_when` predicates matches, in
/// which case they report exit code 1.
#[derive(Default)]
pub struct RecordingRunner {
    pub calls: Vec<RecordedCall>,
    failures: Vec<FailurePredicate>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_when(mut self, predicate: impl Fn(&Invocation) -> bool + 'static) -> Self {
        self.failures.push(Box::new(predicate));
        self
    }

    fn status_for(&self, invocation: &Invocation) -> InvocationStatus {
        if self.failures.iter().any(|p| p(invocation)) {
            InvocationStatus::Failed { code: Some(1) }
        } else {
            InvocationStatus::Success
        }
    }

    /// Blocking invocations, in call order.
    pub fn blocking(&self) -> Vec<&Invocation> {
        self.calls
            .iter()
            .filter(|c| !c.detached)
            .map(|c| &c.invocation)
            .collect()
    }

    /// Detached launches, in call order.
    pub fn launched(&self) -> Vec<&Invocation> {
        self.calls
            .iter()
            .filter(|c| c.detached)
            .map(|c| &c.invocation)
            .collect()
    }

    /// Files handed to `ghdl -a`, in call order.
    pub fn analyzed_files(&self) -> Vec<String> {
        self.blocking()
            .into_iter()
            .filter(|i| i.has_arg("-a"))
            .filter_map(|i| i.arg_strings().pop())
            .collect()
    }
}

impl ToolRunner for RecordingRunner {
    fn run(&mut self, invocation: &Invocation) -> InvocationStatus {
        let status = self.status_for(invocation);
        self.calls.push(RecordedCall {
            invocation: invocation.clone(),
            detached: false,
        });
        status
    }

    fn launch(&mut self, invocation: &Invocation) -> InvocationStatus {
        let status = self.status_for(invocation);
        self.calls.push(RecordedCall {
            invocation: invocation.clone(),
            detached: true,
        });
        status
    }
}

/// Matches GHDL invocations in `mode` (`-a`, `-e`, `-r`) whose subject is
/// `subject`: a testbench name or the file name of an analyzed source.
pub fn fails_on(mode: &'static str, subject: &'static str) -> impl Fn(&Invocation) -> bool {
    move |invocation| {
        invocation.has_arg(mode)
            && invocation.args.iter().any(|a| {
                a == subject || Path::new(a).file_name().map_or(false, |n| n == subject)
            })
    }
}

/// Creates the given relative files (and their parent directories) under
/// `root`. Each file holds a one-line VHDL comment.
pub fn write_tree(root: &Path, files: &[&str]) {
    for file in files {
        let path = root.join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, format!("-- {}\n", file)).unwrap();
    }
}
