// SPDX-License-Identifier: Apache-2.0

//! Drives a GHDL simulation flow for a VHDL project: prepare the working
//! library, analyze the shared packages and then the remaining sources,
//! elaborate and run every testbench, and open GTKWave on the traces.
//!
//! The external tools are reached only through [`tools::ToolRunner`], so each
//! stage can be exercised without GHDL installed:
//!
//! ```no_run
//! use ghdlsim::{run_pipeline, PipelineOptions, ProjectConfig, SystemRunner, Toolchain};
//!
//! let project = ProjectConfig::default()
//!     .resolve(std::path::Path::new("sim"))
//!     .unwrap()
//!     .with_testbenches(vec!["ParallelFIR_tb".to_string()])
//!     .unwrap();
//! let options = PipelineOptions {
//!     project,
//!     toolchain: Toolchain::default(),
//!     stop_time: "100ns".to_string(),
//!     open_viewer: true,
//! };
//! let report = run_pipeline(&options, &mut SystemRunner, &mut ()).unwrap();
//! assert!(!report.run_failed());
//! ```

pub mod config;
pub mod discovery;
pub mod ghdlsim_error;
pub mod pipeline;
pub mod tools;
pub mod viewer;
pub mod workspace;

pub use config::{ProjectConfig, ResolvedProject, ViewerFallback};
pub use ghdlsim_error::GhdlSimError;
pub use pipeline::{
    run_pipeline, InvocationOutcome, PipelineOptions, PipelineReport, SkipReason, Stage,
    StageObserver, StageReport,
};
pub use tools::{Invocation, InvocationStatus, SystemRunner, ToolRunner, Toolchain};
