// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use clap::ArgMatches;
use ghdlsim::tools::{DEFAULT_GHDL, DEFAULT_GTKWAVE, DEFAULT_IEEE};
use ghdlsim::Toolchain;
use serde::Deserialize;

/// The `[toolchain]` table of a `ghdlsim.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainConfig {
    /// GHDL executable: a path, or a bare name looked up on `PATH`.
    pub ghdl: Option<String>,

    /// GTKWave executable: a path, or a bare name looked up on `PATH`.
    pub gtkwave: Option<String>,

    /// IEEE library flavour handed to `--ieee=`, e.g. `synopsys`.
    pub ieee: Option<String>,

    /// Whether to pass `-fexplicit`.
    pub explicit: Option<bool>,

    /// Additional flags appended to every GHDL command, e.g. `--std=08`.
    pub extra_flags: Option<Vec<String>>,
}

/// Helper for picking the GHDL executable from the command line flag, if
/// specified, else from the toolchain config, else the default name.
pub fn get_ghdl(matches: &ArgMatches, config: &Option<ToolchainConfig>) -> String {
    if let Some(ghdl) = matches.get_one::<String>("ghdl") {
        ghdl.to_string()
    } else if let Some(ghdl) = config.as_ref().and_then(|c| c.ghdl.as_deref()) {
        ghdl.to_string()
    } else {
        DEFAULT_GHDL.to_string()
    }
}

/// Same as `get_ghdl` for the GTKWave executable.
pub fn get_gtkwave(matches: &ArgMatches, config: &Option<ToolchainConfig>) -> String {
    if let Some(gtkwave) = matches.get_one::<String>("gtkwave") {
        gtkwave.to_string()
    } else if let Some(gtkwave) = config.as_ref().and_then(|c| c.gtkwave.as_deref()) {
        gtkwave.to_string()
    } else {
        DEFAULT_GTKWAVE.to_string()
    }
}

/// Looks `program` up on `PATH` (bare names) or checks it is executable
/// (paths).
pub fn resolve_executable(program: &str) -> Result<PathBuf, which::Error> {
    which::which(program)
}

/// Builds the toolchain from already-resolved executables and the config's
/// flag settings.
pub fn make_toolchain(
    ghdl: PathBuf,
    gtkwave: PathBuf,
    config: &Option<ToolchainConfig>,
) -> Toolchain {
    let defaults = Toolchain::default();
    let Some(config) = config else {
        return Toolchain {
            ghdl,
            gtkwave,
            ..defaults
        };
    };
    Toolchain {
        ghdl,
        gtkwave,
        ieee: config
            .ieee
            .clone()
            .unwrap_or_else(|| DEFAULT_IEEE.to_string()),
        explicit: config.explicit.unwrap_or(defaults.explicit),
        extra_flags: config.extra_flags.clone().unwrap_or_default(),
    }
}
