// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Errors that abort the simulation flow.
///
/// Per-invocation tool failures are not errors: they are recorded in the
/// stage reports and the flow keeps going. Only problems that leave the
/// workspace or the configuration unusable end up here.
#[derive(Debug)]
pub enum GhdlSimError {
    /// The scratch workspace could not be removed or recreated.
    Workspace {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The configuration is inconsistent (e.g. an empty extension list).
    Config(String),
}

impl std::fmt::Display for GhdlSimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GhdlSimError::Workspace { path, source } => write!(
                f,
                "ghdlsim error: could not prepare workspace {}: {}",
                path.display(),
                source
            ),
            GhdlSimError::Config(msg) => write!(f, "ghdlsim error: {}", msg),
        }
    }
}

impl std::error::Error for GhdlSimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GhdlSimError::Workspace { source, .. } => Some(source),
            GhdlSimError::Config(_) => None,
        }
    }
}
