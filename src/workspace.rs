// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use crate::ghdlsim_error::GhdlSimError;

/// Wipes the GHDL working library directory and recreates it empty.
///
/// The directory belongs to a single run; nothing from a previous run may
/// survive. Any I/O failure is fatal for the flow.
pub fn prepare_workspace(path: &Path) -> Result<(), GhdlSimError> {
    log::info!("prepare_workspace; path: {}", path.display());
    let to_error = |source| GhdlSimError::Workspace {
        path: path.to_path_buf(),
        source,
    };
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(to_error)?;
    }
    std::fs::create_dir_all(path).map_err(to_error)
}
