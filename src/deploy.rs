use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::credentials::NetworkCredential;

/// Where the running program is installed, searched when a package path does not exist.
pub(crate) trait InstallDirectory {
    fn install_dir(&self) -> Option<PathBuf>;
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ExecutableDirectory;

impl InstallDirectory for ExecutableDirectory {
    fn install_dir(&self) -> Option<PathBuf> {
        env::current_exe()
            .ok()
            .and_then(|path| path.parent().map(Path::to_path_buf))
    }
}

/// Copies `source` into `destination`, replacing a file of the same name.
///
/// Returns the deployed path, or `None` when there was nothing to copy: an empty
/// argument, or a source found neither at its path nor beside the executable.
pub(crate) fn copy_to_destination(
    source: &Path,
    destination: &Path,
    install: &impl InstallDirectory,
    credential: Option<&NetworkCredential>,
) -> Result<Option<PathBuf>> {
    if source.as_os_str().is_empty() || destination.as_os_str().is_empty() {
        return Ok(None);
    }

    let Some(file_name) = source.file_name() else {
        return Ok(None);
    };

    let Some(source) = resolve_source(source, Path::new(file_name), install) else {
        debug!(path = ?source, "package not found, skipping copy");
        return Ok(None);
    };

    if let Some(credential) = credential {
        debug!(username = %credential.username, "copying to network share");
    }

    let target = destination.join(file_name);

    if is_same_file(&source, &target) {
        info!(path = ?target, "package already in place");
        return Ok(Some(target));
    }

    if target.is_file() {
        fs::remove_file(&target).with_context(|| format!("failed to delete {:?}", target))?;
        info!(path = ?target, "file deleted");
    }

    fs::copy(&source, &target).with_context(|| format!("failed to copy {:?} to {:?}", source, target))?;
    info!(from = ?source, to = ?target, "file copied");

    Ok(Some(target))
}

fn resolve_source(source: &Path, file_name: &Path, install: &impl InstallDirectory) -> Option<PathBuf> {
    if source.is_file() {
        return Some(source.to_path_buf());
    }

    install
        .install_dir()
        .map(|dir| dir.join(file_name))
        .filter(|fallback| fallback.is_file())
}

fn is_same_file(source: &Path, target: &Path) -> bool {
    match (fs::canonicalize(source), fs::canonicalize(target)) {
        (Ok(source), Ok(target)) => source == target,
        _ => false,
    }
}
