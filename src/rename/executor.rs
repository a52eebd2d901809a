use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::types::{ItemError, RenameOutcome, RenamePlan};

/// Apply one planned rename.
///
/// Every check runs in dry-run mode too; only the final mutation is skipped.
pub fn execute_plan(plan: &RenamePlan, force: bool) -> Result<RenameOutcome, ItemError> {
    if fs::symlink_metadata(&plan.old_path).is_err() {
        return Err(ItemError::SourceVanished(plan.old_path.clone()));
    }

    if plan.is_noop() {
        debug!(path = ?plan.old_path, "Already correctly named");
        return Ok(RenameOutcome::Unchanged);
    }

    let case_only = plan.is_case_only();

    if destination_taken(plan, case_only) {
        if !force || plan.new_path.is_dir() {
            return Err(ItemError::DestinationCollision(plan.new_path.clone()));
        }
        // fs::rename replaces the file in one step
        if !plan.dry_run {
            info!(path = ?plan.new_path, "Replacing existing file");
        }
    }

    if plan.dry_run {
        debug!(from = ?plan.old_path, to = ?plan.new_path, "Dry run, not renaming");
        return Ok(RenameOutcome::WouldRename);
    }

    if case_only {
        let temp = temp_path_for(&plan.new_path);
        debug!(temp = ?temp, "Case-only rename through temporary name");
        rename_with_retry(&plan.old_path, &temp).map_err(|e| map_io_error(plan, e))?;
        if let Err(e) = fs::rename(&temp, &plan.new_path) {
            roll_back(&temp, &plan.old_path);
            return Err(map_io_error(plan, e));
        }
        info!("Renamed: {} -> {}", plan.old_name(), plan.new_name());
        return Ok(RenameOutcome::CaseRenamed);
    }

    rename_with_retry(&plan.old_path, &plan.new_path).map_err(|e| map_io_error(plan, e))?;
    info!("Renamed: {} -> {}", plan.old_name(), plan.new_name());
    Ok(RenameOutcome::Renamed)
}

// A case-only target "exists" on case-insensitive filesystems because it is
// the source itself. Only a different file counts as taken.
fn destination_taken(plan: &RenamePlan, case_only: bool) -> bool {
    if fs::symlink_metadata(&plan.new_path).is_err() {
        return false;
    }
    !(case_only && same_file(&plan.old_path, &plan.new_path))
}

#[cfg(unix)]
fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca.to_string_lossy().to_lowercase() == cb.to_string_lossy().to_lowercase(),
        _ => false,
    }
}

/// Move a file stranded under its temporary name back to where it was
fn roll_back(temp: &Path, original: &Path) -> bool {
    match fs::rename(temp, original) {
        Ok(()) => true,
        Err(e) => {
            warn!(
                temp = ?temp,
                original = ?original,
                error = %e,
                "Could not restore file, it is left under its temporary name"
            );
            false
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

/// Rename, adding write permission to the source and retrying once when denied
fn rename_with_retry(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            debug!(path = ?from, "Permission denied, adding write permission");
            add_write_permission(from)?;
            fs::rename(from, to)
        }
        other => other,
    }
}

#[cfg(unix)]
fn add_write_permission(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o200);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn add_write_permission(path: &Path) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(false);
    fs::set_permissions(path, perms)
}

fn map_io_error(plan: &RenamePlan, error: io::Error) -> ItemError {
    match error.kind() {
        io::ErrorKind::NotFound => ItemError::SourceVanished(plan.old_path.clone()),
        io::ErrorKind::PermissionDenied => ItemError::PermissionDenied(plan.old_path.clone()),
        _ => ItemError::Filesystem {
            from: plan.old_path.clone(),
            to: plan.new_path.clone(),
            source: error,
        },
    }
}
