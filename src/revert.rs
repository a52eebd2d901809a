use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::history::{
    read_history, write_history_file, HistoryEntry, HistoryError, HistoryFile, OperationType,
};
use crate::progress::Progress;
use crate::rename::{execute_plan, ItemError, RenameKind, RenamePlan};

#[derive(Debug, thiserror::Error)]
pub enum RevertError {
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to rename '{from}' to '{to}': {source}")]
    RenameError {
        from: String,
        to: String,
        #[source]
        source: ItemError,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RevertOptions {
    pub dry_run: bool,
}

/// A single revert operation
#[derive(Debug, Clone)]
pub struct RevertOperation {
    pub current_path: PathBuf,
    pub current_name: String,
    pub revert_path: PathBuf,
    pub revert_name: String,
    pub kind: RenameKind,
}

impl RevertOperation {
    fn to_entry(&self, target_dir: &Path) -> HistoryEntry {
        let relative = |p: &Path| {
            p.strip_prefix(target_dir)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| p.to_path_buf())
        };
        HistoryEntry {
            source: relative(&self.current_path),
            destination: relative(&self.revert_path),
            kind: self.kind,
        }
    }
}

/// Result of a revert operation
#[derive(Debug)]
pub struct RevertResult {
    pub operations: Vec<RevertOperation>,
    pub original_history: PathBuf,
    pub dry_run: bool,
    pub revert_history_path: Option<PathBuf>,
}

/// Undo the renames recorded in a history file, newest first
pub fn revert_from_history(
    history_path: &Path,
    options: &RevertOptions,
    progress: &mut Progress,
) -> Result<RevertResult, RevertError> {
    info!("Loading history from: {:?}", history_path);

    let history = read_history(history_path)?;

    info!(
        "History contains {} changes from {}",
        history.changes.len(),
        history.executed_at
    );

    progress.revert_start(history.changes.len(), &history.executed_at.to_string());

    let target_dir = &history.target_directory;
    let operations = prepare_revert_operations(&history, target_dir, progress)?;

    execute_reverts(&operations, options.dry_run, progress)?;

    let mut revert_history_path = None;
    if !options.dry_run {
        let changes = operations.iter().map(|op| op.to_entry(target_dir)).collect();
        let revert_history = HistoryFile::new(OperationType::Revert, target_dir.clone(), changes);
        let revert_path = write_history_file(&revert_history, target_dir)?;
        progress.history_written(&revert_path);

        info!("Revert history saved to: {:?}", revert_path);
        revert_history_path = Some(revert_path);
    }

    progress.revert_complete(operations.len(), options.dry_run);

    Ok(RevertResult {
        operations,
        original_history: history_path.to_path_buf(),
        dry_run: options.dry_run,
        revert_history_path,
    })
}

/// Check every entry before touching anything, in reverse order
fn prepare_revert_operations(
    history: &HistoryFile,
    target_dir: &Path,
    progress: &mut Progress,
) -> Result<Vec<RevertOperation>, RevertError> {
    let mut operations = Vec::with_capacity(history.changes.len());
    let mut errors = Vec::new();

    for entry in history.changes.iter().rev() {
        // For revert: source becomes destination, destination becomes source
        let current_path = target_dir.join(&entry.destination);
        let revert_path = target_dir.join(&entry.source);
        let current_name = display_name(&entry.destination);
        let revert_name = display_name(&entry.source);

        debug!("Checking revert: {} -> {}", current_name, revert_name);

        if current_path.symlink_metadata().is_err() {
            errors.push(format!(
                "File not found: '{}' (expected from previous rename)",
                current_name
            ));
            continue;
        }

        // A case-only rename finds its own file at the old name on
        // case-insensitive filesystems
        let case_only = current_name.to_lowercase() == revert_name.to_lowercase();
        if !case_only && revert_path.symlink_metadata().is_ok() {
            errors.push(format!("Cannot revert: '{}' already exists", revert_name));
            continue;
        }

        operations.push(RevertOperation {
            current_path,
            current_name,
            revert_path,
            revert_name,
            kind: entry.kind,
        });
    }

    if !errors.is_empty() {
        error!("Revert validation failed:");
        for err in &errors {
            error!("  - {}", err);
            progress.warn(err);
        }
        return Err(RevertError::ValidationFailed(errors.join("; ")));
    }

    Ok(operations)
}

fn execute_reverts(
    operations: &[RevertOperation],
    dry_run: bool,
    progress: &mut Progress,
) -> Result<(), RevertError> {
    let total = operations.len();

    for (i, op) in operations.iter().enumerate() {
        progress.revert_progress(i + 1, total, &op.current_name, &op.revert_name);

        let file_name = op
            .revert_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let plan = RenamePlan::new(op.current_path.clone(), &file_name, op.kind, dry_run);

        let outcome = execute_plan(&plan, false).map_err(|e| RevertError::RenameError {
            from: op.current_name.clone(),
            to: op.revert_name.clone(),
            source: e,
        })?;
        info!(?outcome, "Reverted: {} -> {}", op.current_name, op.revert_name);
    }

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn entry(source: &str, destination: &str, kind: RenameKind) -> HistoryEntry {
        HistoryEntry {
            source: PathBuf::from(source),
            destination: PathBuf::from(destination),
            kind,
        }
    }

    /// Lay out the state left by a run that renamed a season folder,
    /// an episode inside it and its subtitle
    fn setup_test_scenario() -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let season = dir.path().join("Season 01");
        fs::create_dir(&season).unwrap();
        fs::write(season.join("Show - S01E01 - Pilot.mkv"), b"video").unwrap();
        fs::write(season.join("Show - S01E01 - Pilot.en.srt"), b"subs").unwrap();

        let history = HistoryFile::new(
            OperationType::Rename,
            dir.path().to_path_buf(),
            vec![
                entry("season 1", "Season 01", RenameKind::Folder),
                entry(
                    "Season 01/Show.S01E01.Pilot.mkv",
                    "Season 01/Show - S01E01 - Pilot.mkv",
                    RenameKind::Video,
                ),
                entry(
                    "Season 01/Show.S01E01.Pilot.en.srt",
                    "Season 01/Show - S01E01 - Pilot.en.srt",
                    RenameKind::Sidecar,
                ),
            ],
        );

        let history_path = dir.path().join("episode-renamer-history-20260115-100000.json");
        let file = fs::File::create(&history_path).unwrap();
        serde_json::to_writer_pretty(file, &history).unwrap();

        (dir, history_path)
    }

    #[test]
    fn test_revert_success() {
        let (dir, history_path) = setup_test_scenario();
        let mut progress = Progress::silent();

        let options = RevertOptions { dry_run: false };
        let result = revert_from_history(&history_path, &options, &mut progress).unwrap();

        assert_eq!(result.operations.len(), 3);
        assert!(!result.dry_run);

        let season = dir.path().join("season 1");
        assert_eq!(fs::read(season.join("Show.S01E01.Pilot.mkv")).unwrap(), b"video");
        assert!(season.join("Show.S01E01.Pilot.en.srt").exists());
        assert!(!dir.path().join("Season 01").exists());
    }

    #[test]
    fn test_revert_runs_newest_first() {
        let (_dir, history_path) = setup_test_scenario();
        let mut progress = Progress::silent();

        let result =
            revert_from_history(&history_path, &RevertOptions { dry_run: true }, &mut progress)
                .unwrap();

        let kinds: Vec<RenameKind> = result.operations.iter().map(|op| op.kind).collect();
        assert_eq!(
            kinds,
            vec![RenameKind::Sidecar, RenameKind::Video, RenameKind::Folder]
        );
    }

    #[test]
    fn test_revert_dry_run() {
        let (dir, history_path) = setup_test_scenario();
        let mut progress = Progress::silent();

        let options = RevertOptions { dry_run: true };
        let result = revert_from_history(&history_path, &options, &mut progress).unwrap();

        assert_eq!(result.operations.len(), 3);
        assert!(result.dry_run);
        assert!(result.revert_history_path.is_none());

        assert!(dir
            .path()
            .join("Season 01/Show - S01E01 - Pilot.mkv")
            .exists());
        assert!(!dir.path().join("season 1").exists());
    }

    #[test]
    fn test_revert_missing_file() {
        let dir = tempdir().unwrap();
        let mut progress = Progress::silent();

        let history = HistoryFile::new(
            OperationType::Rename,
            dir.path().to_path_buf(),
            vec![entry("Show.S01E01.mkv", "Show - S01E01.mkv", RenameKind::Video)],
        );

        let history_path = dir.path().join("test-history.json");
        let file = fs::File::create(&history_path).unwrap();
        serde_json::to_writer_pretty(file, &history).unwrap();

        let result = revert_from_history(&history_path, &RevertOptions::default(), &mut progress);
        assert!(matches!(result, Err(RevertError::ValidationFailed(_))));
    }

    #[test]
    fn test_revert_creates_history() {
        let (_dir, history_path) = setup_test_scenario();
        let mut progress = Progress::silent();

        let options = RevertOptions { dry_run: false };
        let result = revert_from_history(&history_path, &options, &mut progress).unwrap();

        let path = result.revert_history_path.unwrap();
        assert!(path.exists());

        let journal: HistoryFile = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(journal.operation, OperationType::Revert);
        assert_eq!(journal.changes[2].destination, PathBuf::from("season 1"));
    }

    #[test]
    fn test_revert_conflict_detection() {
        let (dir, history_path) = setup_test_scenario();
        let mut progress = Progress::silent();

        fs::create_dir(dir.path().join("season 1")).unwrap();

        let result = revert_from_history(&history_path, &RevertOptions::default(), &mut progress);
        assert!(matches!(result, Err(RevertError::ValidationFailed(_))));
        assert!(dir.path().join("Season 01").exists());
    }
}
