use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a planned rename applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenameKind {
    Video,
    Folder,
    Sidecar,
}

impl RenameKind {
    pub fn label(&self) -> &'static str {
        match self {
            RenameKind::Video => "video",
            RenameKind::Folder => "folder",
            RenameKind::Sidecar => "companion",
        }
    }
}

/// A single rename to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    pub kind: RenameKind,
    pub dry_run: bool,
}

impl RenamePlan {
    /// Plan a rename inside the same directory as `old_path`
    pub fn new(old_path: PathBuf, new_name: &str, kind: RenameKind, dry_run: bool) -> Self {
        let new_path = old_path
            .parent()
            .map(|p| p.join(new_name))
            .unwrap_or_else(|| PathBuf::from(new_name));

        Self {
            old_path,
            new_path,
            kind,
            dry_run,
        }
    }

    pub fn old_name(&self) -> String {
        file_name_of(&self.old_path)
    }

    pub fn new_name(&self) -> String {
        file_name_of(&self.new_path)
    }

    pub fn is_noop(&self) -> bool {
        self.old_path == self.new_path
    }

    /// Old and new differ only by letter case
    pub fn is_case_only(&self) -> bool {
        !self.is_noop()
            && self.old_path.to_string_lossy().to_lowercase()
                == self.new_path.to_string_lossy().to_lowercase()
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// How an executed plan ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed,
    /// Case-only change applied through a temporary name
    CaseRenamed,
    WouldRename,
    Unchanged,
}

impl RenameOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, RenameOutcome::Renamed | RenameOutcome::CaseRenamed)
    }
}

/// Failures that affect one file and never stop the run
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("No episode code found in '{0}'")]
    UnrecognizedEpisodePattern(String),

    #[error("Destination already exists: {0}")]
    DestinationCollision(PathBuf),

    #[error("Source disappeared before rename: {0}")]
    SourceVanished(PathBuf),

    #[error("Permission denied renaming '{}'", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Failed to rename '{}' to '{}': {source}", from.display(), to.display())]
    Filesystem {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ItemError {
    /// Skips are expected situations; everything else is a failure
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            ItemError::UnrecognizedEpisodePattern(_)
                | ItemError::DestinationCollision(_)
                | ItemError::SourceVanished(_)
        )
    }

    /// Short reason for the report line
    pub fn reason(&self) -> String {
        match self {
            ItemError::UnrecognizedEpisodePattern(_) => "no episode code".to_string(),
            ItemError::DestinationCollision(path) => {
                format!("destination exists: {}", file_name_of(path))
            }
            ItemError::SourceVanished(_) => "source vanished".to_string(),
            ItemError::PermissionDenied(_) => "permission denied".to_string(),
            ItemError::Filesystem { source, .. } => source.to_string(),
        }
    }
}

/// Final state of one reported item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Renamed,
    WouldRename,
    Unchanged,
    Skipped(String),
    Failed(String),
}

impl ItemStatus {
    pub fn from_outcome(outcome: RenameOutcome) -> Self {
        match outcome {
            RenameOutcome::Renamed | RenameOutcome::CaseRenamed => ItemStatus::Renamed,
            RenameOutcome::WouldRename => ItemStatus::WouldRename,
            RenameOutcome::Unchanged => ItemStatus::Unchanged,
        }
    }

    pub fn from_error(error: &ItemError) -> Self {
        if error.is_skip() {
            ItemStatus::Skipped(error.reason())
        } else {
            ItemStatus::Failed(error.reason())
        }
    }
}

/// One line of the run report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub kind: RenameKind,
    pub old_path: PathBuf,
    pub new_path: Option<PathBuf>,
    pub status: ItemStatus,
}

impl ItemReport {
    pub fn new(kind: RenameKind, old_path: PathBuf, new_path: Option<PathBuf>, status: ItemStatus) -> Self {
        Self {
            kind,
            old_path,
            new_path,
            status,
        }
    }

    pub fn old_name(&self) -> String {
        file_name_of(&self.old_path)
    }

    pub fn new_name(&self) -> Option<String> {
        self.new_path.as_deref().map(file_name_of)
    }
}

/// Everything that happened during one run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub dry_run: bool,
    pub items: Vec<ItemReport>,
    pub interrupted: bool,
    /// Files whose container metadata was rewritten
    pub cleaned: Vec<PathBuf>,
}

impl RunReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    pub fn push(&mut self, item: ItemReport) {
        self.items.push(item);
    }

    fn count(&self, pred: impl Fn(&ItemStatus) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.status)).count()
    }

    pub fn renamed_count(&self) -> usize {
        self.count(|s| *s == ItemStatus::Renamed)
    }

    pub fn planned_count(&self) -> usize {
        self.count(|s| *s == ItemStatus::WouldRename)
    }

    pub fn unchanged_count(&self) -> usize {
        self.count(|s| *s == ItemStatus::Unchanged)
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Skipped(_)))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Failed(_)))
    }

    /// Renames that touched the disk, in execution order
    pub fn applied(&self) -> impl Iterator<Item = (&ItemReport, &Path)> {
        self.items.iter().filter_map(|item| match (&item.status, &item.new_path) {
            (ItemStatus::Renamed, Some(new_path)) => Some((item, new_path.as_path())),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
