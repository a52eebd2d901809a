use crate::rename::{ItemReport, ItemStatus, RenameKind, RunReport};
use std::io::{self, Write};

/// Per-kind totals shown at the end of a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub videos_renamed: usize,
    pub videos_unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub companions_renamed: usize,
    pub folders_renamed: usize,
    pub metadata_cleaned: usize,
}

impl Summary {
    pub fn from_report(report: &RunReport) -> Self {
        let mut summary = Summary {
            metadata_cleaned: report.cleaned.len(),
            ..Default::default()
        };

        for item in &report.items {
            let changed = matches!(item.status, ItemStatus::Renamed | ItemStatus::WouldRename);
            match (&item.status, item.kind) {
                (ItemStatus::Skipped(_), _) => summary.skipped += 1,
                (ItemStatus::Failed(_), _) => summary.failed += 1,
                (ItemStatus::Unchanged, RenameKind::Video) => summary.videos_unchanged += 1,
                (_, RenameKind::Video) if changed => summary.videos_renamed += 1,
                (_, RenameKind::Sidecar) if changed => summary.companions_renamed += 1,
                (_, RenameKind::Folder) if changed => summary.folders_renamed += 1,
                _ => {}
            }
        }
        summary
    }
}

/// Display dry run results in a formatted output
pub fn display_dry_run(report: &RunReport, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "========================================")?;
    writeln!(writer, "              DRY RUN")?;
    writeln!(writer, "========================================")?;
    writeln!(writer)?;

    let planned: Vec<&ItemReport> = report
        .items
        .iter()
        .filter(|i| i.status == ItemStatus::WouldRename)
        .collect();

    if planned.is_empty() {
        writeln!(writer, "No files to rename.")?;
    } else {
        writeln!(writer, "Planned changes:")?;
        writeln!(writer)?;

        for (i, item) in planned.iter().enumerate() {
            writeln!(writer, "  {}. [{}]", i + 1, item.kind.label())?;
            writeln!(writer, "     From: {}", item.old_name())?;
            writeln!(writer, "     To:   {}", item.new_name().unwrap_or_default())?;
            writeln!(writer)?;
        }
    }

    let summary = Summary::from_report(report);
    writeln!(writer, "----------------------------------------")?;
    writeln!(writer, "Summary:")?;
    writeln!(writer, "  {} videos would be renamed", summary.videos_renamed)?;
    writeln!(writer, "  {} videos already correct", summary.videos_unchanged)?;
    if summary.companions_renamed > 0 {
        writeln!(writer, "  {} companion files would be renamed", summary.companions_renamed)?;
    }
    if summary.folders_renamed > 0 {
        writeln!(writer, "  {} season folders would be renamed", summary.folders_renamed)?;
    }
    write_problems(&summary, writer)?;

    writeln!(writer)?;
    writeln!(writer, "Run without --dry to apply these changes.")?;

    Ok(())
}

/// Display execution results (non-dry-run)
pub fn display_execution_result(report: &RunReport, writer: &mut impl Write) -> io::Result<()> {
    let summary = Summary::from_report(report);

    writeln!(writer)?;
    if report.interrupted {
        writeln!(writer, "Interrupted, remaining files were left as they were.")?;
    }
    writeln!(writer, "Renamed {} videos.", summary.videos_renamed)?;
    writeln!(writer, "  {} videos already correct.", summary.videos_unchanged)?;
    if summary.companions_renamed > 0 {
        writeln!(writer, "  {} companion files renamed.", summary.companions_renamed)?;
    }
    if summary.folders_renamed > 0 {
        writeln!(writer, "  {} season folders renamed.", summary.folders_renamed)?;
    }
    if summary.metadata_cleaned > 0 {
        writeln!(writer, "  {} files had metadata cleaned.", summary.metadata_cleaned)?;
    }
    write_problems(&summary, writer)?;

    Ok(())
}

fn write_problems(summary: &Summary, writer: &mut impl Write) -> io::Result<()> {
    if summary.skipped > 0 {
        writeln!(writer, "  {} files skipped", summary.skipped)?;
    }
    if summary.failed > 0 {
        writeln!(writer, "  {} files failed", summary.failed)?;
    }
    Ok(())
}
