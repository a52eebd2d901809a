//! Progress output for user-facing status updates.
//!
//! One line per processed item goes to stderr while the run is going.
//! In verbose mode output is suppressed since tracing handles everything.

use colored::Colorize;
use std::io::{self, IsTerminal, Write};
use std::path::Path;

use crate::rename::{ItemReport, ItemStatus};

/// Progress reporter for user-facing output
pub struct Progress {
    writer: Box<dyn Write>,
    /// When true, all output is suppressed (verbose mode uses tracing instead)
    silent: bool,
    /// When true, output is colorized
    colors_enabled: bool,
}

/// Check if we should use colors in output
pub fn should_use_colors() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }
    io::stderr().is_terminal()
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    /// Create a new progress reporter writing to stderr
    pub fn new() -> Self {
        let colors_enabled = should_use_colors();
        Self {
            writer: Box::new(io::stderr()),
            silent: false,
            colors_enabled,
        }
    }

    /// Create a progress reporter that respects UI mode
    /// When verbose=true, output is suppressed (tracing handles it)
    pub fn new_with_ui(verbose: bool, colors_enabled: bool) -> Self {
        if !colors_enabled {
            colored::control::set_override(false);
        }
        Self {
            writer: Box::new(io::stderr()),
            silent: verbose,
            colors_enabled,
        }
    }

    /// Create a progress reporter with a custom writer (for testing)
    #[cfg(test)]
    pub fn with_writer(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            silent: false,
            colors_enabled: false,
        }
    }

    /// Create a silent progress reporter
    pub fn silent() -> Self {
        Self {
            writer: Box::new(io::sink()),
            silent: true,
            colors_enabled: false,
        }
    }

    /// Report what the run is about to do
    pub fn run_start(&mut self, target: &Path, series: &str, format: &str, dry_run: bool) {
        if self.silent {
            return;
        }
        let series = if series.is_empty() { "(unknown)" } else { series };
        if self.colors_enabled {
            let _ = writeln!(self.writer, "{} {}", "Target:".bold(), target.display());
            let _ = writeln!(self.writer, "{} {}", "Series:".bold(), series);
            let _ = writeln!(self.writer, "{} {}", "Format:".bold(), format);
            if dry_run {
                let _ = writeln!(self.writer, "{}", "Dry run, no changes will be made".yellow());
            }
        } else {
            let _ = writeln!(self.writer, "Target: {}", target.display());
            let _ = writeln!(self.writer, "Series: {}", series);
            let _ = writeln!(self.writer, "Format: {}", format);
            if dry_run {
                let _ = writeln!(self.writer, "Dry run, no changes will be made");
            }
        }
        let _ = writeln!(self.writer);
    }

    /// Report the result for one video, folder or orphan subtitle
    pub fn item(&mut self, current: usize, total: usize, item: &ItemReport) {
        if self.silent {
            return;
        }
        let counter = format!("[{}/{}]", current, total);
        let line = self.describe(item);
        if self.colors_enabled {
            let _ = writeln!(self.writer, "{} {}", counter.cyan(), line);
        } else {
            let _ = writeln!(self.writer, "{} {}", counter, line);
        }
    }

    /// Report a companion file, indented under its video
    pub fn companion(&mut self, item: &ItemReport) {
        if self.silent {
            return;
        }
        let line = self.describe(item);
        let _ = writeln!(self.writer, "      {}", line);
    }

    fn describe(&self, item: &ItemReport) -> String {
        let old = item.old_name();
        let new = item.new_name().unwrap_or_default();
        let label = match item.kind {
            crate::rename::RenameKind::Sidecar => "companion ",
            crate::rename::RenameKind::Folder => "folder ",
            crate::rename::RenameKind::Video => "",
        };

        match (&item.status, self.colors_enabled) {
            (ItemStatus::Renamed, true) => {
                format!("{}{} {} {}", label, old.dimmed(), "→".cyan(), new)
            }
            (ItemStatus::Renamed, false) => format!("{}{} -> {}", label, old, new),
            (ItemStatus::WouldRename, true) => format!(
                "{}{} {} {} {}",
                label,
                old.dimmed(),
                "→".cyan(),
                new,
                "(would rename)".dimmed()
            ),
            (ItemStatus::WouldRename, false) => {
                format!("{}{} -> {} (would rename)", label, old, new)
            }
            (ItemStatus::Unchanged, true) => {
                format!("{}{} {}", label, old, "(already correct)".green())
            }
            (ItemStatus::Unchanged, false) => format!("{}{} (already correct)", label, old),
            (ItemStatus::Skipped(reason), true) => format!(
                "{} {}{} {}",
                "!".yellow().bold(),
                label,
                old,
                format!("skipped: {}", reason).yellow()
            ),
            (ItemStatus::Skipped(reason), false) => {
                format!("Skipped {}{}: {}", label, old, reason)
            }
            (ItemStatus::Failed(reason), true) => format!(
                "{} {}{} {}",
                "✗".red().bold(),
                label,
                old,
                format!("failed: {}", reason).red()
            ),
            (ItemStatus::Failed(reason), false) => {
                format!("Failed {}{}: {}", label, old, reason)
            }
        }
    }

    /// Report container metadata rewritten for a file
    pub fn metadata_cleaned(&mut self, path: &Path) {
        if self.silent {
            return;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.colors_enabled {
            let _ = writeln!(
                self.writer,
                "      {}",
                format!("metadata cleaned: {}", name).dimmed()
            );
        } else {
            let _ = writeln!(self.writer, "      metadata cleaned: {}", name);
        }
    }

    /// Report an error during operation (non-fatal)
    pub fn warn(&mut self, message: &str) {
        if self.silent {
            return;
        }
        if self.colors_enabled {
            let _ = writeln!(self.writer, "{} {}", "!".yellow().bold(), message.yellow());
        } else {
            let _ = writeln!(self.writer, "Warning: {}", message);
        }
    }

    /// Report history file written
    pub fn history_written(&mut self, path: &Path) {
        if self.silent {
            return;
        }
        if self.colors_enabled {
            let _ = writeln!(
                self.writer,
                "{}",
                format!("History saved to: {}", path.display()).dimmed()
            );
        } else {
            let _ = writeln!(self.writer, "History saved to: {}", path.display());
        }
    }

    /// Report starting a revert operation
    pub fn revert_start(&mut self, total: usize, from_timestamp: &str) {
        if self.silent {
            return;
        }
        let _ = writeln!(self.writer);
        let message = format!("Reverting {} renames from history ({})", total, from_timestamp);
        if self.colors_enabled {
            let _ = writeln!(self.writer, "{}", message.bold());
        } else {
            let _ = writeln!(self.writer, "{}", message);
        }
    }

    /// Report progress on a single revert
    pub fn revert_progress(&mut self, current: usize, total: usize, from: &str, to: &str) {
        if self.silent {
            return;
        }
        if self.colors_enabled {
            let counter = format!("[{}/{}]", current, total);
            let _ = writeln!(
                self.writer,
                "{} {} {} {}",
                counter.cyan(),
                from.dimmed(),
                "→".cyan(),
                to
            );
        } else {
            let _ = writeln!(self.writer, "[{}/{}] {} -> {}", current, total, from, to);
        }
    }

    /// Report revert complete
    pub fn revert_complete(&mut self, count: usize, dry_run: bool) {
        if self.silent {
            return;
        }
        let _ = writeln!(self.writer);
        if dry_run {
            let message = format!("Dry run complete. {} files would be restored.", count);
            if self.colors_enabled {
                let _ = writeln!(self.writer, "{}", message.dimmed());
            } else {
                let _ = writeln!(self.writer, "{}", message);
            }
        } else if self.colors_enabled {
            let _ = writeln!(
                self.writer,
                "{} {}",
                "✓".green().bold(),
                format!("{} files restored", count).green()
            );
        } else {
            let _ = writeln!(self.writer, "Revert complete. {} files restored.", count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rename::RenameKind;
    use std::path::PathBuf;

    fn create_test_progress() -> (Progress, std::sync::Arc<std::sync::Mutex<Vec<u8>>>) {
        let buffer = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let writer = TestWriter(buffer.clone());
        let progress = Progress::with_writer(Box::new(writer));
        (progress, buffer)
    }

    struct TestWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn report(kind: RenameKind, status: ItemStatus) -> ItemReport {
        ItemReport::new(
            kind,
            PathBuf::from("/tv/Show.S01E01.mkv"),
            Some(PathBuf::from("/tv/Show - S01E01.mkv")),
            status,
        )
    }

    #[test]
    fn test_item_lines() {
        let (mut progress, buffer) = create_test_progress();

        progress.item(1, 3, &report(RenameKind::Video, ItemStatus::Renamed));
        progress.item(2, 3, &report(RenameKind::Video, ItemStatus::Unchanged));
        progress.item(
            3,
            3,
            &report(RenameKind::Video, ItemStatus::Skipped("no episode code".into())),
        );

        let output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(output.contains("[1/3] Show.S01E01.mkv -> Show - S01E01.mkv"));
        assert!(output.contains("[2/3] Show.S01E01.mkv (already correct)"));
        assert!(output.contains("[3/3] Skipped Show.S01E01.mkv: no episode code"));
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn test_companion_line() {
        let (mut progress, buffer) = create_test_progress();

        progress.companion(&report(RenameKind::Sidecar, ItemStatus::WouldRename));

        let output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(output.contains("companion Show.S01E01.mkv -> Show - S01E01.mkv (would rename)"));
    }

    #[test]
    fn test_silent_progress_writes_nothing() {
        let mut progress = Progress::silent();
        progress.item(1, 1, &report(RenameKind::Video, ItemStatus::Renamed));
        progress.warn("ignored");
    }

    #[test]
    fn test_revert_output() {
        let (mut progress, buffer) = create_test_progress();

        progress.revert_start(2, "2026-01-01");
        progress.revert_progress(1, 2, "b.mkv", "a.mkv");
        progress.revert_complete(2, false);

        let output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Reverting 2 renames"));
        assert!(output.contains("[1/2] b.mkv -> a.mkv"));
        assert!(output.contains("2 files restored"));
    }
}
