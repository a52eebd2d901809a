use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::companion::{strip_language_tag, subtitle_name, CompanionResolver};
use super::executor::execute_plan;
use super::name_builder::{build_filename, build_stem, canonical_season_folder, OutputFormat};
use super::types::{ItemError, ItemReport, ItemStatus, RenameKind, RenameOutcome, RenamePlan, RunReport};
use crate::error::AppError;
use crate::metadata::{CleanOutcome, MetadataCleaner};
use crate::parser::{locate_episode, EpisodeCode, LocatorMode, SeriesContext};
use crate::progress::Progress;
use crate::scanner::{scan_directory, scan_media, sort_media, validate_root, MediaKind, MediaPath, ScannerError};
use crate::title::{extract_title, SeenTitles, TitleLookup, TitleValidator};

/// Options for one rename run
#[derive(Debug, Clone)]
pub struct RenameOptions {
    pub dry_run: bool,
    pub force: bool,
    pub mode: LocatorMode,
    pub format: OutputFormat,
    pub series_name: Option<String>,
    pub deep_clean: bool,
    pub season_folders: bool,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            force: false,
            mode: LocatorMode::Standard,
            format: OutputFormat::default(),
            series_name: None,
            deep_clean: false,
            season_folders: false,
        }
    }
}

/// State for a single pass over a directory tree
pub struct RenameSession {
    root: PathBuf,
    options: RenameOptions,
    series: SeriesContext,
    seen: SeenTitles,
    companions: CompanionResolver,
    lookup: Option<Box<dyn TitleLookup>>,
    cleaner: Option<Box<dyn MetadataCleaner>>,
    cancel: Arc<AtomicBool>,
}

impl RenameSession {
    /// Validate the root and work out the series for the run
    pub fn new(root: &Path, options: RenameOptions) -> Result<Self, AppError> {
        validate_root(root)?;
        let root = fs::canonicalize(root).map_err(ScannerError::IoError)?;

        let series = match options.series_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => SeriesContext::from_name(name),
            _ => SeriesContext::from_path(&root),
        };
        debug!(series = %series.display_name(), "Series for this run");

        Ok(Self {
            root,
            companions: CompanionResolver::new(options.mode),
            options,
            series,
            seen: SeenTitles::new(),
            lookup: None,
            cleaner: None,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_lookup(mut self, lookup: Box<dyn TitleLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn with_cleaner(mut self, cleaner: Box<dyn MetadataCleaner>) -> Self {
        self.cleaner = Some(cleaner);
        self
    }

    /// Share a flag that stops the run before the next item when set
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn series(&self) -> &SeriesContext {
        &self.series
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Process every video, its companions and any orphan subtitles
    pub fn run(&mut self, progress: &mut Progress) -> Result<RunReport, AppError> {
        let mut report = RunReport::new(self.options.dry_run);

        progress.run_start(
            &self.root,
            &self.series.display_name(),
            self.options.format.as_str(),
            self.options.dry_run,
        );

        if self.options.season_folders {
            self.normalize_season_folders(&mut report, progress)?;
        }

        let media = scan_media(&self.root)?;
        let (mut videos, mut subtitles): (Vec<MediaPath>, Vec<MediaPath>) = media
            .into_iter()
            .filter(|m| m.kind != MediaKind::Sidecar)
            .partition(|m| m.kind == MediaKind::Video);
        sort_media(&mut videos, self.options.mode);
        sort_media(&mut subtitles, self.options.mode);

        info!(
            videos = videos.len(),
            subtitles = subtitles.len(),
            "Processing episode files"
        );

        let total = videos.len();
        for (i, video) in videos.iter().enumerate() {
            if self.is_cancelled() {
                warn!("Interrupted, stopping before {}", video.file_name());
                report.interrupted = true;
                return Ok(report);
            }
            self.process_video(video, i + 1, total, &mut report, progress);
        }

        let orphans: Vec<&MediaPath> = subtitles
            .iter()
            .filter(|s| !self.companions.is_handled(&s.path))
            .collect();
        let total = orphans.len();
        for (i, subtitle) in orphans.into_iter().enumerate() {
            if self.is_cancelled() {
                warn!("Interrupted, stopping before {}", subtitle.file_name());
                report.interrupted = true;
                return Ok(report);
            }
            self.process_orphan_subtitle(subtitle, i + 1, total, &mut report, progress);
        }

        Ok(report)
    }

    fn process_video(
        &mut self,
        video: &MediaPath,
        current: usize,
        total: usize,
        report: &mut RunReport,
        progress: &mut Progress,
    ) {
        let file_name = video.file_name();
        debug!(file = %file_name, "Processing file");

        let parent = video.parent_name();
        let Some(found) = locate_episode(&file_name, parent.as_deref(), self.options.mode) else {
            let error = ItemError::UnrecognizedEpisodePattern(file_name);
            self.record_error(RenameKind::Video, &video.path, None, &error, current, total, report, progress);
            return;
        };

        let stem = video.stem();
        let candidate = extract_title(&stem, &clamp_span(&found.span, stem.len()), &self.series);

        let validator = match self.lookup.as_deref() {
            Some(lookup) => TitleValidator::new(&self.series).with_lookup(lookup),
            None => TitleValidator::new(&self.series),
        };
        let title = validator.resolve(&candidate, &video.path, &found.code, &mut self.seen);
        debug!(code = %found.code, title = ?title.text(), "Resolved episode");

        let new_name = build_filename(
            &found.code,
            title.text(),
            &self.series,
            self.options.format,
            &video.extension,
        );
        let plan = RenamePlan::new(video.path.clone(), &new_name, RenameKind::Video, self.options.dry_run);

        let outcome = match execute_plan(&plan, self.options.force) {
            Ok(outcome) => outcome,
            Err(error) => {
                self.record_error(
                    RenameKind::Video,
                    &plan.old_path,
                    Some(plan.new_path.clone()),
                    &error,
                    current,
                    total,
                    report,
                    progress,
                );
                // Sidecars stay with the video that stayed put
                match self.companions.hold(&plan.old_path, &found.code) {
                    Ok(held) if held > 0 => debug!(video = %file_name, held, "Companions left in place"),
                    Ok(_) => {}
                    Err(e) => debug!(video = %file_name, error = %e, "Failed to list companion files"),
                }
                return;
            }
        };

        let item = ItemReport::new(
            RenameKind::Video,
            plan.old_path.clone(),
            Some(plan.new_path.clone()),
            ItemStatus::from_outcome(outcome),
        );
        progress.item(current, total, &item);
        report.push(item);

        self.rename_companions(&plan, &found.code, report, progress);
        self.deep_clean(&plan.new_path, outcome, report, progress);
    }

    fn rename_companions(
        &mut self,
        video: &RenamePlan,
        code: &EpisodeCode,
        report: &mut RunReport,
        progress: &mut Progress,
    ) {
        let plans = match self
            .companions
            .plan(&video.old_path, &video.new_path, code, self.options.dry_run)
        {
            Ok(plans) => plans,
            Err(e) => {
                debug!(video = ?video.old_path, error = %e, "Failed to list companion files");
                progress.warn(&format!("Could not read companions of {}: {}", video.old_name(), e));
                return;
            }
        };

        for plan in plans {
            let status = match execute_plan(&plan, self.options.force) {
                Ok(RenameOutcome::Unchanged) => continue,
                Ok(outcome) => ItemStatus::from_outcome(outcome),
                Err(error) => {
                    debug!("{}", error);
                    ItemStatus::from_error(&error)
                }
            };
            let item = ItemReport::new(RenameKind::Sidecar, plan.old_path, Some(plan.new_path), status);
            progress.companion(&item);
            report.push(item);
        }
    }

    fn deep_clean(
        &self,
        path: &Path,
        outcome: RenameOutcome,
        report: &mut RunReport,
        progress: &mut Progress,
    ) {
        if !self.options.deep_clean {
            return;
        }
        let Some(cleaner) = self.cleaner.as_deref() else {
            return;
        };
        if self.options.dry_run || outcome == RenameOutcome::WouldRename {
            debug!(path = ?path, "Dry run, metadata left untouched");
            return;
        }

        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        match cleaner.clean(path, &title) {
            Ok(CleanOutcome::Cleaned) => {
                progress.metadata_cleaned(path);
                report.cleaned.push(path.to_path_buf());
            }
            Ok(other) => debug!(path = ?path, outcome = ?other, "Metadata not changed"),
            Err(e) => {
                warn!(path = ?path, error = %e, "Metadata cleaning failed");
                progress.warn(&format!("Metadata cleaning failed: {}", e));
            }
        }
    }

    /// Subtitles no video claimed get their own name, keeping the language tag
    fn process_orphan_subtitle(
        &mut self,
        subtitle: &MediaPath,
        current: usize,
        total: usize,
        report: &mut RunReport,
        progress: &mut Progress,
    ) {
        let stem = subtitle.stem();
        let base = strip_language_tag(&stem);
        let parent = subtitle.parent_name();

        let Some(found) = locate_episode(base, parent.as_deref(), self.options.mode) else {
            let error = ItemError::UnrecognizedEpisodePattern(subtitle.file_name());
            self.record_error(RenameKind::Sidecar, &subtitle.path, None, &error, current, total, report, progress);
            return;
        };

        let candidate = extract_title(base, &clamp_span(&found.span, base.len()), &self.series);
        let title = TitleValidator::new(&self.series).accept(&candidate, &subtitle.path);

        let new_stem = build_stem(&found.code, title.text(), &self.series, self.options.format);
        let new_name = subtitle_name(&new_stem, &subtitle.path);
        let plan = RenamePlan::new(
            subtitle.path.clone(),
            &new_name,
            RenameKind::Sidecar,
            self.options.dry_run,
        );
        self.companions.mark_handled(&plan.old_path);

        match execute_plan(&plan, self.options.force) {
            Ok(outcome) => {
                let item = ItemReport::new(
                    RenameKind::Sidecar,
                    plan.old_path,
                    Some(plan.new_path),
                    ItemStatus::from_outcome(outcome),
                );
                progress.item(current, total, &item);
                report.push(item);
            }
            Err(error) => self.record_error(
                RenameKind::Sidecar,
                &plan.old_path,
                Some(plan.new_path.clone()),
                &error,
                current,
                total,
                report,
                progress,
            ),
        }
    }

    /// Rename `season 1`, `S2`, `specials` style folders under the root
    fn normalize_season_folders(
        &mut self,
        report: &mut RunReport,
        progress: &mut Progress,
    ) -> Result<(), AppError> {
        let plans: Vec<RenamePlan> = scan_directory(&self.root)?
            .into_iter()
            .filter_map(|entry| {
                let canonical = canonical_season_folder(&entry.name)?;
                (canonical != entry.name).then(|| {
                    RenamePlan::new(entry.path, &canonical, RenameKind::Folder, self.options.dry_run)
                })
            })
            .collect();

        let total = plans.len();
        for (i, plan) in plans.into_iter().enumerate() {
            // Folders are never overwritten
            match execute_plan(&plan, false) {
                Ok(outcome) => {
                    let item = ItemReport::new(
                        RenameKind::Folder,
                        plan.old_path,
                        Some(plan.new_path),
                        ItemStatus::from_outcome(outcome),
                    );
                    progress.item(i + 1, total, &item);
                    report.push(item);
                }
                Err(error) => self.record_error(
                    RenameKind::Folder,
                    &plan.old_path,
                    Some(plan.new_path.clone()),
                    &error,
                    i + 1,
                    total,
                    report,
                    progress,
                ),
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn record_error(
        &self,
        kind: RenameKind,
        path: &Path,
        new_path: Option<PathBuf>,
        error: &ItemError,
        current: usize,
        total: usize,
        report: &mut RunReport,
        progress: &mut Progress,
    ) {
        debug!("{}", error);
        let item = ItemReport::new(kind, path.to_path_buf(), new_path, ItemStatus::from_error(error));
        progress.item(current, total, &item);
        report.push(item);
    }
}

fn clamp_span(span: &Range<usize>, len: usize) -> Range<usize> {
    span.start.min(len)..span.end.min(len)
}

/// Run a whole session over `root` without external collaborators
pub fn process_directory(
    root: &Path,
    options: RenameOptions,
    progress: &mut Progress,
) -> Result<RunReport, AppError> {
    RenameSession::new(root, options)?.run(progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataError;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::{tempdir, TempDir};

    fn series_dir(name: &str) -> (TempDir, PathBuf) {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(name);
        fs::create_dir_all(&dir).unwrap();
        (temp, dir)
    }

    fn touch(dir: &Path, name: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    fn run(dir: &Path, options: RenameOptions) -> RunReport {
        process_directory(dir, options, &mut Progress::silent()).unwrap()
    }

    fn with_format(format: OutputFormat) -> RenameOptions {
        RenameOptions {
            format,
            ..Default::default()
        }
    }

    // ============ Scenario Tests ============

    #[test]
    fn test_standard_release_name() {
        let (_temp, dir) = series_dir("Breaking Bad (2008)");
        touch(&dir, "Breaking.Bad.S01E01.Pilot.720p.WEB-DL.x264-GROUP.mkv");

        let report = run(&dir, with_format(OutputFormat::ShowYearCodeTitle));

        assert_eq!(report.renamed_count(), 1);
        assert_eq!(names(&dir), vec!["Breaking Bad (2008) - S01E01 - Pilot.mkv"]);
    }

    #[test]
    fn test_anime_release_name() {
        let (_temp, dir) = series_dir("Cyberpunk Edgerunners (2022)");
        touch(
            &dir,
            "[Erai-raws] Cyberpunk - Edgerunners - 01 [1080p][Multiple Subtitle][ABC123].mkv",
        );

        let options = RenameOptions {
            mode: LocatorMode::Anime,
            format: OutputFormat::ShowCode,
            ..Default::default()
        };
        run(&dir, options);

        assert_eq!(names(&dir), vec!["Cyberpunk Edgerunners - S01E01.mkv"]);
    }

    #[test]
    fn test_title_cut_before_source_tag() {
        let (_temp, dir) = series_dir("Doctor Who (2005)");
        touch(&dir, "Doctor.Who.2005.S05E04.Time.Of.The.Angels.HDTV.XviD-FoV.avi");

        run(&dir, with_format(OutputFormat::ShowCodeTitle));

        assert_eq!(names(&dir), vec!["Doctor Who - S05E04 - Time Of The Angels.avi"]);
    }

    #[test]
    fn test_specials_folder_forces_season_zero() {
        let (_temp, dir) = series_dir("Show");
        touch(&dir, "Specials/Show.S03E01.Christmas.Special.mkv");

        let report = run(&dir, with_format(OutputFormat::ShowCodeTitle));

        assert_eq!(report.renamed_count(), 1);
        assert_eq!(
            names(&dir.join("Specials")),
            vec!["Show - S00E01 - Christmas Special.mkv"]
        );
    }

    // ============ Invariant Tests ============

    #[test]
    fn test_second_run_is_noop() {
        let (_temp, dir) = series_dir("Breaking Bad (2008)");
        touch(&dir, "Breaking.Bad.S01E01.Pilot.720p.WEB-DL.x264-GROUP.mkv");
        touch(&dir, "Breaking.Bad.S01E01.Pilot.720p.WEB-DL.x264-GROUP.en.srt");
        touch(&dir, "breaking_bad_1x02_Cats_in_the_Bag....mkv");
        touch(&dir, "Breaking Bad - S01E03.mkv");

        for format in OutputFormat::ALL {
            run(&dir, with_format(format));
            let settled = names(&dir);

            let second = run(&dir, with_format(format));

            assert_eq!(second.renamed_count(), 0, "format {}", format);
            assert_eq!(names(&dir), settled, "format {}", format);
        }

        // Anime mode must read back its own output when the title starts with a number
        for format in OutputFormat::ALL {
            let (_temp, dir) = series_dir("Show");
            touch(&dir, "Show.S01E05.24.Hours.mkv");
            touch(&dir, "[Group] Show - 06 [1080p].mkv");
            let options = RenameOptions {
                mode: LocatorMode::Anime,
                ..with_format(format)
            };
            run(&dir, options.clone());
            let settled = names(&dir);

            let second = run(&dir, options);

            assert_eq!(second.renamed_count(), 0, "anime format {}", format);
            assert_eq!(names(&dir), settled, "anime format {}", format);
        }

        let (_temp, dir) = series_dir("Show");
        touch(&dir, "Show.S01E05.24.Hours.mkv");
        let anime = RenameOptions {
            mode: LocatorMode::Anime,
            ..with_format(OutputFormat::ShowCodeTitle)
        };
        run(&dir, anime.clone());
        run(&dir, anime);
        assert_eq!(names(&dir), vec!["Show - S01E05 - 24 Hours.mkv"]);
    }

    #[test]
    fn test_duplicate_title_first_wins() {
        let (_temp, dir) = series_dir("Show");
        touch(&dir, "Show.S01E01.Pilot.mkv");
        touch(&dir, "Show.S01E02.Pilot.mkv");

        run(&dir, RenameOptions::default());

        assert_eq!(
            names(&dir),
            vec!["Show - S01E01 - Pilot.mkv", "Show - S01E02.mkv"]
        );
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let (_temp, dir) = series_dir("Show");
        touch(&dir, "Show.S01E01.Pilot.mkv");
        touch(&dir, "Show.S01E01.Pilot.en.srt");
        touch(&dir, "season 2/Show.S02E01.mkv");
        let before = names(&dir);

        let options = RenameOptions {
            dry_run: true,
            season_folders: true,
            ..Default::default()
        };
        let report = run(&dir, options);

        assert!(report.dry_run);
        assert!(report.planned_count() >= 3);
        assert_eq!(report.renamed_count(), 0);
        assert_eq!(names(&dir), before);
        assert_eq!(names(&dir.join("season 2")), vec!["Show.S02E01.mkv"]);
    }

    // ============ Companion Tests ============

    #[test]
    fn test_noop_video_still_renames_subtitles() {
        let (_temp, dir) = series_dir("Show");
        touch(&dir, "Show - S01E01 - Pilot.mkv");
        touch(&dir, "show.s01e01.EN.srt");

        let report = run(&dir, RenameOptions::default());

        assert_eq!(report.unchanged_count(), 1);
        assert_eq!(
            names(&dir),
            vec!["Show - S01E01 - Pilot.en.srt", "Show - S01E01 - Pilot.mkv"]
        );
    }

    #[test]
    fn test_companions_follow_video() {
        let (_temp, dir) = series_dir("Show");
        touch(&dir, "Show.S01E01.Pilot.mkv");
        touch(&dir, "Show.S01E01.Pilot.nfo");
        touch(&dir, "Show.S01E01.Pilot-thumb.jpg");

        let report = run(&dir, RenameOptions::default());

        assert_eq!(
            names(&dir),
            vec![
                "Show - S01E01 - Pilot-thumb.jpg",
                "Show - S01E01 - Pilot.mkv",
                "Show - S01E01 - Pilot.nfo",
            ]
        );
        let companions = report
            .items
            .iter()
            .filter(|i| i.kind == RenameKind::Sidecar)
            .count();
        assert_eq!(companions, 2);
    }

    #[test]
    fn test_orphan_subtitle_renamed_alone() {
        let (_temp, dir) = series_dir("Show");
        touch(&dir, "Show.S01E05.Finale.fr.srt");

        run(&dir, RenameOptions::default());

        assert_eq!(names(&dir), vec!["Show - S01E05 - Finale.fr.srt"]);
    }

    // ============ Executor State Tests ============

    #[cfg(unix)]
    #[test]
    fn test_case_only_rename_reported_as_rename() {
        let (_temp, dir) = series_dir("Show");
        touch(&dir, "show - S01E01 - Pilot.mkv");

        let report = run(&dir, RenameOptions::default());

        assert_eq!(report.renamed_count(), 1);
        assert_eq!(names(&dir), vec!["Show - S01E01 - Pilot.mkv"]);
    }

    #[test]
    fn test_collision_skips_unless_forced() {
        let (_temp, dir) = series_dir("Show");
        touch(&dir, "Show.S01E01.mkv");
        fs::write(dir.join("Show - S01E01.mkv"), b"existing").unwrap();
        fs::write(dir.join("Show.S01E01.mkv"), b"incoming").unwrap();

        let report = run(&dir, with_format(OutputFormat::ShowCode));
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(fs::read(dir.join("Show - S01E01.mkv")).unwrap(), b"existing");

        let options = RenameOptions {
            format: OutputFormat::ShowCode,
            force: true,
            ..Default::default()
        };
        run(&dir, options);
        assert_eq!(names(&dir), vec!["Show - S01E01.mkv"]);
        assert_eq!(fs::read(dir.join("Show - S01E01.mkv")).unwrap(), b"incoming");
    }

    #[test]
    fn test_failed_video_keeps_its_subtitles() {
        let (_temp, dir) = series_dir("Show");
        touch(&dir, "Show.S01E01.mkv");
        touch(&dir, "Show.S01E01.en.srt");
        fs::write(dir.join("Show - S01E01.mkv"), b"existing").unwrap();

        let report = run(&dir, with_format(OutputFormat::ShowCode));

        assert_eq!(report.skipped_count(), 1);
        assert_eq!(
            names(&dir),
            vec!["Show - S01E01.mkv", "Show.S01E01.en.srt", "Show.S01E01.mkv"]
        );
    }

    #[test]
    fn test_unrecognized_file_reported_once() {
        let (_temp, dir) = series_dir("Show");
        touch(&dir, "behind the scenes.mkv");
        touch(&dir, "Show.S01E01.mkv");

        let report = run(&dir, RenameOptions::default());

        let skipped: Vec<_> = report
            .items
            .iter()
            .filter(|i| matches!(i.status, ItemStatus::Skipped(_)))
            .collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].old_name(), "behind the scenes.mkv");
        assert_eq!(report.renamed_count(), 1);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let result = RenameSession::new(Path::new("/nonexistent/episode-renamer"), RenameOptions::default());
        assert!(matches!(result, Err(AppError::DirectoryNotFound { .. })));
    }

    // ============ Season Folder Tests ============

    #[test]
    fn test_season_folders_normalized_first() {
        let (_temp, dir) = series_dir("Show");
        touch(&dir, "season 1/Show.S01E01.mkv");
        touch(&dir, "special/Show.S00E01.mkv");

        let options = RenameOptions {
            season_folders: true,
            format: OutputFormat::ShowCode,
            ..Default::default()
        };
        let report = run(&dir, options);

        assert_eq!(names(&dir), vec!["Season 01", "Specials"]);
        assert_eq!(names(&dir.join("Season 01")), vec!["Show - S01E01.mkv"]);
        assert_eq!(names(&dir.join("Specials")), vec!["Show - S00E01.mkv"]);
        assert!(report.items.iter().any(|i| i.kind == RenameKind::Folder));
    }

    // ============ Collaborator Tests ============

    struct FixedLookup(&'static str);

    impl TitleLookup for FixedLookup {
        fn lookup_title(&self, _path: &Path) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingCleaner {
        calls: Rc<RefCell<Vec<(PathBuf, String)>>>,
    }

    impl MetadataCleaner for RecordingCleaner {
        fn clean(&self, path: &Path, title: &str) -> Result<CleanOutcome, MetadataError> {
            self.calls
                .borrow_mut()
                .push((path.to_path_buf(), title.to_string()));
            Ok(CleanOutcome::Cleaned)
        }
    }

    #[test]
    fn test_lookup_supplies_missing_title() {
        let (_temp, dir) = series_dir("Show");
        touch(&dir, "Show.S01E01.mkv");

        let mut session = RenameSession::new(&dir, RenameOptions::default())
            .unwrap()
            .with_lookup(Box::new(FixedLookup("The Beginning")));
        session.run(&mut Progress::silent()).unwrap();

        assert_eq!(names(&dir), vec!["Show - S01E01 - The Beginning.mkv"]);
    }

    #[test]
    fn test_deep_clean_uses_final_stem() {
        let (_temp, dir) = series_dir("Show");
        touch(&dir, "Show.S01E01.Pilot.mkv");
        touch(&dir, "Show - S01E02 - Second.mkv");

        let cleaner = RecordingCleaner::default();
        let options = RenameOptions {
            deep_clean: true,
            ..Default::default()
        };
        let mut session = RenameSession::new(&dir, options)
            .unwrap()
            .with_cleaner(Box::new(cleaner.clone()));
        let report = session.run(&mut Progress::silent()).unwrap();

        let titles: Vec<String> = cleaner.calls.borrow().iter().map(|(_, t)| t.clone()).collect();
        assert_eq!(titles, vec!["Show - S01E01 - Pilot", "Show - S01E02 - Second"]);
        assert_eq!(report.cleaned.len(), 2);
    }

    #[test]
    fn test_deep_clean_skipped_in_dry_run() {
        let (_temp, dir) = series_dir("Show");
        touch(&dir, "Show.S01E01.mkv");

        let cleaner = RecordingCleaner::default();
        let options = RenameOptions {
            deep_clean: true,
            dry_run: true,
            ..Default::default()
        };
        let mut session = RenameSession::new(&dir, options)
            .unwrap()
            .with_cleaner(Box::new(cleaner.clone()));
        session.run(&mut Progress::silent()).unwrap();

        assert!(cleaner.calls.borrow().is_empty());
    }

    #[test]
    fn test_cancelled_before_first_file() {
        let (_temp, dir) = series_dir("Show");
        touch(&dir, "Show.S01E01.mkv");

        let flag = Arc::new(AtomicBool::new(true));
        let mut session = RenameSession::new(&dir, RenameOptions::default())
            .unwrap()
            .with_cancel_flag(flag);
        let report = session.run(&mut Progress::silent()).unwrap();

        assert!(report.interrupted);
        assert!(report.is_empty());
        assert_eq!(names(&dir), vec!["Show.S01E01.mkv"]);
    }

    #[test]
    fn test_explicit_series_name() {
        let (_temp, dir) = series_dir("downloads");
        touch(&dir, "s02e03.Bit.by.a.Dead.Bee.mkv");

        let options = RenameOptions {
            series_name: Some("Breaking Bad (2008)".to_string()),
            format: OutputFormat::ShowYearCodeTitle,
            ..Default::default()
        };
        run(&dir, options);

        assert_eq!(
            names(&dir),
            vec!["Breaking Bad (2008) - S02E03 - Bit by a Dead Bee.mkv"]
        );
    }
}
