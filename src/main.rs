use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use episode_renamer::cli::Args;
use episode_renamer::error::AppError;
use episode_renamer::history::write_history;
use episode_renamer::logging;
use episode_renamer::metadata::{config_from_env, ExternalToolCleaner, MediaInfoLookup};
use episode_renamer::output::{display_dry_run, display_execution_result};
use episode_renamer::progress::{should_use_colors, Progress};
use episode_renamer::rename::{RenameOptions, RenameSession};
use episode_renamer::revert::{revert_from_history, RevertOptions};
use episode_renamer::LocatorMode;
use tracing::{debug, error, info, warn};

fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(args.verbose);

    debug!("Environment loaded");

    if let Err(e) = run(args) {
        error!("{}", e);
        eprintln!("\nError: {}", e.detailed_message());
        std::process::exit(e.exit_code().into());
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let mut progress = Progress::new_with_ui(args.verbose > 0, should_use_colors());

    if let Some(history_file) = &args.revert {
        info!("Revert mode: {:?}", history_file);
        let options = RevertOptions { dry_run: args.dry };
        revert_from_history(history_file, &options, &mut progress)?;
        return Ok(());
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        if let Err(e) = ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst)) {
            warn!("Could not install Ctrl-C handler: {}", e);
        }
    }

    let format = args.output_format();
    let options = RenameOptions {
        dry_run: args.dry,
        force: args.force,
        mode: if args.anime {
            LocatorMode::Anime
        } else {
            LocatorMode::Standard
        },
        format,
        series_name: args.series.clone(),
        deep_clean: args.deep_clean,
        season_folders: args.season_folders,
    };

    let tools = config_from_env();
    let mut session = RenameSession::new(&args.target_dir, options)?.with_cancel_flag(cancel);

    if args.metadata_titles {
        match MediaInfoLookup::new(&tools) {
            Some(lookup) => session = session.with_lookup(Box::new(lookup)),
            None => progress.warn(&format!(
                "{} not found, titles will come from file names only",
                tools.mediainfo
            )),
        }
    }

    if args.deep_clean {
        let cleaner = ExternalToolCleaner::new(tools.clone());
        for missing in cleaner.missing_tools() {
            progress.warn(&missing);
        }
        session = session.with_cleaner(Box::new(cleaner));
    }

    let report = session.run(&mut progress)?;

    let mut stdout = std::io::stdout();
    let displayed = if args.dry {
        display_dry_run(&report, &mut stdout)
    } else {
        display_execution_result(&report, &mut stdout)
    };
    displayed.map_err(|e| AppError::Other(format!("Failed to display output: {}", e)))?;

    if args.history && !args.dry {
        if report.applied().next().is_some() {
            let path = write_history(&report, session.root(), format.as_str())?;
            progress.history_written(&path);
        } else {
            info!("Nothing was renamed, no history written");
        }
    }

    if report.interrupted {
        return Err(AppError::Interrupted);
    }

    Ok(())
}
