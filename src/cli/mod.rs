//! # CLI Module
//!
//! Command-line interface for the media sorter.
//!
//! ## Usage
//! ```bash
//! # Keep an import folder empty, reporting after a minute of quiet
//! media-sort watch --source /share/import --dest /share/pictures -v
//!
//! # Sort a folder once and print the report
//! media-sort sort /media/card /share/pictures --copy
//!
//! # Show the creation date a file would be sorted under
//! media-sort check-date IMG_0001.JPG clip.mov
//!
//! # Find duplicates and write a reviewable removal script
//! media-sort dedup ~/Pictures /backup/Pictures --output actions.sh
//! ```

use clap::{Args, Parser, Subcommand};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use media_sorter::core::dedup::{
    check_duplicates_with_events, recommend_action, render_listing, render_script,
};
use media_sorter::core::metadata::{self, DateFallback, DEFAULT_NO_DATE_BUCKET};
use media_sorter::core::organize::{
    BatchReport, OperationMode, Sorter, SorterConfig, DEFAULT_FOLDER_FORMAT,
};
use media_sorter::core::watcher::{Notifier, WatchConfig, WatchSorter};
use media_sorter::error::{DateError, Result, WatchError};
use media_sorter::events::{DedupEvent, Event, EventChannel};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Media Sorter - files photos and videos by the date they were taken
#[derive(Parser, Debug)]
#[command(name = "media-sort")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch an import folder and sort whatever lands in it
    Watch {
        /// Folder to watch
        #[arg(short, long)]
        source: PathBuf,

        /// Root of the archive
        #[arg(short, long)]
        dest: PathBuf,

        /// Seconds without activity before a batch is sorted and reported
        #[arg(short, long, default_value = "60")]
        idleness: u64,

        /// Stop (after a final drain) once this many seconds have passed.
        /// Ctrl-C stops the same way
        #[arg(long)]
        run_for: Option<u64>,

        #[command(flatten)]
        sorting: SortingArgs,
    },

    /// Sort a folder once, without watching it
    Sort {
        /// Folder to sort
        source: PathBuf,

        /// Root of the archive
        dest: PathBuf,

        #[command(flatten)]
        sorting: SortingArgs,
    },

    /// Print the creation date of files
    CheckDate {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Find identical files and recommend which copies to erase
    Dedup {
        /// Directories to search
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write a bash script with the recommended actions instead of a listing
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print groups and recommendations as JSON
        #[arg(long, conflicts_with = "output")]
        json: bool,
    },
}

/// Options shared by `watch` and `sort`
#[derive(Args, Debug)]
struct SortingArgs {
    /// strftime-style template for the archive folder
    #[arg(short, long, default_value = DEFAULT_FOLDER_FORMAT)]
    folder_format: String,

    /// Copy instead of moving
    #[arg(short, long)]
    copy: bool,

    /// Log what would happen without touching anything
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Date undated files by their filesystem timestamp
    #[arg(short, long, conflicts_with = "no_date")]
    timestamp: bool,

    /// Folder for files without a readable date
    #[arg(long, default_value = DEFAULT_NO_DATE_BUCKET)]
    no_date: String,
}

impl SortingArgs {
    fn into_config(self, dest: PathBuf) -> SorterConfig {
        let fallback = if self.timestamp {
            DateFallback::FileTimestamp
        } else {
            DateFallback::Bucket(self.no_date)
        };
        let operation = if self.copy {
            OperationMode::Copy
        } else {
            OperationMode::Move
        };
        SorterConfig::new(dest)
            .with_folder_format(self.folder_format)
            .with_fallback(fallback)
            .with_operation(operation)
            .with_dry_run(self.dry_run)
    }
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    media_sorter::init_tracing(cli.verbose);

    match cli.command {
        Commands::Watch {
            source,
            dest,
            idleness,
            run_for,
            sorting,
        } => run_watch(
            source,
            sorting.into_config(dest),
            Duration::from_secs(idleness),
            run_for.map(Duration::from_secs),
        ),
        Commands::Sort {
            source,
            dest,
            sorting,
        } => run_sort(&source, sorting.into_config(dest)),
        Commands::CheckDate { paths } => {
            run_check_date(&paths);
            Ok(())
        }
        Commands::Dedup {
            paths,
            output,
            json,
        } => run_dedup(&paths, output, json),
    }
}

/// Prints every batch report to the terminal
struct TermNotifier {
    term: Term,
}

impl Notifier for TermNotifier {
    fn deliver(&self, report: &BatchReport) -> std::result::Result<(), WatchError> {
        print_report(&self.term, report).map_err(|e| WatchError::NotifyFailed(e.to_string()))
    }
}

fn print_report(term: &Term, report: &BatchReport) -> std::io::Result<()> {
    let marker = if report.failed.is_empty() {
        style("✓").green().bold()
    } else {
        style("!").yellow().bold()
    };
    term.write_line(&format!("{} {}", marker, style(report.subject()).bold()))?;
    term.write_line("")?;
    for line in report.body().lines() {
        term.write_line(&format!("  {}", line))?;
    }
    term.write_line("")
}

fn run_watch(
    source: PathBuf,
    sorter: SorterConfig,
    idleness: Duration,
    run_for: Option<Duration>,
) -> Result<()> {
    let term = Term::stderr();
    let config = WatchConfig::new(&source, sorter).with_idleness(idleness);
    let notifier = TermNotifier { term: term.clone() };
    let mut watcher = WatchSorter::new(config, Box::new(notifier))?;

    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .map_err(|e| WatchError::InitFailed(format!("cannot handle Ctrl-C: {}", e)))?;

    watcher.start()?;
    term.write_line(&format!(
        "{} {} ({} pending)",
        style("Watching").bold().cyan(),
        source.display(),
        watcher.pending()
    ))
    .ok();

    watch_until(&mut watcher, Duration::from_secs(1), run_for, &stop);
    term.write_line(&format!("{} {}", style("Stopped").bold(), source.display()))
        .ok();
    Ok(())
}

/// Tick the watcher until `stop` is raised or `run_for` has elapsed, then
/// stop it, which drains whatever is still queued
fn watch_until(
    watcher: &mut WatchSorter,
    tick: Duration,
    run_for: Option<Duration>,
    stop: &AtomicBool,
) -> Option<BatchReport> {
    let started = Instant::now();
    while !stop.load(Ordering::SeqCst) {
        thread::sleep(tick);
        watcher.checkpoint();
        if run_for.is_some_and(|limit| started.elapsed() >= limit) {
            break;
        }
    }
    watcher.stop()
}

fn run_sort(source: &Path, config: SorterConfig) -> Result<()> {
    let term = Term::stderr();
    let sorter = Sorter::new(config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Sorting {}", source.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let report = sorter.sort_tree(source)?;
    sorter.prune(source);
    spinner.finish_and_clear();

    print_report(&term, &report)?;
    Ok(())
}

fn run_check_date(paths: &[PathBuf]) {
    for path in paths {
        match metadata::resolve(path) {
            Ok(date) => println!("{}: {}", path.display(), date),
            Err(DateError::Readout { reason, .. }) => {
                tracing::warn!("{}: {}", path.display(), reason);
                match metadata::file_timestamp(path) {
                    Ok(date) => println!(
                        "{}: {} {}",
                        path.display(),
                        date,
                        style("(filesystem timestamp)").dim()
                    ),
                    Err(e) => eprintln!("{}: {}", path.display(), style(e).red()),
                }
            }
            Err(e) => eprintln!("{}", style(e).red()),
        }
    }
}

fn run_dedup(paths: &[PathBuf], output: Option<PathBuf>, json: bool) -> Result<()> {
    let (sender, receiver) = EventChannel::new();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let spinner_clone = spinner.clone();
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Dedup(DedupEvent::StageStarted { stage, candidates }) => {
                    spinner_clone.set_message(format!("{} ({} files)", stage, candidates));
                }
                Event::Dedup(DedupEvent::Completed { .. }) => {
                    spinner_clone.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let groups = check_duplicates_with_events(paths, &sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    spinner.finish_and_clear();

    let groups = groups?;
    let recommendation = recommend_action(&groups);

    if json {
        let output = serde_json::json!({
            "groups": groups,
            "recommendation": recommendation,
        });
        let text = serde_json::to_string_pretty(&output)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    match output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(&path)?);
            render_script(&recommendation, &mut out)?;
            out.flush()?;
            let term = Term::stderr();
            term.write_line(&format!(
                "{} {} removals and {} checks written to {}",
                style("✓").green().bold(),
                style(recommendation.erase.len()).cyan(),
                style(recommendation.check.len()).cyan(),
                path.display()
            ))?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            render_listing(&recommendation, &mut out)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_sorter::core::watcher::{LogNotifier, PathChange, WatchState};
    use std::fs;
    use tempfile::TempDir;

    fn queued_watcher(import: &Path, archive: &Path) -> (WatchSorter, PathBuf) {
        let src = import.join("IMG_0001.JPG");
        fs::write(&src, b"no exif here").unwrap();
        let config = WatchConfig::new(import, SorterConfig::new(archive))
            .with_idleness(Duration::from_secs(3600));
        let watcher = WatchSorter::new(config, Box::new(LogNotifier)).unwrap();
        watcher.ingest(PathChange::Upsert(src.clone()));
        (watcher, src)
    }

    #[test]
    fn interrupt_still_drains_the_queue() {
        let import = TempDir::new().unwrap();
        let archive = TempDir::new().unwrap();
        let (mut watcher, src) = queued_watcher(import.path(), archive.path());
        let stop = AtomicBool::new(true);

        let report = watch_until(&mut watcher, Duration::from_millis(1), None, &stop).unwrap();

        assert_eq!(report.moved, vec![archive.path().join("undated/img_0001.jpg")]);
        assert!(!src.exists());
        assert_eq!(watcher.state(), WatchState::Stopped);
    }

    #[test]
    fn run_for_ends_the_loop_with_a_drain() {
        let import = TempDir::new().unwrap();
        let archive = TempDir::new().unwrap();
        let (mut watcher, src) = queued_watcher(import.path(), archive.path());
        let stop = AtomicBool::new(false);

        let report = watch_until(
            &mut watcher,
            Duration::from_millis(1),
            Some(Duration::ZERO),
            &stop,
        )
        .unwrap();

        assert_eq!(report.moved.len(), 1);
        assert!(!src.exists());
    }
}
