//! # CLI Module
//!
//! Command-line interface for the duplicate finder.
//!
//! ## Usage
//! ```bash
//! # Files sharing a name and size
//! dupfree duplicates ~/Photos ~/Backup
//!
//! # Confirm byte-for-byte and cap the output
//! dupfree duplicates ~/Photos --verify-content --max-files 200
//!
//! # Visually similar images
//! dupfree similar ~/Photos --similarity 95
//!
//! # The ten closest pairs, as JSON
//! dupfree similar ~/Photos --closest 10 --output json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use dupfree::core::duplicates::DuplicatePolicy;
use dupfree::core::grouping::Clustering;
use dupfree::core::pipeline::{
    DuplicateReport, DuplicateSearch, PartialResults, SimilarReport, SimilarSearch,
};
use dupfree::core::scanner::FileRecord;
use dupfree::error::Result;
use dupfree::events::{Event, EventChannel, EventReceiver, GroupEvent, PipelineEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::thread;

/// dupfree - find duplicate files and near-duplicate images
#[derive(Parser, Debug)]
#[command(name = "dupfree")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Also write diagnostic logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find files that share a name and byte size
    Duplicates {
        /// Directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Cap on the total number of files reported
        #[arg(long)]
        max_files: Option<usize>,

        /// Confirm duplicates by hashing file content
        #[arg(long)]
        verify_content: bool,

        /// Maximum directory depth
        #[arg(long, default_value = "100")]
        max_depth: usize,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Find visually similar images
    Similar {
        /// Directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Similarity percentage (clamped to 85-99)
        #[arg(short, long, default_value = "92")]
        similarity: u32,

        /// Maximum hash distance for a candidate pair (0-64)
        #[arg(long, default_value = "25")]
        prefilter: u32,

        /// Report the N closest pairs instead of groups
        #[arg(long)]
        closest: Option<usize>,

        /// Group transitively after verification instead of streaming
        #[arg(long)]
        transitive: bool,

        /// Include hidden and system files
        #[arg(long)]
        include_hidden: bool,

        /// Maximum directory depth
        #[arg(long, default_value = "100")]
        max_depth: usize,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Print each group as soon as it forms
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let _guard = dupfree::init_tracing(cli.log_file.as_deref());

    match cli.command {
        Commands::Duplicates {
            paths,
            max_files,
            verify_content,
            max_depth,
            output,
        } => {
            let policy = if verify_content {
                DuplicatePolicy::ContentVerified
            } else {
                DuplicatePolicy::Metadata
            };
            let search = DuplicateSearch::builder()
                .roots(paths)
                .max_files(max_files)
                .policy(policy)
                .partial_results(PartialResults::Discard)
                .max_depth(max_depth)
                .build()?;
            run_duplicates(search, output)
        }
        Commands::Similar {
            paths,
            similarity,
            prefilter,
            closest,
            transitive,
            include_hidden,
            max_depth,
            output,
            verbose,
        } => {
            let clustering = if transitive {
                Clustering::Transitive
            } else {
                Clustering::Streaming
            };
            let search = SimilarSearch::builder()
                .roots(paths)
                .similarity(similarity)
                .prefilter_threshold(prefilter)
                .closest_pairs(closest)
                .clustering(clustering)
                .include_hidden(include_hidden)
                .max_depth(max_depth)
                .build()?;
            run_similar(search, output, verbose)
        }
    }
}

fn run_duplicates(search: DuplicateSearch, output: OutputFormat) -> Result<()> {
    let term = Term::stderr();
    print_header(&term, output, "Exact duplicates");

    let (sender, receiver) = EventChannel::new();
    let event_thread = watch_progress(receiver, output == OutputFormat::Pretty, false);

    let report = search.spawn(sender).join()?;
    event_thread.join().ok();

    match output {
        OutputFormat::Pretty => print_pretty_duplicates(&term, &report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Minimal => {
            for group in &report.groups {
                for file in group.files.iter().skip(1) {
                    println!("{}", file.path.display());
                }
            }
        }
    }

    Ok(())
}

fn run_similar(search: SimilarSearch, output: OutputFormat, verbose: bool) -> Result<()> {
    let term = Term::stderr();
    print_header(&term, output, "Similar images");

    let (sender, receiver) = EventChannel::new();
    let event_thread = watch_progress(receiver, output == OutputFormat::Pretty, verbose);

    let report = search.spawn(sender).join()?;
    event_thread.join().ok();

    match output {
        OutputFormat::Pretty => print_pretty_similar(&term, &report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Minimal => {
            for group in &report.groups {
                let paths: Vec<String> = group
                    .images
                    .iter()
                    .map(|f| f.path.display().to_string())
                    .collect();
                println!("{}", paths.join("\t"));
            }
        }
    }

    Ok(())
}

fn print_header(term: &Term, output: OutputFormat, title: &str) {
    if output == OutputFormat::Pretty {
        term.write_line(&format!(
            "{} {} {}",
            style("dupfree").bold().cyan(),
            style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
            style(title).dim()
        ))
        .ok();
        term.write_line("").ok();
    }
}

/// Drain events on a separate thread, driving a spinner or progress bar.
fn watch_progress(
    receiver: EventReceiver,
    show: bool,
    verbose: bool,
) -> thread::JoinHandle<()> {
    let progress = show.then(|| {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        pb
    });

    thread::spawn(move || {
        for event in receiver.iter() {
            let Some(pb) = progress.as_ref() else {
                continue;
            };
            match event {
                Event::Status(message) => pb.set_message(message),
                Event::Progress(p) => {
                    pb.set_length(p.total as u64);
                    pb.set_position(p.current as u64);
                }
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_position(0);
                    pb.set_message(phase.to_string());
                }
                Event::Group(GroupEvent::Created(group)) if verbose => {
                    pb.println(format!(
                        "  {} {} ({} images)",
                        style("+").green(),
                        group.id,
                        group.images.len()
                    ));
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Cancelled) => pb.finish_and_clear(),
                _ => {}
            }
        }
    })
}

fn print_pretty_duplicates(term: &Term, report: &DuplicateReport) {
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();
    term.write_line(&format!(
        "  {} files scanned in {:.1}s",
        style(report.files_scanned).cyan(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} duplicate groups found",
        style(report.groups.len()).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} reclaimable",
        style(format_bytes(report.wasted_bytes())).yellow()
    ))
    .ok();
    print_root_errors(term, &report.root_errors);
    term.write_line("").ok();

    if report.groups.is_empty() {
        term.write_line("  No duplicates found.").ok();
        return;
    }

    for group in &report.groups {
        term.write_line(&format!(
            "  {} ({} files, {} each)",
            style(&group.key).bold(),
            group.files.len(),
            format_bytes(group.file_size())
        ))
        .ok();
        print_files(term, &group.files);
        term.write_line("").ok();
    }

    term.write_line(&format!(
        "{}",
        style("No files were deleted. Review carefully before taking action.").dim()
    ))
    .ok();
}

fn print_pretty_similar(term: &Term, report: &SimilarReport) {
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();
    term.write_line(&format!(
        "  {} images hashed in {:.1}s",
        style(report.images_hashed).cyan(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} candidate pairs, {} verified",
        style(report.candidates).cyan(),
        style(report.verified).cyan()
    ))
    .ok();
    if report.cancelled {
        term.write_line(&format!("  {}", style("Cancelled; results are partial").yellow()))
            .ok();
    }
    print_root_errors(term, &report.root_errors);
    term.write_line("").ok();

    if report.groups.is_empty() {
        term.write_line("  No similar images found.").ok();
        return;
    }

    for group in &report.groups {
        term.write_line(&format!(
            "  {} {} ({} images, {})",
            style(format!("{}:", group.id)).bold(),
            style(format!("{:.1}% similar", group.similarity * 100.0)).yellow(),
            group.images.len(),
            format_bytes(group.total_size())
        ))
        .ok();
        print_files(term, &group.images);
        term.write_line("").ok();
    }
}

fn print_files(term: &Term, files: &[FileRecord]) {
    for file in files {
        term.write_line(&format!("    {} {}", style("○").dim(), display_path(&file.path)))
            .ok();
    }
}

fn print_root_errors(term: &Term, errors: &[String]) {
    for error in errors {
        term.write_line(&format!("  {} {}", style("!").red(), error)).ok();
    }
}

/// Shorten paths under the home directory to `~/...`
fn display_path(path: &Path) -> String {
    dirs::home_dir()
        .and_then(|home| path.strip_prefix(home).ok().map(|rest| rest.to_path_buf()))
        .map(|rest| format!("~/{}", rest.display()))
        .unwrap_or_else(|| path.display().to_string())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
