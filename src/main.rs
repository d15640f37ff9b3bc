use std::collections::HashSet;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use strata_analytics::correlation::{correlate_defects, loc_complexity_correlation, DefectCorrelation};
use strata_analytics::coupling::{coupling_records, test_code_coupling, CouplingRecord};
use strata_analytics::hotspots::{detect_hotspots, HotspotReport};
use strata_analytics::metrics::collect_metrics;
use strata_core::{FileKey, OutputFormat, StrataConfig};
use strata_history::classify::{top_files, DefectClassifier};
use strata_history::cochange::CoChangeCounts;
use strata_history::mining::{mine_history, CommitInfo, MiningOptions};
use strata_trace::mirror::{mirror_test_path, module_name};
use strata_trace::resolver::{resolve_test_file, ImportIndex};

#[derive(Parser)]
#[command(
    name = "strata",
    version,
    about = "Repository evolution analysis",
    long_about = "Strata mines git history and the working tree to answer questions\n\
                   the code alone cannot: where defects cluster, which files secretly\n\
                   change together, which modules are complexity hotspots, and which\n\
                   test covers a given source file.\n\n\
                   Examples:\n  \
                     strata defects --path .             Defect commits over time\n  \
                     strata coupling --tests-only        Test/code logical coupling\n  \
                     strata hotspots --defects           Hotspots with defect correlation\n  \
                     strata trace src/pkg/mod.py         Find the covering test file"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .strata.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text  Human-readable tables and summaries (default)\n  \
                         json  Machine-readable JSON with camelCase keys"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Classify defect commits and chart them over time
    #[command(long_about = "Classify defect commits and chart them over time.\n\n\
        A commit is defect-related when its message contains a configured keyword\n\
        as a whole word, case-insensitively. Reports the monthly histogram, the\n\
        per-file defect touch counts, and a restricted histogram for the most\n\
        defect-prone files.\n\n\
        Examples:\n  strata defects --path .\n  strata defects --since 180 --top 5")]
    Defects {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Time range in days (default: all history)
        #[arg(long)]
        since: Option<u64>,

        /// Branch to walk (default: HEAD)
        #[arg(long)]
        branch: Option<String>,

        /// Number of most-touched files to report (default: 2)
        #[arg(long, default_value = "2")]
        top: usize,
    },
    /// Detect logical coupling between files that change together
    #[command(long_about = "Detect logical coupling between files that change together.\n\n\
        Aggregates co-change counts over the commit history and scores each pair\n\
        by commits-together relative to its rarer member, so the score lies in\n\
        (0, 1]. Pairs below the minimum co-change count are dropped as noise.\n\n\
        Examples:\n  strata coupling --path .\n  strata coupling --tests-only --min-pair 3")]
    Coupling {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Time range in days (default: all history)
        #[arg(long)]
        since: Option<u64>,

        /// Branch to walk (default: HEAD)
        #[arg(long)]
        branch: Option<String>,

        /// Minimum co-change count for a pair (overrides config)
        #[arg(long)]
        min_pair: Option<u32>,

        /// Keep only pairs of one test file and one source file
        #[arg(long)]
        tests_only: bool,

        /// Skip commits touching more files than this
        #[arg(long)]
        max_files: Option<usize>,

        /// Maximum results to show (default: 20)
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Detect size and complexity hotspots in the working tree
    #[command(long_about = "Detect size and complexity hotspots in the working tree.\n\n\
        Computes LOC and cyclomatic complexity per source file, thresholds both\n\
        at the configured percentile, and flags files at or above either\n\
        threshold. With --defects, also mines history and correlates the metrics\n\
        against per-file defect counts.\n\n\
        Examples:\n  strata hotspots --path .\n  strata hotspots --percentile 0.95 --defects")]
    Hotspots {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Percentile for hotspot thresholds (overrides config)
        #[arg(long)]
        percentile: Option<f64>,

        /// Correlate metrics against defect counts mined from history
        #[arg(long)]
        defects: bool,

        /// Time range in days for --defects (default: all history)
        #[arg(long)]
        since: Option<u64>,

        /// Branch to walk for --defects (default: HEAD)
        #[arg(long)]
        branch: Option<String>,
    },
    /// Resolve the test file covering a source file
    #[command(long_about = "Resolve the test file covering a source file.\n\n\
        Computes the dotted module name from the layout convention, indexes the\n\
        imports of every test file, and reports the best-matching test along\n\
        with the conventional mirror path.\n\n\
        Examples:\n  strata trace src/pkg/mod.py\n  strata trace src/app.py --path /my/repo")]
    Trace {
        /// Source file path, relative to the repository root
        source: String,

        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DefectReport {
    commits_analyzed: usize,
    defect_commits: usize,
    defects_per_month: std::collections::BTreeMap<String, u32>,
    top_files: Vec<FileEntry>,
    top_files_per_month: std::collections::BTreeMap<String, u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileEntry {
    file: FileKey,
    defect_touches: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HotspotOutput {
    #[serde(flatten)]
    report: HotspotReport,
    loc_complexity_correlation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    defect_correlation: Option<DefectCorrelation>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TraceReport {
    source: FileKey,
    module: String,
    mirror: FileKey,
    resolved: Option<FileKey>,
    candidates: Vec<FileKey>,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => StrataConfig::from_file(path).into_diagnostic()?,
        None => {
            let default_path = Path::new(".strata.toml");
            if default_path.exists() {
                StrataConfig::from_file(default_path).into_diagnostic()?
            } else {
                StrataConfig::default()
            }
        }
    };

    if cli.verbose {
        eprintln!("format: {}", cli.format);
        eprintln!(
            "defect keywords: {}",
            config.history.defect_keywords.join(", ")
        );
    }

    match cli.command {
        Command::Defects {
            ref path,
            since,
            ref branch,
            top,
        } => {
            let commits = mine(path, since, branch.clone(), None, cli.verbose)?;
            run_defects(&commits, &config, cli.format, top)?;
        }
        Command::Coupling {
            ref path,
            since,
            ref branch,
            min_pair,
            tests_only,
            max_files,
            limit,
        } => {
            let commits = mine(path, since, branch.clone(), max_files, cli.verbose)?;
            run_coupling(&commits, &config, cli.format, min_pair, tests_only, limit)?;
        }
        Command::Hotspots {
            ref path,
            percentile,
            defects,
            since,
            ref branch,
        } => {
            run_hotspots(
                path,
                &config,
                cli.format,
                percentile,
                defects,
                since,
                branch.clone(),
                cli.verbose,
            )?;
        }
        Command::Trace { ref source, ref path } => {
            run_trace(source, path, &config, cli.format)?;
        }
    }

    Ok(())
}

/// Mine history with the not-a-git-repo hint applied.
fn mine(
    path: &Path,
    since_days: Option<u64>,
    branch: Option<String>,
    max_files: Option<usize>,
    verbose: bool,
) -> Result<Vec<CommitInfo>> {
    if !path.join(".git").exists() && git2::Repository::discover(path).is_err() {
        miette::bail!(miette::miette!(
            help = "Run strata from inside a git repository, or specify --path to one",
            "Not a git repository: {}",
            path.display()
        ));
    }

    let options = MiningOptions {
        since: since_days.map(|days| chrono::Utc::now().timestamp() - days as i64 * 86_400),
        branch,
        max_files_per_commit: max_files,
    };

    let commits = mine_history(path, &options).into_diagnostic()?;
    if verbose {
        eprintln!("Analyzed {} commits at {}.", commits.len(), path.display());
    }
    Ok(commits)
}

fn run_defects(
    commits: &[CommitInfo],
    config: &StrataConfig,
    format: OutputFormat,
    top: usize,
) -> Result<()> {
    let classifier = DefectClassifier::new(&config.history.defect_keywords).into_diagnostic()?;

    let per_month = classifier.defects_per_month(commits);
    let per_file =
        classifier.defect_touches_per_file(commits, &config.history.source_extension);
    let top_keys = top_files(&per_file, top);
    let top_set: HashSet<FileKey> = top_keys.iter().cloned().collect();
    let restricted = classifier.defects_per_month_for_files(commits, &top_set);

    let report = DefectReport {
        commits_analyzed: commits.len(),
        defect_commits: commits
            .iter()
            .filter(|c| classifier.is_defect(&c.message))
            .count(),
        defects_per_month: per_month,
        top_files: top_keys
            .into_iter()
            .map(|file| {
                let defect_touches = per_file.get(&file).copied().unwrap_or(0);
                FileEntry {
                    file,
                    defect_touches,
                }
            })
            .collect(),
        top_files_per_month: restricted,
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).into_diagnostic()?
            );
        }
        OutputFormat::Text => {
            println!(
                "Defect commits: {} of {}",
                report.defect_commits, report.commits_analyzed
            );
            println!("\nDefects per month:");
            for (month, count) in &report.defects_per_month {
                println!("  {month}  {count}");
            }
            println!("\nMost defect-prone files:");
            for entry in &report.top_files {
                println!("  {:<50} {}", entry.file, entry.defect_touches);
            }
            if !report.top_files_per_month.is_empty() {
                println!("\nDefect touches per month (top files only):");
                for (month, count) in &report.top_files_per_month {
                    println!("  {month}  {count}");
                }
            }
        }
    }

    Ok(())
}

fn run_coupling(
    commits: &[CommitInfo],
    config: &StrataConfig,
    format: OutputFormat,
    min_pair: Option<u32>,
    tests_only: bool,
    limit: usize,
) -> Result<()> {
    let extension = config.history.source_extension.clone();
    let mut counts = CoChangeCounts::new();
    for commit in commits {
        counts.ingest(commit, |key| key.has_extension(&extension));
    }

    let min_pair = min_pair.unwrap_or(config.analytics.min_pair_commits);
    let mut records = coupling_records(&counts, min_pair);
    if tests_only {
        records = test_code_coupling(&records, &config.layout.test_prefix);
    }
    let records: Vec<CouplingRecord> = records.into_iter().take(limit).collect();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&records).into_diagnostic()?
            );
        }
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No coupled pairs at min co-change count {min_pair}.");
            } else {
                println!("Logical coupling (min co-changes: {min_pair}):");
                println!("{:-<72}", "");
                for r in &records {
                    println!(
                        "  {} <-> {} (score={:.2}, together={}, a={}, b={})",
                        r.file_a, r.file_b, r.score, r.commits_together, r.commits_a, r.commits_b,
                    );
                }
            }
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_hotspots(
    path: &Path,
    config: &StrataConfig,
    format: OutputFormat,
    percentile: Option<f64>,
    defects: bool,
    since: Option<u64>,
    branch: Option<String>,
    verbose: bool,
) -> Result<()> {
    let quantile = percentile.unwrap_or(config.analytics.hotspot_percentile);
    if !(0.0..=1.0).contains(&quantile) {
        miette::bail!("percentile must be in [0, 1], got {quantile}");
    }

    let collected = collect_metrics(
        path,
        &config.history.source_extension,
        &config.analytics.excluded_dirs,
    )
    .into_diagnostic()?;
    for warning in &collected.warnings {
        eprintln!("warning: {warning}");
    }
    if verbose {
        eprintln!("Measured {} files.", collected.files.len());
    }

    let report = detect_hotspots(&collected.files, quantile);
    let correlation = loc_complexity_correlation(&collected.files);

    let defect_correlation = if defects {
        let commits = mine(path, since, branch, None, verbose)?;
        let classifier =
            DefectClassifier::new(&config.history.defect_keywords).into_diagnostic()?;
        let counts =
            classifier.defect_touches_per_file(&commits, &config.history.source_extension);
        Some(correlate_defects(&collected.files, &counts, quantile))
    } else {
        None
    };

    let output = HotspotOutput {
        report,
        loc_complexity_correlation: correlation,
        defect_correlation,
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&output).into_diagnostic()?
            );
        }
        OutputFormat::Text => {
            match (
                output.report.complexity_threshold,
                output.report.loc_threshold,
            ) {
                (Some(cc), Some(loc)) => {
                    println!(
                        "Thresholds at p{:.0}: complexity >= {cc:.1}, loc >= {loc:.1}",
                        quantile * 100.0
                    );
                }
                _ => println!("No measurable files."),
            }
            if output.report.hotspots.is_empty() {
                println!("No hotspots.");
            } else {
                println!("\nHotspots:");
                for m in &output.report.hotspots {
                    println!("  {:<50} cc={:<5} loc={}", m.file, m.complexity, m.loc);
                }
            }
            match output.loc_complexity_correlation {
                Some(r) => println!("\nLOC/complexity correlation: {r:.3}"),
                None => println!("\nLOC/complexity correlation: undefined"),
            }
            if let Some(dc) = &output.defect_correlation {
                println!("Defect correlation:");
                println!(
                    "  complexity vs defects: {}",
                    fmt_opt(dc.complexity_defects)
                );
                println!("  loc vs defects:        {}", fmt_opt(dc.loc_defects));
                println!(
                    "  mean defects, top complexity decile: {}",
                    fmt_opt(dc.mean_defects_top_decile)
                );
                println!(
                    "  mean defects, rest:                  {}",
                    fmt_opt(dc.mean_defects_rest)
                );
            }
        }
    }

    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.3}"),
        None => "undefined".into(),
    }
}

fn run_trace(
    source: &str,
    path: &Path,
    config: &StrataConfig,
    format: OutputFormat,
) -> Result<()> {
    let src = FileKey::new(source);

    let module = match module_name(&src, &config.layout) {
        Ok(module) => module,
        Err(e) => {
            miette::bail!(miette::miette!(
                help = "Pass a path under the configured source root, e.g. src/pkg/mod.py",
                "{e}"
            ));
        }
    };
    let mirror = mirror_test_path(&src, &config.layout).into_diagnostic()?;

    let index =
        ImportIndex::build_from_dir(path, &config.layout.test_root).into_diagnostic()?;
    for warning in &index.warnings {
        eprintln!("warning: {warning}");
    }

    let candidates = index.lookup(&module);
    let resolved = resolve_test_file(&src, &index, &config.layout).into_diagnostic()?;

    let report = TraceReport {
        source: src,
        module,
        mirror,
        resolved,
        candidates,
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).into_diagnostic()?
            );
        }
        OutputFormat::Text => {
            println!("Source:  {}", report.source);
            println!("Module:  {}", report.module);
            println!("Mirror:  {}", report.mirror);
            match &report.resolved {
                Some(test) => println!("Test:    {test}"),
                None => println!("Test:    (no test imports this module)"),
            }
            if report.candidates.len() > 1 {
                println!("Other candidates:");
                for candidate in report.candidates.iter().skip(1) {
                    println!("  {candidate}");
                }
            }
        }
    }

    Ok(())
}
