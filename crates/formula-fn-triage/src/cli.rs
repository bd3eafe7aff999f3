//! Command-line surface for the `fn_triage` binary.
//!
//! Lives in the library crate so the binary stays a thin wrapper and tests
//! can drive `run_with_args` directly.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::fixtures::{self, FixtureScanOptions, ScanWarning};
use crate::known::{self, KnownFailure, KnownFailureCatalog, VOLATILE_FUNCTIONS};
use crate::mutate::{self, StripOptions};
use crate::reconcile;
use crate::registry::{self, RegistryScanOptions};
use crate::report::{self, ReportContext};

#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(about = "Audit spreadsheet function coverage: engine registry vs fixture corpus.")]
pub struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile the known-failure catalog against the engine registry and
    /// the fixture corpus.
    Report(ReportArgs),
    /// Remove `expectedValues` assertions for functions without a registered
    /// implementation.
    StripExpected(StripArgs),
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Engine source file containing the function registration list.
    #[arg(long)]
    registry: PathBuf,

    /// Directory of fixture files.
    #[arg(long)]
    fixtures: PathBuf,

    /// Marker introducing the registration collection literal.
    #[arg(long, default_value = registry::DEFAULT_MARKER)]
    marker: String,

    /// Identifier tokens to ignore inside the registration list (repeatable;
    /// extends the built-in stoplist).
    #[arg(long = "stop-word")]
    stop_words: Vec<String>,

    /// Fixture file extensions to scan (repeatable; default: ts, tsx).
    #[arg(long = "ext")]
    extensions: Vec<String>,

    /// Glob patterns restricting which fixture files are scanned
    /// (repeatable; matched relative to the fixture directory).
    #[arg(long = "include")]
    include: Vec<String>,
}

#[derive(clap::Args)]
struct ReportArgs {
    #[command(flatten)]
    sources: SourceArgs,

    /// JSON file overriding the built-in known-failure catalog.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Entries in the top-failures ranking.
    #[arg(long, default_value_t = reconcile::DEFAULT_TOP_FAILURES)]
    top: usize,
}

#[derive(clap::Args)]
struct StripArgs {
    #[command(flatten)]
    sources: SourceArgs,

    /// Strip exactly these function names instead of the computed
    /// unimplemented-but-tested set (repeatable).
    #[arg(long = "function")]
    functions: Vec<String>,

    /// Also strip volatile functions (RAND, RANDBETWEEN, TODAY, NOW,
    /// RANDARRAY); their pinned values can never be stable.
    #[arg(long)]
    include_volatile: bool,

    /// Report what would change without rewriting any file.
    #[arg(long)]
    dry_run: bool,

    /// Exit non-zero if any file would change (implies --dry-run).
    #[arg(long)]
    check: bool,
}

pub fn run() -> Result<()> {
    run_with_args(Args::parse())
}

pub fn run_with_args(args: Args) -> Result<()> {
    match args.command {
        Command::Report(args) => run_report(args),
        Command::StripExpected(args) => run_strip(args),
    }
}

fn scan_options(sources: &SourceArgs) -> (RegistryScanOptions, FixtureScanOptions) {
    let mut registry_options = RegistryScanOptions {
        marker: sources.marker.clone(),
        ..RegistryScanOptions::default()
    };
    // The marker itself is structural, never a function name.
    registry_options.stoplist.insert(sources.marker.clone());
    registry_options
        .stoplist
        .extend(sources.stop_words.iter().cloned());

    let mut fixture_options = FixtureScanOptions::default();
    if !sources.extensions.is_empty() {
        fixture_options.extensions = sources.extensions.clone();
    }
    fixture_options.include = sources.include.clone();

    (registry_options, fixture_options)
}

fn load_registry(sources: &SourceArgs, options: &RegistryScanOptions) -> Result<BTreeSet<String>> {
    let text = fs::read_to_string(&sources.registry)
        .with_context(|| format!("read registry source {}", sources.registry.display()))?;
    let implemented = registry::scan_registry(&text, options)
        .with_context(|| format!("scan registry source {}", sources.registry.display()))?;
    Ok(implemented)
}

fn load_catalog(path: Option<&Path>) -> Result<Vec<KnownFailure>> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("read catalog {}", path.display()))?;
            let catalog: KnownFailureCatalog = serde_json::from_str(&raw)
                .with_context(|| format!("parse catalog {}", path.display()))?;
            Ok(catalog.functions)
        }
        None => Ok(known::known_failures()),
    }
}

fn print_warnings(warnings: &[ScanWarning]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
}

fn run_report(args: ReportArgs) -> Result<()> {
    let (registry_options, fixture_options) = scan_options(&args.sources);
    let implemented = load_registry(&args.sources, &registry_options)?;
    let scan = fixtures::scan_fixture_dir(&args.sources.fixtures, &fixture_options)?;
    print_warnings(&scan.warnings);

    let catalog = load_catalog(args.catalog.as_deref())?;
    let report = reconcile::reconcile(&catalog, &implemented, &scan.entries, args.top);

    let volatile_pinned: Vec<String> = VOLATILE_FUNCTIONS
        .iter()
        .filter(|name| implemented.contains(**name))
        .filter(|name| {
            scan.entries
                .get(**name)
                .is_some_and(|entry| entry.expected_values)
        })
        .map(|name| name.to_string())
        .collect();

    let ctx = ReportContext {
        registry: &args.sources.registry,
        fixtures: &args.sources.fixtures,
        files_scanned: scan.files_scanned,
        registered_total: implemented.len(),
        known_total: catalog.len(),
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Text => report::render_text(&ctx, &report, &volatile_pinned, &mut out)?,
        OutputFormat::Json => {
            let json = report::json_report(&ctx, &report, &volatile_pinned);
            serde_json::to_writer_pretty(&mut out, &json)?;
            writeln!(out)?;
        }
    }

    Ok(())
}

fn run_strip(args: StripArgs) -> Result<()> {
    let (registry_options, fixture_options) = scan_options(&args.sources);
    let dry_run = args.dry_run || args.check;

    let mut targets: BTreeSet<String> = if args.functions.is_empty() {
        let implemented = load_registry(&args.sources, &registry_options)?;
        let scan = fixtures::scan_fixture_dir(&args.sources.fixtures, &fixture_options)?;
        print_warnings(&scan.warnings);
        scan.entries
            .iter()
            .filter(|(name, entry)| entry.expected_values && !implemented.contains(*name))
            .map(|(name, _)| name.clone())
            .collect()
    } else {
        args.functions.iter().cloned().collect()
    };
    if args.include_volatile {
        targets.extend(VOLATILE_FUNCTIONS.iter().map(|s| s.to_string()));
    }

    let options = StripOptions {
        scan: fixture_options,
        dry_run,
    };
    let outcome = mutate::strip_expected_values(&args.sources.fixtures, &targets, &options)?;
    print_warnings(&outcome.warnings);

    for path in &outcome.modified_files {
        if dry_run {
            println!("Would modify: {}", path.display());
        } else {
            println!("Modified: {}", path.display());
        }
    }
    for path in &outcome.integrity_failures {
        eprintln!(
            "error: {}: removal length invariant violated; file left untouched",
            path.display()
        );
    }
    println!(
        "Total: {} expectedValues blocks in {} files",
        outcome.records_stripped,
        outcome.files_modified()
    );

    if !outcome.integrity_failures.is_empty() {
        std::process::exit(1);
    }
    if args.check && outcome.files_modified() > 0 {
        std::process::exit(1);
    }

    Ok(())
}
