mod logging;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use nametwister_core::{
    app_paths, load_config, AppConfig, CommitReport, EntryCollection, ExpressionHistory, FileHistoryStore,
    HistoryStore, OutcomeStatus, PlanStats, RenameRule,
};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "nametwister-cli")]
#[command(about = "Bulk-rename files with a regular expression and a replacement template")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Rename(RenameArgs),
    History(HistoryArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
}

#[derive(Debug, Args)]
struct HistoryArgs {
    #[command(subcommand)]
    action: HistoryAction,
}

#[derive(Debug, Subcommand)]
enum HistoryAction {
    Show {
        #[arg(long, value_enum, default_value_t = HistoryKind::Source)]
        kind: HistoryKind,
    },
    Forget {
        #[arg(long, value_enum)]
        kind: HistoryKind,
        text: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HistoryKind {
    Source,
    Target,
}

#[derive(Debug, Args)]
struct RenameArgs {
    /// Files or directories; directories are expanded recursively
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    #[arg(long)]
    pattern: String,
    #[arg(long, default_value = "")]
    template: String,
    #[arg(long, overrides_with = "no_case_sensitive")]
    case_sensitive: bool,
    #[arg(long, overrides_with = "case_sensitive")]
    no_case_sensitive: bool,
    #[arg(long, overrides_with = "no_replace_all")]
    replace_all: bool,
    #[arg(long, overrides_with = "replace_all")]
    no_replace_all: bool,
    /// Replace the first run of `#` with a zero-padded counter
    #[arg(long, overrides_with = "no_sequence")]
    sequence: bool,
    #[arg(long, overrides_with = "sequence")]
    no_sequence: bool,
    #[arg(long, allow_negative_numbers = true)]
    sequence_start: Option<i64>,
    #[arg(long, default_value_t = false)]
    apply: bool,
    /// Save the pattern and template to the expression history
    #[arg(long, default_value_t = false)]
    remember: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Rename(args) => cmd_rename(args),
        Commands::History(history) => match history.action {
            HistoryAction::Show { kind } => cmd_history_show(kind),
            HistoryAction::Forget { kind, text } => cmd_history_forget(kind, &text),
        },
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// A `--flag`/`--no-flag` pair; whichever came last wins, neither keeps the config value.
fn flag(on: bool, off: bool, default: bool) -> bool {
    if on {
        true
    } else if off {
        false
    } else {
        default
    }
}

fn build_rule(args: &RenameArgs, config: &AppConfig) -> RenameRule {
    RenameRule {
        case_sensitive: flag(args.case_sensitive, args.no_case_sensitive, config.case_sensitive),
        replace_all: flag(args.replace_all, args.no_replace_all, config.replace_all),
        sequenced: flag(args.sequence, args.no_sequence, config.sequenced),
        sequence_start: args.sequence_start.unwrap_or(config.sequence_start),
        ..config.rule(args.pattern.as_str(), args.template.as_str())
    }
}

fn cmd_rename(args: RenameArgs) -> Result<()> {
    let config = load_config()?;
    let rule = build_rule(&args, &config);
    tracing::debug!(?rule, "rename rule");

    let mut collection = EntryCollection::new();
    let added = collection.add_paths(&args.paths);
    for err in &added.errors {
        eprintln!("skipped: {err}");
    }

    let stats = collection.replan(&rule)?;
    print_plan(&collection, &stats, args.output)?;

    if args.remember {
        remember_rule(&rule)?;
    }

    if !args.apply {
        eprintln!("dry run: no files were changed. Pass --apply to rename.");
        return Ok(());
    }

    let report = collection.commit();
    print_report(&report, args.output)?;
    collection.replan(&rule)?;

    if report.failed > 0 {
        anyhow::bail!("{} of {} renames failed", report.failed, report.outcomes.len());
    }
    Ok(())
}

fn remember_rule(rule: &RenameRule) -> Result<()> {
    let mut store = history_store()?;
    let mut sources = ExpressionHistory::load_sources(&store)?;
    sources.remember(&mut store, &rule.source_pattern)?;
    let mut targets = ExpressionHistory::load_targets(&store)?;
    targets.remember(&mut store, &rule.target_template)?;
    Ok(())
}

fn history_store() -> Result<FileHistoryStore> {
    Ok(FileHistoryStore::new(app_paths()?.history_dir))
}

fn load_history(store: &dyn HistoryStore, kind: HistoryKind) -> Result<ExpressionHistory> {
    match kind {
        HistoryKind::Source => ExpressionHistory::load_sources(store),
        HistoryKind::Target => ExpressionHistory::load_targets(store),
    }
}

fn cmd_history_show(kind: HistoryKind) -> Result<()> {
    let store = history_store()?;
    let history = load_history(&store, kind)?;
    println!("history ({}): {}", history.tag(), store.dir().display());
    for entry in history.entries() {
        println!("{entry}");
    }
    Ok(())
}

fn cmd_history_forget(kind: HistoryKind, text: &str) -> Result<()> {
    let mut store = history_store()?;
    let mut history = load_history(&store, kind)?;
    if history.forget(&mut store, text)? {
        println!("removed: {text}");
    } else {
        println!("not in history: {text}");
    }
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("config file: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn print_plan(collection: &EntryCollection, stats: &PlanStats, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "entries": collection.entries(),
                "stats": stats,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&body).context("could not serialize plan")?
            );
        }
        OutputFormat::Table => {
            println!("source -> target");
            for entry in collection.iter() {
                let mark = if entry.is_conflict() {
                    " [conflict]"
                } else if entry.is_same_name() {
                    " [unchanged]"
                } else {
                    ""
                };
                println!(
                    "{} -> {}{}",
                    entry.source_path().display(),
                    entry.target_name(),
                    mark
                );
            }
            println!(
                "\nplan: renames={} unchanged={} conflicts={}",
                stats.renames, stats.unchanged, stats.conflicts
            );
        }
    }
    Ok(())
}

fn print_report(report: &CommitReport, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(report).context("could not serialize report")?
            );
        }
        OutputFormat::Table => {
            for outcome in report.failures() {
                if let OutcomeStatus::Failed { reason } = &outcome.status {
                    eprintln!("failed: {reason}");
                }
            }
            eprintln!(
                "applied: renamed={} conflicts={} unchanged={} failed={}",
                report.renamed, report.skipped_conflict, report.skipped_unchanged, report.failed
            );
        }
    }
    Ok(())
}
