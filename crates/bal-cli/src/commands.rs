use std::path::Path;

use anyhow::Context;
use bal_pipeline::{
    BalanceSummary, LocalTree, MirrorReport, Pipeline, PipelineConfig, RunSummary, ScanSummary,
};
use colored::Colorize;
use serde::Serialize;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Run(args) => cmd_run(args, format),
        Command::Mirror(args) => cmd_mirror(args, format),
        Command::Scan(args) => cmd_scan(args, format),
        Command::Balance(args) => cmd_balance(args, format),
    }
}

fn load_pipeline(config: &ConfigArg) -> anyhow::Result<Pipeline> {
    let loaded = PipelineConfig::load(&config.config)
        .with_context(|| format!("loading {}", config.config.display()))?;
    Ok(Pipeline::new(loaded))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_run(args: RunArgs, format: OutputFormat) -> anyhow::Result<()> {
    let pipeline = load_pipeline(&args.config)?;
    pipeline.config().validate()?;
    let mut tree = pipeline.connect()?;
    let summary = pipeline.run(&mut tree, &pipeline.config().remote.root)?;
    match format {
        OutputFormat::Json => print_json(&summary),
        OutputFormat::Text => {
            print_run(&summary);
            Ok(())
        }
    }
}

fn cmd_mirror(args: MirrorArgs, format: OutputFormat) -> anyhow::Result<()> {
    let pipeline = load_pipeline(&args.config)?;
    let report = match &args.source_dir {
        Some(dir) => {
            let root = dir.to_str().with_context(|| format!("{} is not valid UTF-8", dir.display()))?;
            pipeline.mirror(&mut LocalTree::new(), root)?
        }
        None => {
            let mut tree = pipeline.connect()?;
            pipeline.mirror(&mut tree, &pipeline.config().remote.root)?
        }
    };
    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            print_mirror(&report, &pipeline.config().mirror.destination);
            Ok(())
        }
    }
}

fn cmd_scan(args: ScanArgs, format: OutputFormat) -> anyhow::Result<()> {
    let pipeline = load_pipeline(&args.config)?;
    let (_, summary) = pipeline.scan_and_dump()?;
    match format {
        OutputFormat::Json => print_json(&summary),
        OutputFormat::Text => {
            print_scan(&summary);
            Ok(())
        }
    }
}

fn cmd_balance(args: BalanceArgs, format: OutputFormat) -> anyhow::Result<()> {
    let pipeline = load_pipeline(&args.config)?;
    let summary = pipeline.balance_from_dump(args.dump.as_deref())?;
    match format {
        OutputFormat::Json => print_json(&summary),
        OutputFormat::Text => {
            print_balance(&summary);
            Ok(())
        }
    }
}

fn print_run(summary: &RunSummary) {
    print_mirror(&summary.mirror, Path::new(""));
    print_scan(&summary.scan);
    print_balance(&summary.balance);
    println!("  Generated: {}", summary.generated_at.to_rfc3339().dimmed());
}

fn print_mirror(report: &MirrorReport, destination: &Path) {
    print!("{} Mirrored {} files in {} directories", "✓".green().bold(), report.files, report.directories);
    if destination.as_os_str().is_empty() {
        println!();
    } else {
        println!(" into {}", destination.display().to_string().bold());
    }
    println!("  Bytes: {}", report.bytes);
    if report.pruned > 0 {
        println!("  Pruned: {}", report.pruned.to_string().yellow());
    }
}

fn print_scan(summary: &ScanSummary) {
    println!(
        "{} Scanned {} records from {}",
        "✓".green().bold(),
        summary.records,
        summary.store.display().to_string().bold()
    );
    println!(
        "  Structured: {}  Text: {}  Opaque: {}",
        summary.tally.structured.to_string().green(),
        summary.tally.text,
        summary.tally.opaque.to_string().dimmed()
    );
    println!("  Dump: {}", summary.dump.display().to_string().cyan());
}

fn print_balance(summary: &BalanceSummary) {
    let sheet = &summary.sheet;
    println!("{} Balances for {} addresses", "✓".green().bold(), sheet.rows.len());
    for row in &sheet.rows {
        println!("  {:<20} {:<48} {:>20}", row.owner.bold(), row.address.as_str(), row.balance.to_string().yellow());
    }
    println!("  Total: {}", sheet.total.to_string().yellow().bold());
    if !sheet.skipped.is_empty() {
        println!("  {} {} malformed record(s) skipped", "!".red().bold(), sheet.skipped.len());
        for skipped in &sheet.skipped {
            println!("    {} {}", skipped.id.to_string().dimmed(), skipped.reason);
        }
    }
    println!("  Report: {}", summary.balance_json.display().to_string().cyan());
    if let Some(xlsx) = &summary.balance_xlsx {
        println!("  Spreadsheet: {}", xlsx.display().to_string().cyan());
    }
}
