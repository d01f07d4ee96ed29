use std::path::Path;
use std::sync::Arc;

use abook_registry::{ConsistencyReport, RegistryStats};
use abook_server::{AbookServer, ServerConfig};
use abook_service::AddressbookService;
use abook_snapshot::{JsonFileSnapshot, SnapshotConfig};
use abook_types::Principal;
use anyhow::Context;
use colored::Colorize;
use serde_json::{json, Value};

use crate::cli::*;

const CLI_PRINCIPAL: &str = "abook-cli";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Verify(args) => cmd_verify(&args, cli.format),
        Command::Stats(args) => cmd_stats(&args, cli.format),
        Command::Clear(args) => cmd_clear(&args, cli.format),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if args.transient {
        config.persistent = false;
    }

    let bind = config.bind_addr;
    let data_dir = config.data_dir.clone();
    let server = AbookServer::open(config)
        .with_context(|| format!("could not open data directory {}", data_dir.display()))?;
    println!(
        "{} abook server on {} (data: {})",
        "✓".green().bold(),
        bind.to_string().bold(),
        data_dir.display()
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

/// Load a data directory without ever writing to it.
fn open_readonly(dir: &Path) -> anyhow::Result<AddressbookService> {
    let snapshot = Arc::new(JsonFileSnapshot::new(SnapshotConfig::in_dir(dir).transient()));
    AddressbookService::open(snapshot, &Principal::new(CLI_PRINCIPAL))
        .with_context(|| format!("could not load {}", dir.display()))
}

fn cmd_verify(args: &DataArgs, format: OutputFormat) -> anyhow::Result<()> {
    let service = open_readonly(&args.data_dir)?;
    let report = service.verify()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report_json(&report))?),
        OutputFormat::Text => print_report(&report),
    }
    if !report.is_consistent() {
        anyhow::bail!("{} invariant violation(s)", report.violations.len());
    }
    Ok(())
}

fn cmd_stats(args: &DataArgs, format: OutputFormat) -> anyhow::Result<()> {
    let service = open_readonly(&args.data_dir)?;
    let stats = service.stats()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats_json(&stats))?),
        OutputFormat::Text => {
            println!("Addressbooks: {}", stats.addressbooks.to_string().bold());
            println!("Contacts:     {}", stats.contacts.to_string().bold());
            println!("Orgs:         {}", stats.orgs.to_string().bold());
            println!("Addresses:    {}", stats.addresses.to_string().bold());
        }
    }
    Ok(())
}

fn cmd_clear(args: &ClearArgs, format: OutputFormat) -> anyhow::Result<()> {
    if !args.yes {
        anyhow::bail!("refusing to clear {} without --yes", args.data.data_dir.display());
    }
    let dir = &args.data.data_dir;
    let snapshot = Arc::new(JsonFileSnapshot::new(SnapshotConfig::in_dir(dir)));
    let principal = Principal::new(CLI_PRINCIPAL);
    let service = AddressbookService::open(snapshot, &principal)
        .with_context(|| format!("could not load {}", dir.display()))?;
    let removed = service.delete_all(&principal)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats_json(&removed))?),
        OutputFormat::Text => println!(
            "{} Cleared {} addressbooks, {} contacts, {} orgs, {} addresses",
            "✓".green().bold(),
            removed.addressbooks.saturating_sub(1),
            removed.contacts,
            removed.orgs,
            removed.addresses
        ),
    }
    Ok(())
}

fn print_report(report: &ConsistencyReport) {
    if report.is_consistent() {
        println!("{} Registry consistent", "✓".green().bold());
    } else {
        println!(
            "{} {} violation(s)",
            "✗".red().bold(),
            report.violations.len()
        );
        for violation in &report.violations {
            println!(
                "  {} {}",
                format!("{:?}", violation.kind).yellow(),
                violation.description
            );
        }
    }
    println!(
        "  {} addressbooks, {} contacts, {} orgs, {} addresses",
        report.stats.addressbooks, report.stats.contacts, report.stats.orgs, report.stats.addresses
    );
}

fn stats_json(stats: &RegistryStats) -> Value {
    json!({
        "addressbooks": stats.addressbooks,
        "contacts": stats.contacts,
        "orgs": stats.orgs,
        "addresses": stats.addresses,
    })
}

fn report_json(report: &ConsistencyReport) -> Value {
    let violations: Vec<Value> = report
        .violations
        .iter()
        .map(|v| json!({ "kind": format!("{:?}", v.kind), "description": v.description }))
        .collect();
    json!({
        "consistent": report.is_consistent(),
        "stats": stats_json(&report.stats),
        "violations": violations,
    })
}
