use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use colored::Colorize;
use serde::Serialize;
use telefs_sdk::{
    Capabilities, CatalogVersion, ObjectHandle, OpContext, TeleFs, TelefsConfig, TelegramStack,
};
use tokio::io::AsyncReadExt;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let fs = TeleFs::connect(&config)?;
    let ctx = operation_context(cli.timeout);

    match cli.command {
        Command::Put(args) => cmd_put(&fs, &ctx, args, cli.format).await,
        Command::Ls(args) => cmd_ls(&fs, &ctx, args, cli.format).await,
        Command::Info(_) => cmd_info(&fs, &ctx, &config, cli.format).await,
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<TelefsConfig> {
    let mut config = match path {
        Some(path) => TelefsConfig::load(path)?,
        None => TelefsConfig::default(),
    };
    config.apply_env();
    Ok(config)
}

/// A context that Ctrl-C cancels, with an optional deadline.
fn operation_context(timeout: Option<u64>) -> OpContext {
    let ctx = match timeout {
        Some(secs) => OpContext::with_timeout(Duration::from_secs(secs)),
        None => OpContext::new(),
    };
    let on_interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });
    ctx
}

async fn cmd_put(
    fs: &TeleFs<TelegramStack>,
    ctx: &OpContext,
    args: PutArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let from_stdin = args.path.as_os_str() == "-";
    let name = match (&args.name, from_stdin) {
        (Some(name), _) => name.clone(),
        (None, true) => bail!("--name is required when reading from stdin"),
        (None, false) => args
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("cannot derive an object name from {}", args.path.display()))?,
    };

    let data = if from_stdin {
        let mut buf = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buf)
            .await
            .context("reading stdin")?;
        buf
    } else {
        tokio::fs::read(&args.path)
            .await
            .with_context(|| format!("reading {}", args.path.display()))?
    };

    let handle = fs.put(ctx, &name, &data).await?;
    match format {
        OutputFormat::Json => print_json(&handle)?,
        OutputFormat::Text => print_stored(&handle),
    }
    Ok(())
}

fn print_stored(handle: &ObjectHandle) {
    let size = handle.size.map(|s| format!("{s} bytes")).unwrap_or_default();
    println!("{} Stored {} {}", "✓".green().bold(), handle.name.bold(), size.dimmed());
    if let Some(id) = handle.message_id {
        println!("  Message: {}", id.to_string().yellow());
    }
}

async fn cmd_ls(
    fs: &TeleFs<TelegramStack>,
    ctx: &OpContext,
    args: LsArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let records = fs.list(ctx, &args.prefix).await?;
    match format {
        OutputFormat::Json => print_json(&records)?,
        OutputFormat::Text => {
            if records.is_empty() {
                println!("{}", "No objects.".dimmed());
            }
            for record in &records {
                println!("{record}");
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct InfoReport<'a> {
    chat_id: &'a str,
    api_base: &'a str,
    catalog_version: Option<CatalogVersion>,
    entries: usize,
    lookback_window: usize,
    window_exhausted: bool,
    capabilities: Capabilities,
}

async fn cmd_info(
    fs: &TeleFs<TelegramStack>,
    ctx: &OpContext,
    config: &TelefsConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let loaded = fs.catalog(ctx).await?;
    let report = InfoReport {
        chat_id: &config.chat_id,
        api_base: &config.api_base,
        catalog_version: loaded.version,
        entries: loaded.catalog.len(),
        lookback_window: config.catalog.lookback_window,
        window_exhausted: loaded.window_exhausted,
        capabilities: fs.capabilities(),
    };

    if format == OutputFormat::Json {
        return print_json(&report);
    }

    println!("Chat: {}", report.chat_id.bold());
    match &report.catalog_version {
        Some(version) => println!("Catalog: {} ({} entries)", version.to_string().yellow(), report.entries),
        None => println!("Catalog: {}", "none yet".dimmed()),
    }
    if report.window_exhausted {
        println!(
            "  {} no catalog in the last {} messages; an older one may exist",
            "!".red().bold(),
            report.lookback_window
        );
    }
    let caps = &report.capabilities;
    println!("Capabilities:");
    println!("  put            {}", mark(caps.put));
    println!("  list           {}", mark(caps.list));
    println!("  random access  {}", mark(caps.random_access));
    println!("  hashes         {}", mark(!caps.hashes.is_empty()));
    Ok(())
}

fn mark(supported: bool) -> colored::ColoredString {
    if supported { "✓".green() } else { "✗".red() }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
