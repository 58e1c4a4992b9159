mod config;
mod lyrics;
mod worker;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Parser)]
#[command(name = "lyricseek", version, about = "Find song lyrics from an \"Artist - Title\" label")]
struct Cli {
    /// Override config file path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only warnings and errors on stderr.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Look up lyrics for one "Artist - Title" label.
    Find {
        label: String,
        /// Print a JSON object instead of plain text.
        #[arg(long)]
        json: bool,
    },
    /// Look up one label per line (stdin when FILE is omitted or `-`).
    Batch { file: Option<PathBuf> },
    /// Show the normalized query and guessed direct URLs (no network).
    Urls { label: String },
    /// Inspect the config file.
    Config {
        #[command(subcommand)]
        cmd: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective config as TOML.
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else if cli.quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .with_level(true)
        .init();

    let cfg_path = match cli.config.clone() {
        Some(p) => p,
        None => config::default_config_path().context("default config path")?,
    };
    let cfg = config::load(Some(&cfg_path)).context("load config")?;

    match cli.command {
        Command::Find { label, json } => {
            let cancel = cancel_on_ctrl_c();
            let found = lyrics::find_lyrics(&label, &cfg.http_settings(), cfg.finder_config(), &cancel)
                .await
                .context("create http client")?;
            match found {
                Ok(found) if json => println!("{}", serde_json::to_string_pretty(&found)?),
                Ok(found) => println!("{}", found.text),
                Err(e) => {
                    eprintln!("{label}: {e}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Batch { file } => {
            let raw = read_labels(file.as_deref()).await?;
            let labels: Vec<String> = raw
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();

            let fetcher = lyrics::HttpFetcher::new(&cfg.http_settings()).context("create http client")?;
            let finder = lyrics::LyricsFinder::new(fetcher, cfg.finder_config());
            let pool = worker::LookupPool::new(finder, cfg.worker.max_concurrent);
            let cancel = cancel_on_ctrl_c();

            let mut failed = 0usize;
            for (i, outcome) in pool.run(labels, &cancel).await.into_iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("== {} ==", outcome.label);
                match outcome.result {
                    Ok(found) => {
                        println!("{}", found.url);
                        println!();
                        println!("{}", found.text);
                    }
                    Err(e) => {
                        failed += 1;
                        println!("({e})");
                    }
                }
            }
            if failed > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Urls { label } => {
            let query = lyrics::Query::parse(&label);
            let sources = cfg.finder_config().sources;
            println!("{}", query.label());
            for candidate in lyrics::urls::synthesize(&query, &sources) {
                println!("{:<20} {}", candidate.strategy.label(), candidate.url);
            }
            println!(
                "{:<20} {}",
                "search",
                lyrics::urls::search_url(&sources, &query.phrase())
            );
        }
        Command::Config { cmd } => match cmd {
            ConfigCommand::Path => println!("{}", cfg_path.display()),
            ConfigCommand::Show => {
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}

/// Token that fires on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling lookups");
            trigger.cancel();
        }
    });
    cancel
}

async fn read_labels(file: Option<&std::path::Path>) -> anyhow::Result<String> {
    match file {
        Some(path) if path != std::path::Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read {}", path.display())),
        _ => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("read stdin")?;
            Ok(raw)
        }
    }
}
