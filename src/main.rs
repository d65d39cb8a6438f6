//! Entry point for the contest-preview CLI.

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::watch;

use contest_preview::cli::{Command, Limits};
use contest_preview::render::{
    EMPTY_ARCHIVE_MESSAGE, format_clock, format_size, render_frame, render_preview, render_tree,
};
use contest_preview::timer::feed::{PollFeed, pump_lines};
use contest_preview::timer::{Countdown, SystemClock, Ticker};
use contest_preview::tree::walk;
use contest_preview::{Cli, Inspector, Source, build_tree};

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG=debug contest-preview tree submission.zip
    env_logger::init();

    // process-wide rustls provider; a second install is a no-op
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    match cli.command {
        Command::Tree { ref file, json } => tree(&cli.limits, file, json).await,
        Command::Show {
            ref file,
            ref entry,
            json,
        } => show(&cli.limits, file, entry.as_deref(), json).await,
        Command::Watch {
            ref url,
            interval,
            cadence_ms,
        } => follow_timer(&cli.limits, url.clone(), interval, cadence_ms).await,
    }
}

async fn tree(limits: &Limits, file: &str, json: bool) -> Result<()> {
    let inspector = Inspector::new(limits.inspect_options());
    let content = inspector
        .preview(&Source::parse(file))
        .await
        .with_context(|| format!("Failed to preview {}", file))?;
    let nodes = build_tree(&content.files);

    if json {
        println!("{}", serde_json::to_string_pretty(&nodes)?);
        return Ok(());
    }

    if nodes.is_empty() {
        println!("{}", EMPTY_ARCHIVE_MESSAGE);
        return Ok(());
    }

    print!("{}", render_tree(&nodes));

    let all = walk(&nodes);
    let folders = all.iter().filter(|(_, n)| n.is_dir).count();
    let total: u64 = nodes.iter().map(|n| n.total_size()).sum();
    println!(
        "\n{} files, {} folders, {}",
        all.len() - folders,
        folders,
        format_size(total)
    );

    Ok(())
}

async fn show(limits: &Limits, file: &str, entry: Option<&str>, json: bool) -> Result<()> {
    let inspector = Inspector::new(limits.inspect_options());
    let source = Source::parse(file);

    let preview = match (entry, &source) {
        (Some(entry), _) => inspector.preview_entry(&source, entry).await,
        (None, Source::Local(path)) => inspector.preview_file(path).await,
        (None, Source::Remote(_)) => bail!("Remote previews need an ENTRY inside the archive"),
    }
    .with_context(|| format!("Failed to preview {}", file))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&preview)?);
    } else {
        print!("{}", render_preview(&preview));
    }

    Ok(())
}

async fn follow_timer(
    limits: &Limits,
    url: Option<String>,
    interval: u64,
    cadence_ms: u64,
) -> Result<()> {
    let (tx, rx) = watch::channel(None);

    let mut last_line: Option<String> = None;
    let ticker = Ticker::spawn(
        rx,
        Duration::from_millis(cadence_ms.max(10)),
        Countdown::default(),
        SystemClock,
        move |frame| {
            if let Some(threshold) = frame.alert {
                println!("** {} remaining **", format_clock(threshold));
            }
            let line = render_frame(frame);
            if last_line.as_deref() != Some(line.as_str()) {
                println!("{}", line);
                last_line = Some(line);
            }
        },
    );

    match url {
        Some(url) => {
            info!("Polling {} every {}s", url, interval);
            let feed = PollFeed::new(url, Duration::from_secs(interval.max(1)), &limits.http_options())?;
            tokio::select! {
                _ = feed.run(tx) => {}
                res = tokio::signal::ctrl_c() => res?,
            }
        }
        None => {
            let stdin = BufReader::new(tokio::io::stdin());
            tokio::select! {
                res = pump_lines(stdin, &tx) => {
                    info!("State input closed after {} messages", res?);
                    tokio::signal::ctrl_c().await?;
                }
                res = tokio::signal::ctrl_c() => res?,
            }
        }
    }

    ticker.cancel();
    Ok(())
}
