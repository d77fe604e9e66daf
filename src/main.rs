use anyhow::Result;
use clap::Parser;
use comic_scraper::config::DownloadConfig;
use comic_scraper::{
    download_work, list_chapters, ChapterRange, Config, OutputFormat, Work, WorkSummary,
};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "comic-scraper")]
#[command(about = "Downloads comics and manga chapter by chapter into cbz or pdf files")]
#[command(version)]
struct Cli {
    /// Comic or manga urls to download
    #[arg(required = true)]
    urls: Vec<String>,

    /// Directory to download into
    #[arg(short, long)]
    location: Option<PathBuf>,

    /// Chapters to download: a single number or `start:end`
    #[arg(short, long)]
    chapters: Option<String>,

    /// Number of chapters downloaded at once
    #[arg(short = 't', long)]
    chapter_threads: Option<usize>,

    /// Number of pages downloaded at once within a chapter
    #[arg(short, long)]
    page_threads: Option<usize>,

    /// Mean wait between retries, in seconds
    #[arg(short, long)]
    wait_time: Option<f64>,

    /// Retries per page list or page before giving up
    #[arg(short, long)]
    retries: Option<u32>,

    /// Output format of every chapter
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Configuration file path
    #[arg(long, default_value = "comic-scraper.toml")]
    config: PathBuf,

    /// Only list the chapters of each url
    #[arg(long)]
    list: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Command line flags win over the configuration file.
    fn apply(&self, download: &mut DownloadConfig) {
        if let Some(location) = &self.location {
            download.location = location.clone();
        }
        if let Some(threads) = self.chapter_threads {
            download.chapter_threads = threads;
        }
        if let Some(threads) = self.page_threads {
            download.page_threads = threads;
        }
        if let Some(wait_time) = self.wait_time {
            download.wait_time = wait_time;
        }
        if let Some(retries) = self.retries {
            download.max_retries = retries;
        }
        if let Some(format) = self.format {
            download.format = format;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let mut config = Config::load_or_default(&cli.config)?;
    cli.apply(&mut config.download);
    config.download.validate()?;

    let range = cli
        .chapters
        .as_deref()
        .map(str::parse::<ChapterRange>)
        .transpose()?;

    let mut failures = 0usize;
    for url in &cli.urls {
        let work = match Work::new(url, &config.download) {
            Ok(work) => work,
            Err(e) => {
                error!("Skipping {}: {}", url, e);
                failures += 1;
                continue;
            }
        };

        if cli.list {
            if let Err(e) = run_list(&work, &config).await {
                error!("Failed to list chapters of {}: {}", work.name, e);
                failures += 1;
            }
            continue;
        }

        info!("Downloading comic: {} ({})", work.name, work.site);
        match download_work(&work, &config, range.as_ref()).await {
            Ok(summary) => {
                print_summary(&summary);
                failures += summary.failed();
            }
            Err(e) => {
                error!("Failed to download {}: {}", work.name, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} failure(s) while downloading", failures);
    }
    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("comic_scraper={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .init();

    Ok(())
}

async fn run_list(work: &Work, config: &Config) -> Result<()> {
    let catalog = list_chapters(work, config).await?;

    println!("{} ({} chapters)", work.name, catalog.len());
    println!("{:<10} {:<8} {}", "Chapter", "Volume", "Url");
    println!("{}", "-".repeat(60));
    for chapter in catalog.iter() {
        let volume = chapter.volume.map(|v| v.to_string()).unwrap_or_default();
        println!("{:<10} {:<8} {}", chapter.number.to_string(), volume, chapter.url);
    }
    Ok(())
}

fn print_summary(summary: &WorkSummary) {
    println!(
        "{}: {} of {} discovered chapters attempted",
        summary.work,
        summary.outcomes.len(),
        summary.discovered
    );
    println!("{:<10} {:<8} {}", "Chapter", "Status", "Detail");
    println!("{}", "-".repeat(60));

    let mut outcomes: Vec<_> = summary.outcomes.iter().collect();
    outcomes.sort_by_key(|o| o.number);
    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => println!(
                "{:<10} {:<8} {} ({} placeholder pages)",
                outcome.number.to_string(),
                "ok",
                report.artifact.display(),
                report.placeholders
            ),
            Err(e) => println!("{:<10} {:<8} {}", outcome.number.to_string(), "failed", e),
        }
    }
}
