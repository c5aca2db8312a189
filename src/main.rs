//! # tgharvest CLI
//!
//! Command-line entry point: `.env` + config + overrides, session, channel loop.

use std::process;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tgharvest::HarvestError;
use tgharvest::cli::Args;
use tgharvest::config::ConfigFile;
use tgharvest::core::{RunSummary, scrape_all_with_progress};
use tgharvest::progress::stderr_progress;
use tgharvest::session::{self, Credentials};

/// Exit status when `--strict` is set and at least one channel failed.
const EXIT_PARTIAL: i32 = 2;

fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_logging(&args);

    match run(&args) {
        Ok(summary) if args.strict && !summary.is_success() => process::exit(EXIT_PARTIAL),
        Ok(_) => {}
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            process::exit(1);
        }
    }
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<RunSummary, HarvestError> {
    let total_start = Instant::now();

    let settings = ConfigFile::load(&args.config)?.resolve(&args.overrides())?;
    let credentials = Credentials::from_env()?;

    println!("📦 tgharvest v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📄 Config:   {}", args.config.display());
    println!("📅 Range:    {}", settings.window());
    println!("📺 Channels: {}", settings.channels().len());
    println!("💾 Output:   {}", settings.output_dir().display());
    println!();

    let mut session = session::open(settings.session(), credentials.as_ref())?;
    let progress = (!args.quiet).then(stderr_progress);
    let summary = scrape_all_with_progress(&mut session, &settings, progress)?;

    for report in &summary.completed {
        println!(
            "✅ {}: {} messages -> {}",
            report.channel,
            report.records,
            report.path.display()
        );
    }
    for failure in &summary.failed {
        println!("⚠️  {}: {}", failure.channel, failure.error);
    }

    println!();
    println!("📊 Summary:");
    println!("   Channels:  {} ok, {} failed", summary.completed.len(), summary.failed.len());
    println!("   Messages:  {}", summary.total_records());
    println!("   Time:      {:.2}s", total_start.elapsed().as_secs_f64());

    Ok(summary)
}
