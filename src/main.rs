use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use wallpaper_archive::{IngestionPipeline, PipelineConfig, PipelineError, RunSummary, cancellation};

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ::log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), PipelineError> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    config.apply_env();
    args.apply(&mut config);

    ::log::info!(
        "Searching {} for years {}..{} through {}",
        config.base_url,
        config.newest_year(),
        config.oldest_year + 1,
        config.webdriver.webdriver_url
    );

    let (handle, signal) = cancellation();
    let total_timeout = args.total_timeout.map(Duration::from_secs);
    tokio::spawn(async move {
        let deadline = async {
            match total_timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => ::log::warn!("Interrupted"),
            _ = deadline => ::log::warn!("Total timeout reached"),
        }
        handle.cancel();
    });

    let pipeline = IngestionPipeline::new(config)?
        .with_cancellation(signal)
        .with_discover_only(args.discover_only);

    let start_time = std::time::Instant::now();
    let summary = pipeline.run().await?;
    ::log::info!("Finished in {:.2} seconds", start_time.elapsed().as_secs_f64());

    print_summary(&summary, args.json);
    Ok(())
}

fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        match serde_json::to_string_pretty(summary) {
            Ok(text) => println!("{}", text),
            Err(e) => ::log::error!("Failed to serialize summary: {}", e),
        }
    } else {
        print!("{}", summary);
    }
}
