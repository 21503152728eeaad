use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use snapcount::args::Cli;
use snapcount::batch;
use snapcount::config::{default_config_path, ConfigFile, Settings};
use snapcount::report;
use std::process;
use std::sync::Arc;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        log::error!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => {
            let file = ConfigFile::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            Settings::from_file(&file)
        }
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => {
                info!("Using config {}", path.display());
                let file = ConfigFile::load(&path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?;
                Settings::from_file(&file)
            }
            None => Settings::default(),
        },
    };
    cli.apply_overrides(&mut settings);

    settings
        .analysis
        .validate(settings.sample_rate)
        .context("Invalid analysis settings")?;
    debug!("Effective settings: {}", serde_json::to_string(&settings)?);

    let inputs = batch::collect_inputs(&cli.input, &settings.extension)
        .with_context(|| format!("Failed to read inputs from {}", cli.input.display()))?;
    if inputs.is_empty() {
        warn!("No .{} files found in {}", settings.extension, cli.input.display());
        return Ok(());
    }

    let out_dir = match &cli.out {
        Some(dir) => dir.clone(),
        None if cli.input.is_dir() => cli.input.clone(),
        None => cli
            .input
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default(),
    };

    let settings = Arc::new(settings);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start worker runtime")?;
    let outcome = runtime.block_on(batch::run(inputs, Arc::clone(&settings)));

    for file in &outcome.reports {
        println!("\n{}", report::render_summary(file).trim_end());
    }
    if !outcome.failures.is_empty() {
        warn!("{} file(s) skipped", outcome.failures.len());
    }

    let (text_path, _) = report::write_reports(
        &out_dir,
        &settings.report_name,
        &outcome.reports,
        &outcome.failures,
        settings.ceiling,
    )?;
    println!("\nResults saved to {}", text_path.display());

    Ok(())
}
