use std::process;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use log::info;

use limbic::output::{error_payload, to_json_line, NO_TEXT};
use limbic::{ArtifactStore, Config, Predictor, Trainer};

/// Classifies the emotion of the text given as arguments.
#[derive(Parser)]
#[command(name = "limbic", disable_help_flag = true, disable_version_flag = true)]
struct Args {
    /// Text to classify; all arguments are joined with spaces.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
    text: Vec<String>,
}

async fn ensure_trained(config: &Config) -> anyhow::Result<()> {
    let store = ArtifactStore::new(&config.model_dir);
    if store.has_artifacts(config.prediction_mode) {
        return Ok(());
    }

    info!("No trained artifacts in {:?}, training...", store.dir());
    let start_time = Instant::now();
    let report = Trainer::new(config.clone())
        .train()
        .await
        .context("training failed")?;
    info!(
        "Trained on {} examples (took {:.2?})",
        report.samples,
        start_time.elapsed()
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    limbic::init_logger();
    let args = Args::parse();

    let text = args.text.join(" ");
    if text.trim().is_empty() {
        println!("{}", error_payload(NO_TEXT)?);
        process::exit(1);
    }

    let config = Config::from_env();
    ensure_trained(&config).await?;

    let predictor = Predictor::load(&config)
        .with_context(|| format!("failed to load artifacts from {:?}", config.model_dir))?;
    let prediction = predictor.predict(&text)?;
    println!("{}", to_json_line(&prediction)?);
    Ok(())
}
