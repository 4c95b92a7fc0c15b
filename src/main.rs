mod classifier;
mod cli;
mod web;

#[cfg(test)]
mod test_support;

use anyhow::{anyhow, bail, Context, Result};
use classifier::{ClassifierSession, Diagnosis, ImageFile, InferenceClient, SubmissionState};
use clap::Parser;
use cli::{Args, BlightcheckConfig, Command};
use serde::Serialize;
use std::path::Path;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = BlightcheckConfig::load_or_default(args.config.as_deref())?
        .with_endpoint(args.endpoint)?;

    match args.command {
        Command::Serve(serve_args) => {
            start_ui_server(config, serve_args).await?;
        }
        Command::Classify(classify_args) => {
            classify_image(&config, classify_args).await?;
        }
        Command::Ping => {
            ping_inference_service(&config).await?;
        }
        Command::Init(init_args) => {
            generate_sample_config(init_args)?;
        }
    }

    Ok(())
}

async fn start_ui_server(mut config: BlightcheckConfig, args: cli::ServeArgs) -> Result<()> {
    if let Some(port) = args.port {
        config.ui.port = port;
    }
    let client = InferenceClient::new(&config.inference)?;

    info!("Starting web UI server on port {}", config.ui.port);

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║                 BLIGHTCHECK Leaf Classifier                   ║");
    println!("╠═══════════════════════════════════════════════════════════════╣");
    println!("║  Open http://localhost:{:<5} in your browser                 ║", config.ui.port);
    println!("║                                                               ║");
    println!("║  Pages:                                                       ║");
    println!("║    /            - Upload and classify a leaf photo            ║");
    println!("║    /api/state   - Current session as JSON                     ║");
    println!("║    /api/health  - UI and inference service health             ║");
    println!("║                                                               ║");
    println!("║  Press Ctrl+C to stop the server                              ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    web::start_server(&config.ui, client).await?;

    Ok(())
}

/// What `classify --json` prints
#[derive(Debug, Serialize)]
struct ClassifyOutput {
    file: String,
    label: String,
    diagnosis: Diagnosis,
    confidence: f64,
    tier: classifier::ConfidenceTier,
    recommendation: String,
}

async fn classify_image(config: &BlightcheckConfig, args: cli::ClassifyArgs) -> Result<()> {
    let file = read_image_file(&args.image)?;
    let client = InferenceClient::new(&config.inference)?;

    info!(
        "Classifying {:?} with {}",
        args.image,
        client.base_url()
    );

    let mut session = ClassifierSession::new();
    if let Err(e) = session.select_file(file) {
        bail!("{} ({})", session.error().unwrap_or_default(), e);
    }

    let ticket = session
        .submit()
        .ok_or_else(|| anyhow!("No image selected for {:?}", args.image))?;
    let outcome = client.predict(ticket.image).await;
    session.complete(ticket.generation, outcome);

    if session.state() != SubmissionState::Succeeded {
        bail!(
            "{}",
            session.error().unwrap_or("Classification failed")
        );
    }
    let result = session
        .result()
        .ok_or_else(|| anyhow!("Classification succeeded without a result"))?;

    if args.json {
        let output = ClassifyOutput {
            file: args.image.display().to_string(),
            label: result.label.clone(),
            diagnosis: result.diagnosis(),
            confidence: result.confidence,
            tier: result.tier(),
            recommendation: result.recommendation().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(60));
    println!("CLASSIFICATION RESULT");
    println!("{}", "=".repeat(60));
    println!("  Image:      {}", args.image.display());
    println!("  Diagnosis:  {}", result.label);
    println!(
        "  Confidence: {:.1}% ({})",
        result.confidence_percent(),
        result.tier()
    );
    println!("\nRecommendations:");
    println!("  {}", result.recommendation());

    Ok(())
}

fn read_image_file(path: &Path) -> Result<ImageFile> {
    let bytes =
        std::fs::read(path).context(format!("Failed to read image file: {:?}", path))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());
    Ok(ImageFile::sniffed(file_name, bytes))
}

async fn ping_inference_service(config: &BlightcheckConfig) -> Result<()> {
    let client = InferenceClient::new(&config.inference)?;
    let message = client
        .ping()
        .await
        .context(format!("Inference service at {} is not reachable", client.base_url()))?;

    println!("{}: {}", client.base_url(), message);

    Ok(())
}

fn generate_sample_config(args: cli::InitArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        bail!(
            "{:?} already exists (use --force to overwrite)",
            args.output
        );
    }

    let config = BlightcheckConfig::sample();

    config.save(&args.output)?;
    println!("Generated sample config at: {:?}", args.output);

    Ok(())
}
