use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// BLIGHTCHECK: potato leaf disease classifier client
///
/// Sends leaf photographs to an inference service and shows whether the
/// plant looks healthy or has early or late blight.
#[derive(Parser, Debug)]
#[command(name = "blightcheck")]
#[command(version = "0.1.0")]
#[command(about = "Classify potato leaf photographs with a remote inference service")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the config file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the inference service base URL
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web UI server
    Serve(ServeArgs),

    /// Classify a single image file
    Classify(ClassifyArgs),

    /// Check that the inference service is reachable
    Ping,

    /// Generate a sample config file
    Init(InitArgs),
}

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// Image to classify
    pub image: PathBuf,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Output path for the config file
    #[arg(short, long, default_value = "blightcheck.yaml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}
