use std::path::PathBuf;

use clap::Parser;
use fovus::{validate, SubmitConfig, Submitter};
use miette::Result;
use tracing_subscriber::EnvFilter;

/// Upload a file and record it in the submissions table.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Your name
    #[arg(short, long, default_value = "")]
    name: String,

    /// A PDF, image or MP4 to upload
    #[arg(short, long)]
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    validate(&cli.name, cli.file.as_deref())?;

    let sdk_config = aws_config::load_from_env().await;
    let config = SubmitConfig::from_env(&sdk_config)?;
    let submitter = Submitter::new(&sdk_config, config)?;

    let record = submitter.submit(&cli.name, cli.file.as_deref()).await?;

    println!("Submitted {} ({})", record.id, record.input_file_path);

    Ok(())
}
