use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use qasper::{answer_question, Config, QaRequest, DEMO_CONTEXT, DEMO_QUESTION};

/// Ask the hosted QA model one question about a passage.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, default_value = DEMO_QUESTION)]
    question: String,

    #[arg(short, long, default_value = DEMO_CONTEXT, hide_default_value = true)]
    context: String,

    /// Model id, overriding QASPER_MODEL
    #[arg(short, long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(model) = cli.model {
        config = config.with_model(model);
    }
    let client = config.client()?;

    let request = QaRequest {
        question: cli.question,
        context: cli.context,
    };
    let answer = answer_question(&client, &request).await?;

    println!("{}", serde_json::to_string_pretty(&answer).into_diagnostic()?);

    Ok(())
}
