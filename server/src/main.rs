use std::{net::SocketAddr, sync::Arc};

use axum::{http::Method, Router};
use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

mod pages;
mod qa;
mod stocks;

#[derive(Parser, Debug)]
#[command(author, version, about = "Demo web apps")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Question answering form, on port 5000 by default
    Qa(ServeArgs),
    /// Most traded S&P 500 names, on port 8000 by default
    Trending(ServeArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long)]
    addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();

    let (app, addr) = match cli.command {
        Command::Qa(args) => {
            let client = qasper::Config::from_env()?.client()?;
            let app = qa::router(Arc::new(client));

            (app, args.addr.unwrap_or(([0, 0, 0, 0], 5000).into()))
        }
        Command::Trending(args) => {
            let client = trending::Config::from_env()?.client()?;
            let app = stocks::router(Arc::new(client));

            (app, args.addr.unwrap_or(([0, 0, 0, 0], 8000).into()))
        }
    };

    serve(app, addr).await
}

async fn serve(app: Router, addr: SocketAddr) -> Result<()> {
    let cors = CorsLayer::new()
        // allow `GET` and `POST` when accessing the resource
        .allow_methods([Method::GET, Method::POST])
        // allow requests from any origin
        .allow_origin(Any);

    let app = app.layer(cors).layer(TraceLayer::new_for_http());

    tracing::info!(%addr, "listening");

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .into_diagnostic()
}
