use anyhow::Result;
use clap::Parser;
use retina_vision::{config::Config, web::serve};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "retina-vision")]
#[command(about = "ONNX-powered retina image analysis service")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: String,

    /// Model directory path
    #[arg(long, default_value = "models")]
    models_dir: String,

    /// Directory for stored original and annotated images
    #[arg(long, default_value = "static")]
    static_dir: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting retina vision service...");
    tracing::info!("Bind address: {}", args.bind);
    tracing::info!("Models directory: {}", args.models_dir);
    tracing::info!("Static directory: {}", args.static_dir);

    let config = Config::new(args.bind, args.models_dir, args.static_dir, args.dev);

    serve(config).await?;

    Ok(())
}
