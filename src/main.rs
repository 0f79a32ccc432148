mod cli;
mod config;
mod engine;
mod metrics;
mod protocol;
mod router;
mod server;
mod session;
mod storage;
mod utils;

use std::path::PathBuf;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use config::{ServerConfig, DEFAULT_CONFIG_FILE};

#[derive(Parser)]
#[command(name = "huffpack")]
#[command(about = "Huffman file compression and upload server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Config file path")]
    config: Option<String>,

    #[arg(long, global = true, help = "Listen address (overrides config)")]
    listen: Option<String>,

    #[arg(long, global = true, help = "Downloads directory (overrides config)")]
    downloads: Option<PathBuf>,

    #[arg(long, global = true, help = "Templates directory (overrides config)")]
    templates: Option<PathBuf>,

    #[arg(long, global = true, help = "Output as JSON")]
    json: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Compress a file
    Compress {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Decompress a file
    Decompress {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Start the upload server
    Serve,
    GenerateConfig {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE, help = "Config file path")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("huffpack=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compress { input, output } => cli::compress_file(&input, &output)
            .await
            .and_then(|summary| summary.print(cli.json)),
        Commands::Decompress { input, output } => cli::decompress_file(&input, &output)
            .await
            .and_then(|summary| summary.print(cli.json)),
        Commands::GenerateConfig { output } => {
            ServerConfig::default().save(&output).map(|()| {
                if cli.json {
                    println!("{}", serde_json::json!({"success": true, "config_file": output}));
                } else {
                    println!("✅ Generated config file: {}", output);
                }
            })
        }
        Commands::Serve => {
            let mut config = ServerConfig::load(cli.config.as_deref())?;

            // Override config with CLI args if provided
            if let Some(listen) = cli.listen {
                config.listen_address = listen;
            }
            if let Some(downloads) = cli.downloads {
                config.downloads_directory = downloads;
            }
            if let Some(templates) = cli.templates {
                config.templates_directory = templates;
            }

            match config.ensure_directories() {
                Ok(()) => {
                    info!("Starting huffpack server on {}", config.listen_address);
                    server::run(config).await
                }
                Err(e) => Err(e.context("failed to create directories")),
            }
        }
    };

    if let Err(e) = &result {
        if cli.json {
            println!("{}", serde_json::json!({"error": format!("{:#}", e)}));
        } else {
            eprintln!("❌ {:#}", e);
        }
    }
    result
}
