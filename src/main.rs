use anyhow::Result;
use clap::{Parser, Subcommand};
use improve_engine::{polish, Config, Improver};
use tracing::info;

#[derive(Parser)]
#[command(name = "improve-server")]
#[command(about = "Text improvement service with engine fallback", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP service (default)")]
    Serve {
        #[arg(short, long, help = "Path to config.toml")]
        config: Option<String>,
    },
    #[command(about = "Run the rule-based polisher on TEXT and print the result")]
    Polish {
        #[arg(required = true)]
        text: Vec<String>,
    },
    #[command(about = "Improve TEXT through the configured engines")]
    Improve {
        #[arg(short, long, help = "Path to config.toml")]
        config: Option<String>,
        #[arg(required = true)]
        text: Vec<String>,
    },
    #[command(about = "Print the effective configuration as TOML")]
    Config {
        #[arg(short, long, help = "Path to config.toml")]
        config: Option<String>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn improve_once(config: Option<String>, text: &str) -> Result<()> {
    let config = Config::load(config.as_deref())?;
    let improver = Improver::from_config(&config)?;

    let improvement = improver.improve(text).await?;
    info!("Produced by {} engine ({})", improvement.engine, improvement.format);
    println!("{}", improvement.suggestion);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command.unwrap_or(Commands::Serve { config: None }) {
        Commands::Serve { config } => {
            info!("Starting improve-server");
            let config = Config::load(config.as_deref())?;
            improve_engine::server::serve(config).await?;
        }
        Commands::Polish { text } => {
            println!("{}", polish(&text.join(" ")));
        }
        Commands::Improve { config, text } => {
            improve_once(config, &text.join(" ")).await?;
        }
        Commands::Config { config } => {
            let config = Config::load(config.as_deref())?;
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}
