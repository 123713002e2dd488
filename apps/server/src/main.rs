//! chemfuse server — correlated materials and compound data over HTTP.
//!
//! Chains four upstream providers (materials summaries, registry-number
//! pages, id translation, batched compound properties) and serves both the
//! raw lookups and the correlated aggregation endpoint.

mod routes;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;

use chemfuse_shared::{load_config, load_config_from, resolve_api_key};

/// chemfuse — correlated chemistry/materials data service.
#[derive(Parser)]
#[command(
    name = "chemfuse-server",
    version,
    about = "Serve correlated materials and compound data from four upstream providers.",
    long_about = None,
)]
struct Cli {
    /// Port to bind (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to an alternate config file.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Write a default config file to ~/.chemfuse/chemfuse.toml and exit.
    #[arg(long)]
    init_config: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Initialize tracing based on CLI flags.
fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug,hyper=info",
        _ => "trace,hyper=info",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(&cli);

    if cli.init_config {
        let path = chemfuse_shared::init_config()?;
        println!("wrote default config to {}", path.display());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    // Fail fast: the summary provider is unusable without its key
    let api_key = resolve_api_key(&config)?;

    let state = routes::AppState::new(&config, api_key)?;
    let app = routes::router(state, &config.server)?;

    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("0.0.0.0:{port}");
    info!(%addr, "starting chemfuse server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
