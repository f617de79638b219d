//! Newsdesk runtime: HTTP invocation surface for the article pipeline.

mod server;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;

use newsdesk_agents::Newsroom;
use newsdesk_shared::{load_config, load_config_from};

/// Serve `/ping`, `/invocations`, `/tools` and `/actions`.
#[derive(Parser)]
#[command(name = "newsdesk-runtime", version, about, long_about = None)]
struct Cli {
    /// Bind address, overriding `[runtime].host`.
    #[arg(long)]
    host: Option<String>,

    /// Port, overriding `[runtime].port`.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Config file (defaults to ~/.newsdesk/newsdesk.toml).
    #[arg(long, env = "NEWSDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "newsdesk=info,tower_http=info",
        1 => "newsdesk=debug,tower_http=debug",
        _ => "newsdesk=trace,tower_http=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => fmt().with_env_filter(env_filter).with_target(false).init(),
        LogFormat::Json => fmt().json().with_env_filter(env_filter).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(&cli);

    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(host) = cli.host {
        config.runtime.host = host;
    }
    if let Some(port) = cli.port {
        config.runtime.port = port;
    }

    let newsroom = Newsroom::setup(&config)?;
    server::serve(newsroom, &config.runtime).await
}
