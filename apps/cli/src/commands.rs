//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};
use tracing::info;

use newsdesk_agents::{InvocationRequest, Newsroom, RunOutcome, StageObserver, SupervisorState};
use newsdesk_handlers::{Gateway, GatewayTool, handle_action_group, lookup_rating, title_rating};
use newsdesk_shared::{AppConfig, NewsdeskError, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Newsdesk: turn journalist notes into reviewed news articles.
#[derive(Parser)]
#[command(
    name = "newsdesk",
    version,
    about = "Turn journalist notes into researched, reviewed news articles with Amazon Bedrock.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.newsdesk/newsdesk.toml).
    #[arg(long = "config", global = true, env = "NEWSDESK_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// AWS region, overriding the config file.
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Knowledge base id, overriding the config file.
    #[arg(long, global = true)]
    pub kb_id: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Research, write and review an article from news facts.
    Generate {
        /// News facts; read from --file or stdin when omitted.
        facts: Option<String>,

        /// Read the news facts from a file.
        #[arg(short, long, conflicts_with = "facts")]
        file: Option<PathBuf>,

        /// Session id used for log correlation.
        #[arg(long)]
        session_id: Option<String>,

        /// Approximate article length, overriding the config file.
        #[arg(long)]
        target_words: Option<u32>,

        /// Print the run outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Invoke one agent or gateway tool.
    Tool {
        /// Tool name (researchAgent, articleWritingAgent, articleReviewerAgent,
        /// mediaAssistantAgent, get_title_rating, get_show_detail); gateway
        /// prefixes are accepted.
        name: String,

        /// JSON argument object, or `-` to read it from stdin.
        input: String,
    },

    /// Ask the media assistant about a movie or show.
    Ask {
        /// Question, e.g. "How is Ocean Drift rated?".
        question: String,
    },

    /// List the available tools.
    Tools,

    /// Look up a title rating.
    Rating {
        /// Title id, e.g. aws567890.
        title_id: String,
    },

    /// Handle an action-group event from a JSON file (or `-` for stdin).
    Action {
        event: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "newsdesk=info",
        1 => "newsdesk=debug",
        _ => "newsdesk=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Config resolution
// ---------------------------------------------------------------------------

/// Load the config file and apply flag overrides.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config_file {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(region) = &cli.region {
        config.aws.region = region.clone();
    }
    if let Some(kb_id) = &cli.kb_id {
        config.knowledge_base.id = Some(kb_id.clone());
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command. Only commands that call Bedrock or print the
/// config read the config file.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Generate {
            facts,
            file,
            session_id,
            target_words,
            json,
        } => {
            let mut config = resolve_config(&cli)?;
            if let Some(words) = target_words {
                config.writer.target_words = *words;
            }
            let facts = read_facts(facts.clone(), file.as_deref())?;
            cmd_generate(&config, facts, session_id.clone(), *json).await
        }
        Command::Tool { name, input } => cmd_tool(&cli, name, input).await,
        Command::Ask { question } => cmd_ask(&resolve_config(&cli)?, question).await,
        Command::Tools => cmd_tools(),
        Command::Rating { title_id } => cmd_rating(title_id),
        Command::Action { event } => cmd_action(event),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&resolve_config(&cli)?),
        },
    }
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .wrap_err("failed to read stdin")?;
    Ok(buf)
}

fn read_facts(facts: Option<String>, file: Option<&Path>) -> Result<String> {
    match (facts, file) {
        (Some(facts), _) => Ok(facts),
        (None, Some(path)) => std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display())),
        (None, None) => read_stdin(),
    }
}

/// A JSON document from a path, or from stdin for `-`.
fn read_json(source: &str) -> Result<Value> {
    let raw = if source == "-" {
        read_stdin()?
    } else if Path::new(source).is_file() {
        std::fs::read_to_string(source).wrap_err_with(|| format!("failed to read {source}"))?
    } else {
        source.to_string()
    };
    serde_json::from_str(&raw).map_err(|e| eyre!("invalid JSON input: {e}"))
}

async fn cmd_generate(
    config: &AppConfig,
    facts: String,
    session_id: Option<String>,
    as_json: bool,
) -> Result<()> {
    let newsroom = Newsroom::setup(config)?;
    let request = InvocationRequest::new(facts).with_session(session_id);

    info!(session_id = request.session_id.as_deref().unwrap_or("-"), "generating article");

    let observer = CliObserver::new();
    let outcome = newsroom.run(&request, &observer).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&outcome_json(&outcome))?);
        return Ok(());
    }

    println!("{}", outcome.article);
    eprintln!();
    eprintln!("  Article generated!");
    eprintln!("  Run:       {}", outcome.run_id);
    eprintln!("  Revisions: {}", outcome.writer_calls.saturating_sub(1));
    eprintln!("  Reviews:   {}", outcome.reviewer_calls);
    eprintln!("  Time:      {:.1}s", outcome.elapsed.as_secs_f64());
    eprintln!();

    Ok(())
}

fn outcome_json(outcome: &RunOutcome) -> Value {
    json!({
        "run_id": outcome.run_id.to_string(),
        "session_id": outcome.session_id,
        "article": outcome.article,
        "states": outcome.states.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "writer_calls": outcome.writer_calls,
        "reviewer_calls": outcome.reviewer_calls,
        "started_at": outcome.started_at.to_rfc3339(),
        "elapsed_ms": outcome.elapsed.as_millis() as u64,
    })
}

async fn cmd_tool(cli: &Cli, name: &str, input: &str) -> Result<()> {
    let args = read_json(input)?;

    let output = match name.parse::<GatewayTool>() {
        Ok(GatewayTool::GetTitleRating) => title_rating(&args)?,
        Ok(tool) => {
            let newsroom = Newsroom::setup(&resolve_config(cli)?)?;
            let gateway = Gateway::new(
                newsroom.knowledge(),
                newsroom.knowledge_base().knowledge_base_id.clone(),
            );
            gateway.invoke(tool, &args).await?
        }
        Err(NewsdeskError::UnknownTool(_)) => {
            let newsroom = Newsroom::setup(&resolve_config(cli)?)?;
            Value::String(newsroom.invoke_tool(name, &args).await?)
        }
        Err(other) => return Err(other.into()),
    };

    match output {
        Value::String(text) => println!("{text}"),
        other => println!("{}", serde_json::to_string_pretty(&other)?),
    }
    Ok(())
}

async fn cmd_ask(config: &AppConfig, question: &str) -> Result<()> {
    let newsroom = Newsroom::setup(config)?;
    println!("{}", newsroom.ask(question).await?);
    Ok(())
}

fn cmd_tools() -> Result<()> {
    let specs: Vec<Value> = newsdesk_agents::tool_specs()
        .into_iter()
        .chain(GatewayTool::ALL.iter().map(|t| t.spec()))
        .collect();
    println!("{}", serde_json::to_string_pretty(&specs)?);
    Ok(())
}

fn cmd_rating(title_id: &str) -> Result<()> {
    let rating = lookup_rating(title_id);
    println!("{}", serde_json::to_string_pretty(&rating.to_value())?);
    Ok(())
}

fn cmd_action(event: &str) -> Result<()> {
    let event = read_json(event)?;
    let response = handle_action_group(&event);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI stage observer
// ---------------------------------------------------------------------------

/// Spinner showing the supervisor's current state.
struct CliObserver {
    spinner: ProgressBar,
}

impl CliObserver {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

fn describe(state: SupervisorState) -> String {
    match state {
        SupervisorState::Start => "Starting".into(),
        SupervisorState::Researching => "Researching entities".into(),
        SupervisorState::Writing { iteration: 0 } => "Writing first draft".into(),
        SupervisorState::Writing { iteration } => format!("Writing revision {iteration}"),
        SupervisorState::Reviewing { iteration } => format!("Reviewing draft {iteration}"),
        SupervisorState::Done => "Done".into(),
        SupervisorState::Failed => "Failed".into(),
    }
}

impl StageObserver for CliObserver {
    fn state(&self, state: SupervisorState) {
        self.spinner.set_message(describe(state));
    }

    fn done(&self, _outcome: &RunOutcome) {
        self.spinner.finish_and_clear();
    }

    fn failed(&self, _error: &NewsdeskError) {
        self.spinner.finish_and_clear();
    }
}
