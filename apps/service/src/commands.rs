//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use contentflow_core::{Pipeline, RunOutcome, StageReporter};
use contentflow_shared::{
    AppConfig, NewPrd, PrdId, StoreBackend, init_config, load_config, load_config_from,
    resolve_api_key, resolve_supabase,
};
use contentflow_storage::{ContentStore, LocalStore, SupabaseStore};

use crate::server::{self, AppState};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ContentFlow: PRD → research → draft → fact-check.
#[derive(Parser)]
#[command(
    name = "contentflow",
    version,
    about = "Serve and run the ContentFlow content pipeline.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.contentflow/contentflow.toml.
    #[arg(long, global = true, env = "CONTENTFLOW_CONFIG")]
    pub config: Option<PathBuf>,

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
    /// Start the HTTP service.
    Serve {
        /// Address to bind (overrides `[server] bind`).
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run the full pipeline once for a PRD.
    Run {
        /// PRD identifier (UUID).
        prd_id: String,
    },

    /// PRD management.
    Prd {
        #[command(subcommand)]
        action: PrdAction,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// PRD subcommands.
#[derive(Subcommand)]
pub(crate) enum PrdAction {
    /// Create a PRD.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
    },
    /// List PRDs, newest first.
    List,
    /// Show every content version of a PRD, oldest first.
    Versions {
        /// PRD identifier (UUID).
        prd_id: String,
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
        0 => "contentflow=info",
        1 => "contentflow=debug",
        _ => "contentflow=trace",
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

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Serve { bind } => cmd_serve(config_path, bind).await,
        Command::Run { prd_id } => cmd_run(config_path, &prd_id).await,
        Command::Prd { action } => match action {
            PrdAction::Create { title, body } => cmd_prd_create(config_path, title, body).await,
            PrdAction::List => cmd_prd_list(config_path).await,
            PrdAction::Versions { prd_id } => cmd_prd_versions(config_path, &prd_id).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Open the configured content store.
async fn open_store(config: &AppConfig) -> Result<Arc<dyn ContentStore>> {
    let store: Arc<dyn ContentStore> = match config.store.backend {
        StoreBackend::Supabase => {
            let credentials = resolve_supabase(config)?;
            info!(url = %credentials.url, "using supabase store");
            Arc::new(SupabaseStore::new(&credentials)?)
        }
        StoreBackend::Local => {
            let path = Path::new(&config.store.local_path);
            info!(path = %path.display(), "using local store");
            Arc::new(LocalStore::open(path).await?)
        }
    };
    Ok(store)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_serve(config_path: Option<&Path>, bind: Option<String>) -> Result<()> {
    let config = load(config_path)?;
    let api_key = resolve_api_key(&config);
    if api_key.is_none() {
        warn!(
            env = %config.auth.api_key_env,
            "service key is not set; every keyed request will be rejected"
        );
    }

    let store = open_store(&config).await?;
    let state = AppState::new(Pipeline::new(store), api_key);
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    server::serve(&bind, state).await
}

async fn cmd_run(config_path: Option<&Path>, prd_id: &str) -> Result<()> {
    let prd_id: PrdId = prd_id.parse()?;
    let config = load(config_path)?;
    let pipeline = Pipeline::new(open_store(&config).await?);

    info!(%prd_id, "running pipeline");
    let reporter = CliProgress::new();
    let outcome = pipeline.run(prd_id, &reporter).await;
    reporter.spinner.finish_and_clear();

    match outcome? {
        RunOutcome::Completed(result) => {
            println!();
            println!("  Run completed!");
            println!("  Run ID:   {}", result.run_id);
            println!("  Research: {}", result.research.id);
            println!("  Score:    {}", result.factcheck.score);
            for check in &result.factcheck.checks {
                println!("    + {check}");
            }
            println!();
            println!("{}", result.draft.draft_preview);
            println!();
            Ok(())
        }
        RunOutcome::Rejected(report) => {
            println!();
            println!("  Draft failed fact-check (score {}).", report.score);
            for check in &report.checks {
                println!("    + {check}");
            }
            for issue in &report.issues {
                println!("    - {issue}");
            }
            println!();
            Err(eyre!("fact-check failed for PRD {prd_id}"))
        }
    }
}

async fn cmd_prd_create(config_path: Option<&Path>, title: String, body: String) -> Result<()> {
    let new_prd = NewPrd { title, body };
    new_prd.validate()?;

    let config = load(config_path)?;
    let store = open_store(&config).await?;
    let prd = store.create_prd(new_prd).await?;
    println!("{}", prd.id);
    Ok(())
}

async fn cmd_prd_list(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let store = open_store(&config).await?;
    let prds = store.list_prds().await?;

    if prds.is_empty() {
        println!("No PRDs found.");
        return Ok(());
    }
    for prd in prds {
        let created = prd
            .created_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!("{}  {created:<16}  {}", prd.id, prd.title);
    }
    Ok(())
}

async fn cmd_prd_versions(config_path: Option<&Path>, prd_id: &str) -> Result<()> {
    let prd_id: PrdId = prd_id.parse()?;
    let config = load(config_path)?;
    let store = open_store(&config).await?;
    let versions = store.list_versions(prd_id).await?;

    if versions.is_empty() {
        println!("No versions for PRD {prd_id}.");
        return Ok(());
    }
    for version in versions {
        let text = version.text();
        let first_line = text.lines().next().unwrap_or_default();
        println!(
            "{}  {:<12}  {}  {first_line}",
            version.created_at.format("%Y-%m-%d %H:%M:%S"),
            version.stage.as_str(),
            version.id,
        );
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Spinner showing the current pipeline step.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid progress template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl StageReporter for CliProgress {
    fn stage(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _outcome: &RunOutcome) {
        self.spinner.finish_and_clear();
    }
}
