use anyhow::{Context, Result};
use diario::cli::{self, CliCommand, StdinConfirm};
use diario::client::ApiClient;
use diario::config::{Config, LOG_LEVEL_ENV};
use diario::context::{AppContext, StandardContext};
use log::LevelFilter;
use simplelog::{ColorChoice, TermLogger, TerminalMode, WriteLogger};
use std::env;
use std::fs::OpenOptions;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;

fn init_file_logger(ctx: &dyn AppContext, level: LevelFilter) -> Result<()> {
    let path = ctx.get_log_file_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Cannot open log file '{}'", path.display()))?;
    WriteLogger::init(level, simplelog::Config::default(), file)?;
    Ok(())
}

fn init_term_logger(level: LevelFilter) {
    // Subcommand output goes to stdout; stderr shows warnings unless DIARIO_LOG asks for more.
    let level = if env::var(LOG_LEVEL_ENV).is_ok() {
        level
    } else {
        LevelFilter::Warn
    };
    let _ = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

/// Loads the config, writing the defaults on first run so there is a file to edit.
fn load_config(ctx: &dyn AppContext) -> Result<Config> {
    let missing = !ctx.get_config_file_path()?.exists();
    let config = Config::load_or_default(ctx)?;
    if missing {
        match config.save(ctx) {
            Ok(()) => log::info!(
                "Wrote default configuration to {}",
                Config::get_path_string(ctx)?
            ),
            Err(e) => log::warn!("Could not write default configuration: {}", e),
        }
    }
    Ok(config)
}

#[cfg(feature = "tui")]
async fn run_interactive(
    ctx: Arc<dyn AppContext>,
    store: ApiClient,
    api_url: String,
    config: &Config,
) -> Result<()> {
    diario::tui::run(ctx, store, api_url, config.status_timeout()).await
}

#[cfg(not(feature = "tui"))]
async fn run_interactive(
    _ctx: Arc<dyn AppContext>,
    _store: ApiClient,
    _api_url: String,
    _config: &Config,
) -> Result<()> {
    anyhow::bail!("Built without the 'tui' feature. Try --help for the subcommands")
}

async fn run() -> Result<()> {
    let raw_args: Vec<String> = env::args().skip(1).collect();
    let args = cli::parse_args(&raw_args)?;

    if args.command == CliCommand::Help {
        cli::print_help("diario");
        return Ok(());
    }

    let ctx: Arc<dyn AppContext> = Arc::new(StandardContext::new(args.root.clone()));
    let config = load_config(ctx.as_ref())?;
    let level = config.log_level_filter();
    let api_url = config.resolve_api_url(args.api_url.as_deref());
    let store = ApiClient::new(&api_url)?;

    if args.command == CliCommand::Interactive {
        if let Err(e) = init_file_logger(ctx.as_ref(), level) {
            eprintln!("Warning: logging disabled: {:#}", e);
        }
        log::info!("Starting diario v{} against {}", env!("CARGO_PKG_VERSION"), api_url);
        return run_interactive(ctx, store, api_url, &config).await;
    }

    init_term_logger(level);
    let mut confirm = StdinConfirm;
    let mut stdout = io::stdout();
    cli::run_command(&store, &args.command, &mut confirm, &mut stdout).await
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
