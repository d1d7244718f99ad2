//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use texforge_core::pipeline::{BuildConfig, BuildProtocol, ProgressReporter, build_paper};
use texforge_shared::{AppConfig, config_file_path, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// texforge — build scholarly papers from fragment directories.
#[derive(Parser)]
#[command(
    name = "texforge",
    version,
    about = "Assemble and compile a scholarly paper from a directory of LaTeX fragments.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Assemble a paper directory and compile it to PDF.
    Build {
        /// Path to the paper directory.
        dir: PathBuf,

        /// Require bibliographic data (fail when refs.bib is absent).
        #[arg(long)]
        require_bibliography: bool,
    },

    /// Assemble and write the composed source without compiling.
    Assemble {
        /// Path to the paper directory.
        dir: PathBuf,
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
        0 => "texforge_cli=info,texforge_core=info,texforge_shared=info",
        1 => "texforge_cli=debug,texforge_core=debug,texforge_shared=debug",
        _ => "trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
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
    match cli.command {
        Command::Build {
            dir,
            require_bibliography,
        } => cmd_build(dir, require_bibliography).await,
        Command::Assemble { dir } => cmd_assemble(dir).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_build(dir: PathBuf, require_bibliography: bool) -> Result<()> {
    let config = load_config()?;
    let build_config = to_build_config(&config, dir, require_bibliography);

    info!(paper_dir = %build_config.paper_dir.display(), "building paper");

    let reporter = CliProgress::new();
    let report = build_paper(&build_config, &reporter).await?;
    reporter.finish();

    let protocol = match report.protocol {
        BuildProtocol::Bibliography => "3-pass with bibliography resolution",
        BuildProtocol::EngineDriver => "engine multipass driver",
    };

    println!();
    println!("  Paper compiled successfully!");
    println!("  Artifact:  {}", report.artifact_path.display());
    println!("  Source:    {}", report.source_path.display());
    println!("  Fragments: {}", report.fragment_count);
    println!("  Protocol:  {protocol}");
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    for warning in &report.warnings {
        println!("  Warning:   {warning}");
    }
    println!();

    Ok(())
}

async fn cmd_assemble(dir: PathBuf) -> Result<()> {
    let source_path = texforge_core::pipeline::assemble_only(&dir)?;
    println!("Composed source written to {}", source_path.display());
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config file created at {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let path = config_file_path()?;
    println!("# resolved config ({})", path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

/// Merge the loaded app config with per-invocation CLI flags.
fn to_build_config(config: &AppConfig, paper_dir: PathBuf, require_bibliography: bool) -> BuildConfig {
    BuildConfig {
        paper_dir,
        engine: config.toolchain.engine.clone(),
        bibliography_tool: config.toolchain.bibliography_tool.clone(),
        driver: config.toolchain.driver.clone(),
        timeout: Duration::from_secs(config.toolchain.timeout_secs),
        search_path: config.toolchain.resolved_assets_dir(),
        require_bibliography: require_bibliography || config.build.require_bibliography,
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }
}
