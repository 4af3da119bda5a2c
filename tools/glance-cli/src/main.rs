//! Glance CLI — inspect the desktop and mirror windows without a UI.
//!
//! Usage:
//!   glance check                 Check system capabilities
//!   glance windows               List capturable windows
//!   glance run [OPTIONS]         Mirror a window into a headless surface
//!   glance profile <COMMAND>     Manage saved stream profiles

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use glance_frame_model::{CaptureBackendKind, EffectsBackendKind};

mod commands;

#[derive(Parser)]
#[command(
    name = "glance",
    about = "Live window mirroring with motion highlighting",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/glance/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check system capabilities
    Check,

    /// List windows that can be mirrored
    Windows {
        /// Include untitled and hidden windows
        #[arg(long)]
        all: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Mirror a window into a headless surface, logging frame rate and motion
    Run(RunArgs),

    /// Manage saved stream profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
}

/// Options for `glance run`. Unset options keep the configured value.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Window handle to mirror (see `glance windows`)
    #[arg(long, conflicts_with_all = ["title", "demo"])]
    pub window: Option<u64>,

    /// Mirror the first window whose title contains this text
    #[arg(long, conflicts_with = "demo")]
    pub title: Option<String>,

    /// Mirror a window on an in-memory demo desktop
    #[arg(long)]
    pub demo: bool,

    /// Start from a saved profile
    #[arg(long)]
    pub profile: Option<String>,

    /// Target FPS
    #[arg(long)]
    pub fps: Option<u32>,

    /// Capture backend: software|pooled|low_latency
    #[arg(long)]
    pub backend: Option<CaptureBackendKind>,

    /// Effects backend: auto|vectorized|vision|portable
    #[arg(long)]
    pub effects: Option<EffectsBackendKind>,

    /// Brightness multiplier
    #[arg(long)]
    pub brightness: Option<f32>,

    /// Contrast multiplier
    #[arg(long)]
    pub contrast: Option<f32>,

    /// Output scale in percent (10-100)
    #[arg(long)]
    pub scale: Option<u32>,

    /// Nearest-neighbour scaling
    #[arg(long)]
    pub fast: bool,

    /// Capture the client area only
    #[arg(long)]
    pub client_area: bool,

    /// Run the pooled backend's frame pump
    #[arg(long = "async")]
    pub async_mode: bool,

    /// Enable motion highlighting
    #[arg(long)]
    pub blobs: bool,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration: Option<f64>,

    /// Headless viewport size
    #[arg(long, default_value = "1280")]
    pub width: u32,
    #[arg(long, default_value = "720")]
    pub height: u32,

    /// Write the last presented frame to a PNG file
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// List saved profiles
    List,

    /// Save the current stream settings under a name
    Save { name: String },

    /// Make a saved profile the current stream settings
    Apply { name: String },

    /// Delete a saved profile
    Remove { name: String },

    /// Print a profile as JSON
    Show { name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(glance_common::config::config_file_path);
    let config = glance_common::config::AppConfig::load_from(&config_path);

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    glance_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Check => commands::check::run(),
        Commands::Windows { all, json } => commands::windows::run(all, json),
        Commands::Run(args) => commands::run::run(config, args).await,
        Commands::Profile { command } => {
            let mut config = config;
            match command {
                ProfileCommand::List => commands::profile::list(&config),
                ProfileCommand::Save { name } => commands::profile::save(&mut config, &config_path, &name),
                ProfileCommand::Apply { name } => {
                    commands::profile::apply(&mut config, &config_path, &name)
                }
                ProfileCommand::Remove { name } => {
                    commands::profile::remove(&mut config, &config_path, &name)
                }
                ProfileCommand::Show { name } => commands::profile::show(&config, &name),
            }
        }
    }
}
