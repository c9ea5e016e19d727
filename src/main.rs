// picframe: fullscreen photo-frame slideshow.
// Shuffled library, thumbnails cached on disk, decoded surfaces prefetched
// in the background, back/forward history, touch zones.
// Usage: picframe [--dir <path>] [--seconds <n>] [run|scan|warm|status|clean|check]

const VERSION: &str = env!("CARGO_PKG_VERSION");
const GIT_HASH: &str = env!("GIT_HASH");

mod cli;
mod display;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use picframe::config::{self, Config, Overrides};
use picframe::ScreenSize;

#[derive(Parser, Debug)]
#[command(name = "picframe", version, about = "Photo frame slideshow")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: platform config dir)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Image directory, scanned recursively
    #[arg(short, long, global = true, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Seconds per image
    #[arg(short, long, global = true)]
    seconds: Option<f64>,

    /// Screen size, e.g. 800x480
    #[arg(long, global = true, value_name = "WxH")]
    size: Option<ScreenSize>,

    /// Run in a window instead of fullscreen
    #[arg(long, global = true)]
    windowed: bool,

    /// More logging (-v debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the slideshow (default)
    Run,
    /// Scan the image directory and report what was found
    Scan {
        /// Print every image path
        #[arg(long)]
        list: bool,
    },
    /// Pre-generate thumbnails for every image
    Warm,
    /// Show config, library and thumbnail cache statistics
    Status,
    /// Delete all cached thumbnails
    Clean,
    /// Load a single image through the thumbnail path
    Check { path: PathBuf },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_millis()
        .init();
}

/// Configured screen size, or the desktop's when none is set.
fn target_size(cfg: &Config) -> Result<ScreenSize> {
    match cfg.screen {
        Some(s) => Ok(s),
        None => display::desktop_size(),
    }
}

fn run(args: Cli) -> Result<()> {
    let config_path = args.config.unwrap_or_else(config::default_config_path);
    let cfg = Config::load(&config_path)?.apply(&Overrides {
        image_dir: args.dir,
        display_seconds: args.seconds,
        screen: args.size,
        windowed: args.windowed,
    })?;

    match args.command.unwrap_or(Commands::Run) {
        Commands::Run => display::run(&cfg),
        Commands::Scan { list } => cli::scan(&cfg, list),
        Commands::Warm => cli::warm(&cfg, target_size(&cfg)?),
        Commands::Status => cli::status(&cfg, &config_path),
        Commands::Clean => cli::clean(&cfg),
        Commands::Check { path } => cli::check(&cfg, target_size(&cfg)?, &path),
    }
}

fn main() {
    let args = Cli::parse();
    init_logging(args.verbose);
    log::info!("picframe {} ({})", VERSION, GIT_HASH);

    if let Err(e) = run(args) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
