mod core;
mod ewmh;
mod window;

use std::path::PathBuf;

use clap::Parser;
use tagwm_config::Settings;
use tagwm_utils::SystemProcessTree;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::core::context::Context;
use crate::core::x11::X11Backend;
use crate::window::manager::WindowManager;

#[derive(Parser, Debug)]
#[command(author, about, long_about = None, disable_version_flag = true)]
struct Args {
    /// Print the version and exit
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Configuration file (default: $XDG_CONFIG_HOME/tagwm/config.toml)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.version {
        println!("tagwm-{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Starting tagwm...");

    let ctx = match Context::new() {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };
    info!("Screen: {}, Root Window: {}", ctx.screen_num, ctx.root_window);

    let path = args.config.unwrap_or_else(Settings::default_path);
    let settings = match Settings::load(&path) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load {}: {}", path.display(), e);
            return Err(e.into());
        }
    };

    let check_window = crate::ewmh::setup::setup_hints(&ctx)?;
    let backend = X11Backend::new(ctx, check_window, &settings)?;

    let mut wm = WindowManager::new(backend, settings, Box::new(SystemProcessTree::new()));
    wm.setup();
    wm.scan();

    // The event loop blocks; spawned children are reaped on the other workers
    let result = tokio::task::block_in_place(|| wm.run());
    if let Err(e) = result {
        error!("Fatal X11 error: {}", e);
        return Err(e.into());
    }

    wm.cleanup();
    info!("tagwm exited cleanly");
    Ok(())
}
