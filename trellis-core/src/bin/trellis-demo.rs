//! Trellis Demo
//!
//! Runs a scripted session of the effect demo page on real timers and prints
//! the page after every step.
//!
//! ## Usage
//!
//! ```bash
//! trellis-demo --offline --ticks 3
//! RUST_LOG=trellis=debug trellis-demo --config demo.json
//! ```

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::task::LocalSet;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trellis_core::fetch::{CannedUserSource, HttpUserSource, User, UserSource};
use trellis_core::{DemoConfig, DemoPage, TokioPlatform, WindowSize};

#[derive(Parser)]
#[command(name = "trellis-demo")]
#[command(about = "Scripted session of the effect demo page", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Answer the fetch from memory instead of the network
    #[arg(long)]
    offline: bool,

    /// Timer ticks to wait for before stopping the timer
    #[arg(short, long, default_value_t = 3)]
    ticks: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = DemoConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the tokio runtime")?;

    LocalSet::new().block_on(&runtime, session(cli, config))
}

async fn session(cli: Cli, config: DemoConfig) -> Result<()> {
    let platform = Rc::new(TokioPlatform::new(config.initial_viewport));
    let source: Rc<dyn UserSource> = if cli.offline {
        Rc::new(CannedUserSource::ok(User::sample()).with_delay(Duration::from_millis(200)))
    } else {
        Rc::new(
            HttpUserSource::new(config.endpoint.clone(), config.request_timeout())
                .context("failed to build the HTTP client")?,
        )
    };
    let tick = config.tick_interval();

    let page = DemoPage::mount(platform.clone(), source, config).context("failed to mount the page")?;
    show(&page, "mounted");

    page.increment()?;
    page.increment()?;
    show(&page, "counter clicked twice");

    page.start_timer()?;
    tokio::time::sleep(tick * cli.ticks + tick / 2).await;
    page.stop_timer()?;
    show(&page, "timer stopped");

    let outcome = page.fetch_user_data().await;
    info!(loaded = outcome.is_loaded(), "fetch finished");
    show(&page, "fetch finished");

    platform.resize(WindowSize::new(800, 600));
    show(&page, "window resized");

    page.unmount();
    let stats = platform.stats();
    info!(
        intervals_started = stats.intervals_started,
        intervals_cleared = stats.intervals_cleared,
        listeners = stats.active_listeners(),
        "page unmounted"
    );

    println!("--- console ---");
    for line in platform.transcript().messages() {
        println!("{line}");
    }
    Ok(())
}

fn show(page: &DemoPage, step: &str) {
    if let Some(model) = page.model() {
        println!("--- {step} ---\n{model}");
    }
}
