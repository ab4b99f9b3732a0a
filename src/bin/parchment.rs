use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "parchment", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a single frame and write it as a PNG.
    Frame(FrameArgs),
    /// Run the paced frame loop.
    Run(RunArgs),
    /// Print the default configuration as JSON.
    Config,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Background config JSON. Layer sources resolve relative to its directory.
    /// Without it the built-in defaults are used, relative to the working directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frame index (0-based); drives the parallax drift.
    #[arg(long, default_value_t = 0)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Background config JSON. Layer sources resolve relative to its directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write every drawn frame as `frame_NNNNNN.png` into this directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Stop after this many draws.
    #[arg(long)]
    max_draws: Option<u64>,

    /// Stop after this much wall-clock time.
    #[arg(long)]
    duration_ms: Option<u64>,

    /// Override the timer interval from the config.
    #[arg(long)]
    interval_ms: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Run(args) => cmd_run(args),
        Command::Config => cmd_config(),
    }
}

/// `PARCHMENT_LOG` wins over `RUST_LOG`; default is `info`. Logs go to stderr.
fn init_logging() {
    let filter = EnvFilter::try_from_env("PARCHMENT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn load_background(config: Option<&Path>) -> anyhow::Result<parchment::Background> {
    let (cfg, root) = match config {
        Some(path) => {
            let cfg = parchment::BackgroundConfig::from_json_path(path)
                .with_context(|| format!("load config '{}'", path.display()))?;
            let root = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf();
            (cfg, root)
        }
        None => (parchment::BackgroundConfig::default(), PathBuf::from(".")),
    };
    Ok(parchment::Background::load(cfg, &root)?)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut bg = load_background(args.config.as_deref())?;
    let frame = bg.render_frame(parchment::FrameIndex(args.frame));
    frame.save_png(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let mut bg = load_background(args.config.as_deref())?;
    let interval_ms = args
        .interval_ms
        .unwrap_or(bg.config().scheduler.fallback_interval_ms);

    let mut scheduler = parchment::FrameScheduler::new(&bg.config().scheduler)?;
    let mut host = parchment::TimerHost::new(interval_ms)?;
    let cancel = scheduler.cancel_token();
    if args.max_draws == Some(0) {
        cancel.cancel();
    }

    if let Some(ms) = args.duration_ms {
        let token = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(ms));
            token.cancel();
        });
    }

    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output dir '{}'", dir.display()))?;
    }

    tracing::info!(interval_ms, "starting frame loop");
    let stats = bg.run(&mut scheduler, &mut host, |tick, surface| {
        if let Some(dir) = &args.out_dir {
            let path = dir.join(format!("frame_{:06}.png", tick.draw.0));
            surface.readback().save_png(&path)?;
        }
        if args.max_draws.is_some_and(|max| tick.draw.0 + 1 >= max) {
            cancel.cancel();
        }
        Ok(())
    })?;

    tracing::info!(ticks = stats.ticks, draws = stats.draws, "frame loop stopped");
    eprintln!("drew {} frames over {} ticks", stats.draws, stats.ticks);
    Ok(())
}

fn cmd_config() -> anyhow::Result<()> {
    let json = parchment::BackgroundConfig::default().to_json_pretty()?;
    println!("{json}");
    Ok(())
}
