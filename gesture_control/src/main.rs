//! gesture_control: command-line entry point.
//!
//! ```text
//! gesture_control [--config <path>] [--energy <mode>] [--demo] [--dry-run]
//! gesture_control --print-default-config
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};

use gesture_actions::config;
use gesture_actions::{ActionExecutor, CommandExecutor, DryRunExecutor};
use gesture_control::{spawn_landmark_source, GestureService, GestureStatistics, ScriptedSource, ServiceConfig};
use gesture_window::EnergyMode;

const DEFAULT_CONFIG: &str = "gesture_control.json";

struct Args {
    config:       PathBuf,
    energy:       Option<EnergyMode>,
    demo:         bool,
    dry_run:      bool,
    print_config: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config:       PathBuf::from(DEFAULT_CONFIG),
        energy:       None,
        demo:         false,
        dry_run:      false,
        print_config: false,
    };

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                args.config = it.next().map(PathBuf::from).context("--config needs a path")?;
            }
            "--energy" => {
                let tag = it.next().context("--energy needs a mode")?;
                args.energy = Some(tag.parse()?);
            }
            "--demo"                 => args.demo = true,
            "--dry-run"              => args.dry_run = true,
            "--print-default-config" => args.print_config = true,
            other                    => bail!("unknown argument `{other}`"),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config::default_document())?);
        return Ok(());
    }

    let loaded = config::load_or_create(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    for (index, err) in &loaded.rejected {
        warn!("{}: record {index} skipped: {err}", args.config.display());
    }

    let mut settings = ServiceConfig::default().with_loaded(&loaded);
    if let Some(mode) = args.energy {
        settings = settings.with_energy_mode(mode);
    }

    let executor: Box<dyn ActionExecutor> = if args.dry_run {
        Box::new(DryRunExecutor)
    } else {
        Box::new(CommandExecutor::new())
    };

    let service = GestureService::spawn(settings, loaded.registry(), executor);
    info!("{} mapping(s) loaded", service.mappings().len());

    #[cfg(feature = "leap")]
    let frames = if args.demo {
        scripted_demo()
    } else {
        info!("source: LeapMotion");
        spawn_landmark_source(gesture_control::LeapSource)
    };
    #[cfg(not(feature = "leap"))]
    let frames = {
        if !args.demo {
            info!("built without the `leap` feature");
        }
        scripted_demo()
    };

    for frame in frames {
        service.submit_frame(frame)?;
        // Failures were already logged by the action worker.
        for report in service.drain_reports() {
            debug!("{:?}: {} executed, {} failed", report.gesture, report.executed, report.failures.len());
        }
    }

    service.flush()?;
    print_summary(&service.shutdown());
    Ok(())
}

fn scripted_demo() -> std::sync::mpsc::Receiver<hand_pose::LandmarkFrame> {
    info!("source: scripted demo");
    spawn_landmark_source(ScriptedSource::demo())
}

fn print_summary(stats: &GestureStatistics) {
    println!();
    println!("  Gestures detected : {}", stats.total);
    println!("  Average confidence: {:.2}", stats.average_confidence());
    println!("  Detection rate    : {:.2}/s", stats.detection_rate());
    for (kind, count) in &stats.per_type {
        println!("    {:<28} {}", kind.display_name(), count);
    }
    println!();
}
